//! # Validation Module
//!
//! Input validation for device writes and searches.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Edit form / spreadsheet codec                                │
//! │  ├── Blank serial rows dropped on import                               │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Inventory store (Rust)                                       │
//! │  └── THIS MODULE: every input validated before a transaction opens     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  └── UNIQUE id / serial_number                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::DeviceInput;
use crate::{MAX_NAME_LEN, MAX_SERIAL_LEN};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a serial number.
///
/// ## Rules
/// - Must not be blank
/// - At most [`MAX_SERIAL_LEN`] characters after trimming (QR payloads fit)
/// - No control characters (scanner noise such as `\r` or `\t`)
///
/// ## Example
/// ```rust
/// use asset_core::validation::validate_serial_number;
///
/// assert!(validate_serial_number("SN-AX-202401").is_ok());
/// assert!(validate_serial_number("  ").is_err());
/// assert!(validate_serial_number("SN\t1").is_err());
/// ```
pub fn validate_serial_number(serial: &str) -> ValidationResult<()> {
    let serial = serial.trim();

    if serial.is_empty() {
        return Err(ValidationError::required("serialNumber"));
    }

    if serial.chars().count() > MAX_SERIAL_LEN {
        return Err(ValidationError::TooLong {
            field: "serialNumber".to_string(),
            max: MAX_SERIAL_LEN,
        });
    }

    if serial.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "serialNumber".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates a device name.
///
/// ## Example
/// ```rust
/// use asset_core::validation::validate_device_name;
///
/// assert!(validate_device_name("Thermal Scanner").is_ok());
/// assert!(validate_device_name("").is_err());
/// ```
pub fn validate_device_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::required("name"));
    }

    if name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LEN,
        });
    }

    Ok(())
}

/// Normalizes a search query.
///
/// Any length is accepted. Returns the trimmed query, or `None` when it is
/// blank (caller lists everything).
///
/// ```rust
/// use asset_core::validation::normalize_search_query;
///
/// assert_eq!(normalize_search_query("  sn-1 ").as_deref(), Some("sn-1"));
/// assert_eq!(normalize_search_query("   "), None);
/// ```
pub fn normalize_search_query(query: &str) -> Option<String> {
    let query = query.trim();
    (!query.is_empty()).then(|| query.to_string())
}

// =============================================================================
// Record Validators
// =============================================================================

/// Validates a single device input.
pub fn validate_input(input: &DeviceInput) -> ValidationResult<()> {
    validate_serial_number(&input.serial_number)?;
    validate_device_name(&input.name)?;
    Ok(())
}

/// Validates every input of a bulk write, stopping at the first bad one.
///
/// Inputs that repeat a conflict key are fine: the write applies them in
/// order and the last one wins.
pub fn validate_batch(inputs: &[DeviceInput]) -> ValidationResult<()> {
    inputs.iter().try_for_each(validate_input)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_serial_number() {
        assert!(validate_serial_number("SN-AX-202401").is_ok());
        assert!(validate_serial_number(" SN 1 ").is_ok());

        assert!(validate_serial_number("").is_err());
        assert!(validate_serial_number("   ").is_err());
        assert!(validate_serial_number("SN\r").is_ok()); // trimmed away
        assert!(validate_serial_number("S\rN").is_err());
    }

    #[test]
    fn test_long_qr_payload_is_a_valid_serial() {
        let payload = format!("https://assets.example.com/device?id={}", "A".repeat(300));
        assert!(validate_serial_number(&payload).is_ok());
        assert!(validate_serial_number(&"A".repeat(MAX_SERIAL_LEN)).is_ok());
        assert!(validate_serial_number(&"A".repeat(MAX_SERIAL_LEN + 1)).is_err());
    }

    #[test]
    fn test_validate_device_name() {
        assert!(validate_device_name("Barcode Handheld").is_ok());
        assert!(validate_device_name("").is_err());
        assert!(validate_device_name(&"A".repeat(MAX_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn test_normalize_search_query_accepts_any_length() {
        assert_eq!(normalize_search_query("  sn-1 ").as_deref(), Some("sn-1"));
        assert_eq!(normalize_search_query(""), None);

        let long = "Q".repeat(5000);
        assert_eq!(normalize_search_query(&long), Some(long));
    }

    #[test]
    fn test_validate_batch_allows_repeated_keys() {
        let inputs = vec![
            DeviceInput::new("SN-1", "A").with_id("x"),
            DeviceInput::new(" SN-1", "B").with_id("x"),
        ];
        assert!(validate_batch(&inputs).is_ok());
    }

    #[test]
    fn test_validate_batch_reports_first_invalid_input() {
        let inputs = vec![DeviceInput::new("SN-1", "A"), DeviceInput::new("SN-2", " ")];
        assert_eq!(
            validate_batch(&inputs),
            Err(ValidationError::Required {
                field: "name".into()
            })
        );
    }
}
