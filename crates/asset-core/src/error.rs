//! # Error Types
//!
//! Domain-specific error types for asset-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  asset-core errors (this file)                                         │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── DecodeError      - Stored row could not become a DeviceRecord     │
//! │                                                                         │
//! │  asset-db errors (separate crate)                                      │
//! │  └── DbError          - Storage and connection failures                │
//! │                                                                         │
//! │  asset-scan errors (in app)                                            │
//! │  └── ApiError         - What the shell prints (serialized)             │
//! │                                                                         │
//! │  Flow: ValidationError → DbError → ApiError → user                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Record model errors.
#[derive(Debug, Clone, Error)]
pub enum CoreError {
    /// Device cannot be found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Status text is not one of the four known values.
    ///
    /// Only raised by the strict `FromStr` parse. Lenient paths use
    /// [`DeviceStatus::coerce`](crate::DeviceStatus::coerce) instead.
    #[error("Unknown device status: '{0}'")]
    UnknownStatus(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Decode error (wraps DecodeError).
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Checked before anything reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Invalid format (e.g., control characters, bad timestamp).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }
}

// =============================================================================
// Decode Error
// =============================================================================

/// A stored row could not be turned into a [`DeviceRecord`](crate::DeviceRecord).
///
/// Status never fails to decode (it coerces to `inactive`); only identity
/// columns and the timestamp can be malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Column was NULL or blank but the record cannot exist without it.
    #[error("column '{0}' is missing")]
    MissingColumn(&'static str),

    /// `updated_at` text is not a timestamp we understand.
    #[error("column 'updated_at' has unparseable value '{0}'")]
    BadTimestamp(String),
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
