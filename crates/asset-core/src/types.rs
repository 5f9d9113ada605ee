//! # Domain Types
//!
//! The device record and everything needed to move it in and out of storage.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DeviceInput    │   │  DeviceRecord   │   │  RawDeviceRow   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id?            │──►│  id             │◄──│  Option<String> │       │
//! │  │  serial_number  │   │  serial_number  │   │  per column     │       │
//! │  │  updated_at?    │   │  updated_at     │   │  (untyped)      │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │     write side            read side             DeviceRecord::decode   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                              │
//! │  │  DeviceStatus   │   │  ConflictKey    │                              │
//! │  │  Active         │   │  Id             │                              │
//! │  │  Inactive ◄─ default  SerialNumber    │                              │
//! │  │  Maintenance    │   └─────────────────┘                              │
//! │  │  Retired        │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every device has:
//! - `id`: opaque, generated when absent, used as the primary key
//! - `serial_number`: what is printed on the label and what the scanner reads

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, DecodeError};
use crate::time::parse_timestamp;

// =============================================================================
// Device Status
// =============================================================================

/// Lifecycle status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    /// Deployed and in use.
    Active,
    /// Not deployed. Also what unknown input becomes.
    #[default]
    Inactive,
    /// Out for repair or calibration.
    Maintenance,
    /// Permanently out of service.
    Retired,
}

impl DeviceStatus {
    /// All statuses, in display order.
    pub const ALL: [DeviceStatus; 4] = [
        DeviceStatus::Active,
        DeviceStatus::Inactive,
        DeviceStatus::Maintenance,
        DeviceStatus::Retired,
    ];

    /// Lenient conversion used for stored rows and imported cells.
    ///
    /// Case-insensitive; anything unrecognized (including blank) becomes
    /// [`DeviceStatus::Inactive`].
    ///
    /// ```rust
    /// use asset_core::DeviceStatus;
    ///
    /// assert_eq!(DeviceStatus::coerce(" Maintenance "), DeviceStatus::Maintenance);
    /// assert_eq!(DeviceStatus::coerce("broken"), DeviceStatus::Inactive);
    /// ```
    pub fn coerce(raw: &str) -> DeviceStatus {
        raw.parse().unwrap_or_default()
    }

    /// Lenient conversion for a possibly-missing value.
    pub fn coerce_opt(raw: Option<&str>) -> DeviceStatus {
        raw.map(DeviceStatus::coerce).unwrap_or_default()
    }

    /// The storage / wire form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::Maintenance => "maintenance",
            DeviceStatus::Retired => "retired",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(DeviceStatus::Active),
            "inactive" => Ok(DeviceStatus::Inactive),
            "maintenance" => Ok(DeviceStatus::Maintenance),
            "retired" => Ok(DeviceStatus::Retired),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// Conflict Key
// =============================================================================

/// Column deciding whether an incoming record updates a row or creates one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKey {
    /// Upsert on the primary identifier (save, replace).
    Id,
    /// Upsert on the business key (merge from import).
    SerialNumber,
}

impl ConflictKey {
    /// Column name in the `devices` table.
    pub const fn column(&self) -> &'static str {
        match self {
            ConflictKey::Id => "id",
            ConflictKey::SerialNumber => "serial_number",
        }
    }
}

// =============================================================================
// Device Record
// =============================================================================

/// A device as stored and as returned to callers.
///
/// Every field is populated; optional ones are `None`, never malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeviceRecord {
    /// Unique identifier (UUID v4 unless supplied).
    pub id: String,

    /// Label serial number - business identifier.
    pub serial_number: String,

    /// Display name.
    pub name: String,

    /// Model designation (may be empty).
    pub model: String,

    /// Lifecycle status.
    pub status: DeviceStatus,

    /// Where the device currently is.
    pub location: Option<String>,

    /// Free-form notes.
    pub notes: Option<String>,

    /// When the device was last written.
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl DeviceRecord {
    /// Decodes an untyped storage row into a record.
    ///
    /// This is the only place row data becomes typed:
    /// - `id`, `serial_number`, `name` must be present and non-blank
    /// - `model` defaults to empty
    /// - `status` coerces (unknown → inactive)
    /// - blank `location` / `notes` become `None`
    /// - `updated_at` must parse
    pub fn decode(row: RawDeviceRow) -> Result<DeviceRecord, DecodeError> {
        let id = required(row.id, "id")?;
        let serial_number = required(row.serial_number, "serial_number")?;
        let name = required(row.name, "name")?;

        let raw_ts = required(row.updated_at, "updated_at")?;
        let updated_at = parse_timestamp(&raw_ts).ok_or(DecodeError::BadTimestamp(raw_ts))?;

        Ok(DeviceRecord {
            id,
            serial_number,
            name,
            model: row.model.unwrap_or_default(),
            status: DeviceStatus::coerce_opt(row.status.as_deref()),
            location: non_blank(row.location),
            notes: non_blank(row.notes),
            updated_at,
        })
    }

    /// Checks whether the serial number contains `needle`, ignoring ASCII case.
    ///
    /// `needle` is expected to be ASCII-lower-cased already. Matches SQLite's
    /// `LOWER()`, which only folds ASCII letters.
    pub fn serial_contains(&self, needle: &str) -> bool {
        self.serial_number.to_ascii_lowercase().contains(needle)
    }
}

fn required(value: Option<String>, column: &'static str) -> Result<String, DecodeError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(DecodeError::MissingColumn(column)),
    }
}

/// Collapses blank optional text to `None`.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Device Input
// =============================================================================

/// A device as handed to the store for writing.
///
/// `id` and `updated_at` are optional: the store fills them in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInput {
    /// Identifier, generated when absent or blank.
    #[serde(default)]
    pub id: Option<String>,

    /// Label serial number (required).
    pub serial_number: String,

    /// Display name (required).
    pub name: String,

    /// Model designation.
    #[serde(default)]
    pub model: String,

    /// Lifecycle status.
    #[serde(default)]
    pub status: DeviceStatus,

    /// Where the device currently is.
    #[serde(default)]
    pub location: Option<String>,

    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,

    /// Explicit last-write time (honored by bulk writes only).
    #[serde(default)]
    #[ts(as = "Option<String>")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl DeviceInput {
    /// Creates an input with the two required fields set.
    pub fn new(serial_number: impl Into<String>, name: impl Into<String>) -> Self {
        DeviceInput {
            serial_number: serial_number.into(),
            name: name.into(),
            ..DeviceInput::default()
        }
    }

    /// Sets the identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Sets an explicit last-write time.
    pub fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Returns the identifier, generating a UUID v4 when absent or blank.
    pub fn ensure_id(&self) -> String {
        match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => generate_device_id(),
        }
    }

    /// Builds the record that will be written.
    ///
    /// Text fields are trimmed; blank optionals collapse to `None`.
    pub fn into_record(self, id: String, updated_at: DateTime<Utc>) -> DeviceRecord {
        DeviceRecord {
            id,
            serial_number: self.serial_number.trim().to_string(),
            name: self.name.trim().to_string(),
            model: self.model.trim().to_string(),
            status: self.status,
            location: non_blank(self.location.map(|s| s.trim().to_string())),
            notes: non_blank(self.notes.map(|s| s.trim().to_string())),
            updated_at,
        }
    }
}

impl From<DeviceRecord> for DeviceInput {
    /// Turns a stored record back into an editable input (edit-then-save flow).
    fn from(record: DeviceRecord) -> Self {
        DeviceInput {
            id: Some(record.id),
            serial_number: record.serial_number,
            name: record.name,
            model: record.model,
            status: record.status,
            location: record.location,
            notes: record.notes,
            updated_at: Some(record.updated_at),
        }
    }
}

/// Generates a new device identifier.
pub fn generate_device_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Raw Row
// =============================================================================

/// One `devices` row exactly as the database hands it back.
///
/// Every column is optional text so that a damaged or hand-edited database
/// still reaches [`DeviceRecord::decode`], which decides what is acceptable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct RawDeviceRow {
    pub id: Option<String>,
    pub serial_number: Option<String>,
    pub name: Option<String>,
    pub model: Option<String>,
    pub status: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub updated_at: Option<String>,
}

impl From<&DeviceRecord> for RawDeviceRow {
    fn from(record: &DeviceRecord) -> Self {
        RawDeviceRow {
            id: Some(record.id.clone()),
            serial_number: Some(record.serial_number.clone()),
            name: Some(record.name.clone()),
            model: Some(record.model.clone()),
            status: Some(record.status.as_str().to_string()),
            location: record.location.clone(),
            notes: record.notes.clone(),
            updated_at: Some(crate::time::format_timestamp(&record.updated_at)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
