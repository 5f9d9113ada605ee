//! # asset-core: Record Model for Asset Scan
//!
//! This crate is the **vocabulary** of the device inventory. It defines what
//! a device record is, how loose input becomes one, and what counts as valid,
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Asset Scan Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Shell (asset-scan): scan, edit, import, export         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        asset-db: connection manager, read cache, store          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ asset-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │validation │  │   time    │  │   seed    │  │   │
//! │  │   │  Device*  │  │  rules    │  │  stamps   │  │  examples │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO FILESYSTEM                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - DeviceRecord, DeviceInput, DeviceStatus, RawDeviceRow
//! - [`validation`] - Field and batch validation
//! - [`time`] - Sortable timestamp text and a monotonic clock
//! - [`seed`] - First-run example devices
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use asset_core::{DeviceInput, DeviceStatus};
//! use asset_core::validation::validate_input;
//!
//! let input = DeviceInput::new("SN-AX-202401", "Thermal Scanner")
//!     .with_status(DeviceStatus::coerce("ACTIVE"));
//!
//! assert!(validate_input(&input).is_ok());
//! assert_eq!(input.status, DeviceStatus::Active);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod seed;
pub mod time;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, DecodeError, ValidationError};
pub use time::{format_timestamp, parse_timestamp, MonotonicClock};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Database name used for the on-device store.
pub const DB_NAME: &str = "asset_scan";

/// Table holding device rows.
pub const TABLE_NAME: &str = "devices";

/// Longest accepted serial number, in characters.
///
/// Large enough for any QR code payload (at most 4296 characters); only
/// guards against pasting whole files into the field.
pub const MAX_SERIAL_LEN: usize = 4296;

/// Longest accepted device name, in characters.
pub const MAX_NAME_LEN: usize = 4096;
