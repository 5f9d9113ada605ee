//! # API Error Type
//!
//! Unified error type for CLI commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Asset Scan                             │
//! │                                                                         │
//! │  asset-scan save --serial SN-1 ...                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<(), ApiError>                                            │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Storage Error? ─── DbError::ConstraintViolation ──┐            │  │
//! │  │         │                                          │            │  │
//! │  │         ▼                                          ▼            │  │
//! │  │  Input Error? ─── ValidationError / SheetError ── ApiError ────►│  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Success ──► JSON on stdout, exit 0                             │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Failure ──► {"code":"CONFLICT","message":"..."} on stdout, exit 1     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use asset_core::CoreError;
use asset_db::DbError;

use crate::config::ConfigError;
use crate::sheet::SheetError;

/// Error printed when a command fails.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Device not found: dev-1001"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for scripts
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

/// Error codes for command failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Device does not exist
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Serial number or id already taken
    Conflict,

    /// Database could not be opened
    DatabaseUnavailable,

    /// Database operation failed
    DatabaseError,

    /// Config file or environment is invalid
    ConfigError,

    /// Spreadsheet could not be read or written
    ImportError,

    /// File system failure
    IoError,

    /// Internal error
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionUnavailable(reason) => ApiError::new(
                ErrorCode::DatabaseUnavailable,
                format!("Device database unavailable: {}", reason),
            ),
            DbError::ConstraintViolation { field, message } => {
                let field = field.rsplit('.').next().unwrap_or(&field).to_string();
                ApiError::new(ErrorCode::Conflict, format!("{}: {}", field, message))
            }
            DbError::TransactionAborted { operation, reason } => {
                let inner = ApiError::from(*reason);
                ApiError::new(
                    inner.code,
                    format!("{} rolled back, nothing was changed: {}", operation, inner.message),
                )
            }
            DbError::Validation(e) => ApiError::validation(e.to_string()),
            DbError::Decode(e) => {
                tracing::error!("Stored device row is malformed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, format!("Malformed device row: {}", e))
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::DeviceNotFound(id) => ApiError::not_found("Device", &id),
            CoreError::UnknownStatus(status) => ApiError::validation(format!(
                "Unknown device status '{}'. Valid options: active, inactive, maintenance, retired",
                status
            )),
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            CoreError::Decode(e) => ApiError::new(ErrorCode::DatabaseError, e.to_string()),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl From<SheetError> for ApiError {
    fn from(err: SheetError) -> Self {
        ApiError::new(ErrorCode::ImportError, err.to_string())
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        ApiError::new(ErrorCode::IoError, err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(format!("Cannot encode output: {}", err))
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}
