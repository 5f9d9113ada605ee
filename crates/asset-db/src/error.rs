//! # Database Error Types
//!
//! Error types for inventory storage operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error) / in-memory constraint check               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError (this module) ← Adds context and categorization               │
//! │       │                                                                 │
//! │       ├── read path:  ConnectionUnavailable absorbed → empty result    │
//! │       └── write path: everything propagated to the caller              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (in the app) ← Serialized for the user                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `DbError` is `Clone` because one initialization outcome is handed to every
//! caller that was waiting on it.

use asset_core::{DecodeError, ValidationError};
use thiserror::Error;

/// Inventory storage errors.
#[derive(Debug, Clone, Error)]
pub enum DbError {
    /// The database could not be opened or prepared.
    ///
    /// ## When This Occurs
    /// - Database file can't be created (missing directory, permissions)
    /// - Schema migration or seeding failed during initialization
    /// - The connection was closed underneath an operation
    ///
    /// Recoverable: the next operation starts a fresh initialization attempt.
    #[error("Device database unavailable: {0}")]
    ConnectionUnavailable(String),

    /// Unique constraint violation on `id` or `serial_number`.
    ///
    /// ## When This Occurs
    /// - Saving a device whose serial number belongs to another id
    /// - Merging a record whose id belongs to another serial number
    #[error("Duplicate {field}: {message}")]
    ConstraintViolation { field: String, message: String },

    /// A bulk write failed part-way and was rolled back.
    ///
    /// The store (and its read cache) are exactly as they were before the
    /// call. `reason` is the failure that triggered the rollback.
    #[error("{operation} was rolled back: {reason}")]
    TransactionAborted {
        operation: String,
        reason: Box<DbError>,
    },

    /// Input rejected before any storage access.
    #[error("Invalid device data: {0}")]
    Validation(#[from] ValidationError),

    /// A stored row could not be decoded.
    #[error("Malformed device row: {0}")]
    Decode(#[from] DecodeError),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Internal database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a ConstraintViolation error for a duplicate value.
    pub fn duplicate(field: impl Into<String>, value: impl AsRef<str>) -> Self {
        DbError::ConstraintViolation {
            field: field.into(),
            message: format!("'{}' already exists", value.as_ref()),
        }
    }

    /// Wraps a failure that happened inside a bulk transaction.
    ///
    /// Already-aborted errors are passed through unchanged.
    pub fn aborted(operation: impl Into<String>, reason: DbError) -> Self {
        match reason {
            DbError::TransactionAborted { .. } => reason,
            other => DbError::TransactionAborted {
                operation: operation.into(),
                reason: Box::new(other),
            },
        }
    }

    /// Re-labels any initialization failure as `ConnectionUnavailable`.
    pub fn unavailable(reason: DbError) -> Self {
        match reason {
            DbError::ConnectionUnavailable(_) => reason,
            other => DbError::ConnectionUnavailable(other.to_string()),
        }
    }

    /// True when the database could not be reached at all.
    pub fn is_connection_unavailable(&self) -> bool {
        matches!(self, DbError::ConnectionUnavailable(_))
    }

    /// The innermost cause (looks through `TransactionAborted`).
    pub fn root_cause(&self) -> &DbError {
        match self {
            DbError::TransactionAborted { reason, .. } => reason.root_cause(),
            other => other,
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database (UNIQUE)  → DbError::ConstraintViolation
/// sqlx::Error::Database (other)   → DbError::QueryFailed
/// Pool / IO / configuration       → DbError::ConnectionUnavailable
/// Column decode                   → DbError::QueryFailed
/// Other                           → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite reports primary key and unique index violations alike:
                // "UNIQUE constraint failed: devices.serial_number"
                if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::ConstraintViolation {
                        field: field.to_string(),
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionUnavailable("timed out waiting for a connection".to_string())
            }

            sqlx::Error::PoolClosed => {
                DbError::ConnectionUnavailable("connection pool is closed".to_string())
            }

            sqlx::Error::Io(e) => DbError::ConnectionUnavailable(e.to_string()),

            sqlx::Error::Configuration(e) => DbError::ConnectionUnavailable(e.to_string()),

            sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
                DbError::QueryFailed(err.to_string())
            }

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aborted_wraps_once() {
        let inner = DbError::duplicate("devices.serial_number", "SN-1");
        let once = DbError::aborted("merge_by_serial", inner);
        let twice = DbError::aborted("replace_all", once.clone());

        match &twice {
            DbError::TransactionAborted { operation, .. } => {
                assert_eq!(operation, "merge_by_serial")
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(
            twice.root_cause(),
            DbError::ConstraintViolation { .. }
        ));
    }

    #[test]
    fn test_unavailable_relabels() {
        let err = DbError::unavailable(DbError::MigrationFailed("bad sql".into()));
        assert!(err.is_connection_unavailable());
        assert_eq!(
            err.to_string(),
            "Device database unavailable: Migration failed: bad sql"
        );
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            DbError::duplicate("serialNumber", "SN-1").to_string(),
            "Duplicate serialNumber: 'SN-1' already exists"
        );
    }
}
