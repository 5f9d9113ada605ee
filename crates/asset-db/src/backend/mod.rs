//! # Storage Backends
//!
//! The inventory store talks to storage through one trait with two
//! implementations.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ConnectionManager ── Connector::connect() ──► Arc<dyn InventoryBackend>│
//! │                                                                         │
//! │        ┌──────────────────────┐        ┌──────────────────────┐         │
//! │        │   SqliteBackend      │        │   MemoryBackend      │         │
//! │        │   sqlx SqlitePool    │        │   Vec<DeviceRecord>  │         │
//! │        │   (app default)      │        │   (tests, demos)     │         │
//! │        └──────────────────────┘        └──────────────────────┘         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Both implementations give the same answers for the same calls: same sort
//! order, same constraint behavior, same all-or-nothing batches. The
//! in-memory one can additionally inject failures.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use asset_core::{ConflictKey, DeviceRecord};

use crate::error::DbResult;

pub mod memory;
pub mod sqlite;

pub use memory::{MemoryBackend, MemoryConnector};
pub use sqlite::{SqliteBackend, SqliteConnector};

// =============================================================================
// Write Batches
// =============================================================================

/// How a batch lands in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Insert, or update the row that already holds the conflict key.
    Upsert(ConflictKey),
    /// Delete every row, then insert the batch.
    Replace,
}

impl WriteMode {
    /// Conflict key used for each row of the batch.
    pub fn conflict_key(&self) -> ConflictKey {
        match self {
            WriteMode::Upsert(key) => *key,
            WriteMode::Replace => ConflictKey::Id,
        }
    }
}

/// A set of fully-formed records written in one transaction.
#[derive(Debug, Clone)]
pub struct WriteBatch {
    pub mode: WriteMode,
    pub records: Vec<DeviceRecord>,
}

impl WriteBatch {
    /// Upsert on `key`.
    pub fn upsert(key: ConflictKey, records: Vec<DeviceRecord>) -> Self {
        WriteBatch {
            mode: WriteMode::Upsert(key),
            records,
        }
    }

    /// Clear the table, then insert.
    pub fn replace(records: Vec<DeviceRecord>) -> Self {
        WriteBatch {
            mode: WriteMode::Replace,
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// =============================================================================
// Status
// =============================================================================

/// Snapshot of backend health for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendStatus {
    /// "sqlite" or "memory".
    pub kind: &'static str,
    /// Rows in the `devices` table.
    pub device_count: u64,
    /// Embedded migrations.
    pub migrations_total: usize,
    /// Migrations recorded as applied.
    pub migrations_applied: usize,
}

// =============================================================================
// Traits
// =============================================================================

/// An open storage handle.
///
/// Rows come back newest first (`updated_at` descending, ties by `id`
/// ascending). Every method fails with `ConnectionUnavailable` once the
/// backend has been closed.
#[async_trait]
pub trait InventoryBackend: Send + Sync + fmt::Debug {
    /// Creates tables and indexes that don't exist yet.
    async fn prepare_schema(&self) -> DbResult<()>;

    /// Number of stored devices.
    async fn count(&self) -> DbResult<u64>;

    /// Every device, newest first.
    async fn fetch_all(&self) -> DbResult<Vec<DeviceRecord>>;

    /// Devices whose serial number contains `needle`.
    ///
    /// `needle` is non-empty and ASCII-lower-cased; it is matched literally
    /// (no wildcards) against the ASCII-lower-cased serial number.
    async fn search_serial(&self, needle: &str) -> DbResult<Vec<DeviceRecord>>;

    /// The device with this exact id.
    async fn get_by_id(&self, id: &str) -> DbResult<Option<DeviceRecord>>;

    /// Applies the whole batch in one transaction, or nothing.
    async fn write(&self, batch: WriteBatch) -> DbResult<()>;

    /// Diagnostics for the `status` command.
    async fn status(&self) -> DbResult<BackendStatus>;

    /// Releases the underlying resources. Idempotent.
    async fn close(&self);
}

/// Opens backends on demand.
///
/// The connection manager calls this once per initialization attempt.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Opens a new backend handle.
    async fn connect(&self) -> DbResult<Arc<dyn InventoryBackend>>;

    /// Human-readable target, for logs ("sqlite:/path/db", "memory").
    fn describe(&self) -> String;
}

/// Escapes `%`, `_` and `\` so a needle matches literally in `LIKE ... ESCAPE '\'`.
pub(crate) fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    for ch in needle.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Newest first, ties by id ascending.
pub(crate) fn sort_newest_first(records: &mut [DeviceRecord]) {
    records.sort_by(|a, b| {
        b.updated_at
            .cmp(&a.updated_at)
            .then_with(|| a.id.cmp(&b.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("sn-1"), "sn-1");
        assert_eq!(escape_like("50%_off"), "50\\%\\_off");
        assert_eq!(escape_like("a\\b"), "a\\\\b");
    }

    #[test]
    fn test_replace_mode_keys_on_id() {
        assert_eq!(WriteMode::Replace.conflict_key(), ConflictKey::Id);
        assert_eq!(
            WriteMode::Upsert(ConflictKey::SerialNumber).conflict_key(),
            ConflictKey::SerialNumber
        );
    }
}
