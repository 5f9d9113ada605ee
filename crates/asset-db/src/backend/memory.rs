//! # In-Memory Backend
//!
//! A `Vec<DeviceRecord>` behind a lock, with the same observable behavior as
//! the SQLite backend: same ordering, same unique constraints on `id` and
//! `serial_number`, same all-or-nothing batches.
//!
//! Batches are applied to a copy of the rows and swapped in only when every
//! row succeeded, which is what a rolled-back transaction looks like from
//! the outside.
//!
//! ## Failure Injection
//! ```text
//! MemoryConnector::fail_next_connects(n)   next n connect() calls fail
//! MemoryConnector::set_open_delay(d)       connect() sleeps first
//! MemoryBackend::fail_schema(true)         prepare_schema() fails
//! MemoryBackend::fail_on_row(n)            next write fails at row n (1-based)
//! MemoryBackend::fail_reads(true)          reads fail
//! ```

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use asset_core::{ConflictKey, DeviceRecord, TABLE_NAME};

use super::{sort_newest_first, BackendStatus, Connector, InventoryBackend, WriteBatch, WriteMode};
use crate::error::{DbError, DbResult};

/// `table.column`, as SQLite names it in a UNIQUE failure.
fn constraint_field(key: ConflictKey) -> String {
    format!("{}.{}", TABLE_NAME, key.column())
}

// =============================================================================
// Connector
// =============================================================================

/// Hands out one shared [`MemoryBackend`].
///
/// The rows outlive `close()`: reconnecting reopens the same backend, the
/// way reopening a database file finds the same data.
#[derive(Debug, Default)]
pub struct MemoryConnector {
    backend: Arc<MemoryBackend>,
    attempts: AtomicUsize,
    failing_connects: AtomicUsize,
    open_delay: Mutex<Option<Duration>>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        MemoryConnector::default()
    }

    /// The backend every successful connect returns.
    pub fn backend(&self) -> Arc<MemoryBackend> {
        Arc::clone(&self.backend)
    }

    /// How many times `connect()` has been called.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Makes the next `n` connects fail.
    pub fn fail_next_connects(&self, n: usize) {
        self.failing_connects.store(n, Ordering::SeqCst);
    }

    /// Makes every connect sleep first (widens the initialization window).
    pub fn set_open_delay(&self, delay: Duration) {
        *lock(&self.open_delay) = Some(delay);
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> DbResult<Arc<dyn InventoryBackend>> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let delay = *lock(&self.open_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failing = self
            .failing_connects
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        if failing.is_ok() {
            return Err(DbError::ConnectionUnavailable(
                "in-memory store refused to open".to_string(),
            ));
        }

        self.backend.reopen();
        Ok(self.backend.clone() as Arc<dyn InventoryBackend>)
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Inventory backend holding rows in process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    rows: RwLock<Vec<DeviceRecord>>,
    closed: AtomicBool,
    schema_ready: AtomicBool,
    failing_schema: AtomicBool,
    failing_reads: AtomicBool,
    failing_row: Mutex<Option<usize>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        MemoryBackend::default()
    }

    /// True after `close()` until the next successful connect.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Makes `prepare_schema()` fail while set.
    pub fn fail_schema(&self, fail: bool) {
        self.failing_schema.store(fail, Ordering::SeqCst);
    }

    /// Makes reads fail while set.
    pub fn fail_reads(&self, fail: bool) {
        self.failing_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes the next write fail when it reaches row `n` (1-based).
    pub fn fail_on_row(&self, n: usize) {
        *lock(&self.failing_row) = Some(n);
    }

    /// Copy of the stored rows, newest first, bypassing failure injection.
    pub fn rows(&self) -> Vec<DeviceRecord> {
        let mut rows = self.read_rows().clone();
        sort_newest_first(&mut rows);
        rows
    }

    fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn check_open(&self) -> DbResult<()> {
        if self.is_closed() {
            return Err(DbError::ConnectionUnavailable(
                "in-memory store is closed".to_string(),
            ));
        }
        Ok(())
    }

    fn check_readable(&self) -> DbResult<()> {
        self.check_open()?;
        if !self.schema_ready.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed("no such table: devices".to_string()));
        }
        if self.failing_reads.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed("injected read failure".to_string()));
        }
        Ok(())
    }

    fn read_rows(&self) -> RwLockReadGuard<'_, Vec<DeviceRecord>> {
        self.rows.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn select(&self, mut keep: impl FnMut(&DeviceRecord) -> bool) -> Vec<DeviceRecord> {
        let mut found: Vec<_> = self.read_rows().iter().filter(|r| keep(r)).cloned().collect();
        sort_newest_first(&mut found);
        found
    }
}

#[async_trait]
impl InventoryBackend for MemoryBackend {
    async fn prepare_schema(&self) -> DbResult<()> {
        self.check_open()?;
        if self.failing_schema.load(Ordering::SeqCst) {
            return Err(DbError::MigrationFailed(
                "injected schema failure".to_string(),
            ));
        }
        self.schema_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn count(&self) -> DbResult<u64> {
        self.check_readable()?;
        Ok(self.read_rows().len() as u64)
    }

    async fn fetch_all(&self) -> DbResult<Vec<DeviceRecord>> {
        self.check_readable()?;
        Ok(self.select(|_| true))
    }

    async fn search_serial(&self, needle: &str) -> DbResult<Vec<DeviceRecord>> {
        self.check_readable()?;
        Ok(self.select(|record| record.serial_contains(needle)))
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DeviceRecord>> {
        self.check_readable()?;
        Ok(self.read_rows().iter().find(|r| r.id == id).cloned())
    }

    async fn write(&self, batch: WriteBatch) -> DbResult<()> {
        self.check_open()?;
        if !self.schema_ready.load(Ordering::SeqCst) {
            return Err(DbError::QueryFailed("no such table: devices".to_string()));
        }

        let fail_at = lock(&self.failing_row).take();
        let mut rows = self.rows.write().unwrap_or_else(|poisoned| poisoned.into_inner());

        // Work on a copy; the original stays untouched unless everything applies
        let mut next = if batch.mode == WriteMode::Replace {
            Vec::with_capacity(batch.len())
        } else {
            rows.clone()
        };

        let key = batch.mode.conflict_key();
        for (index, record) in batch.records.into_iter().enumerate() {
            if fail_at == Some(index + 1) {
                debug!(row = index + 1, "Injected write failure");
                return Err(DbError::QueryFailed(format!(
                    "injected failure at row {}",
                    index + 1
                )));
            }
            match key {
                ConflictKey::Id => upsert_by_id(&mut next, record)?,
                ConflictKey::SerialNumber => upsert_by_serial(&mut next, record)?,
            }
        }

        *rows = next;
        Ok(())
    }

    async fn status(&self) -> DbResult<BackendStatus> {
        Ok(BackendStatus {
            kind: "memory",
            device_count: self.count().await?,
            migrations_total: 1,
            migrations_applied: usize::from(self.schema_ready.load(Ordering::SeqCst)),
        })
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// =============================================================================
// Constraint Checks
// =============================================================================

fn upsert_by_id(rows: &mut Vec<DeviceRecord>, record: DeviceRecord) -> DbResult<()> {
    if rows
        .iter()
        .any(|r| r.serial_number == record.serial_number && r.id != record.id)
    {
        return Err(DbError::duplicate(constraint_field(ConflictKey::SerialNumber), &record.serial_number));
    }

    match rows.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => rows.push(record),
    }
    Ok(())
}

fn upsert_by_serial(rows: &mut Vec<DeviceRecord>, record: DeviceRecord) -> DbResult<()> {
    let target = rows
        .iter()
        .position(|r| r.serial_number == record.serial_number);

    let id_taken = rows
        .iter()
        .enumerate()
        .any(|(index, r)| r.id == record.id && Some(index) != target);
    if id_taken {
        return Err(DbError::duplicate(constraint_field(ConflictKey::Id), &record.id));
    }

    match target {
        Some(index) => rows[index] = record,
        None => rows.push(record),
    }
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// =============================================================================
// Unit Tests
// =============================================================================
