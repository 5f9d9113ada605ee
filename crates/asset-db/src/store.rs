//! # Inventory Store
//!
//! The one entry point for device reads and writes.
//!
//! ## Operation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  search / get_by_id / export_all          save / replace_all / merge    │
//! │       │                                        │                        │
//! │       ▼                                        ▼                        │
//! │  ensure_ready()                            validate (no I/O yet)        │
//! │       │  unavailable → empty result            │                        │
//! │       ▼                                        ▼                        │
//! │  backend read                              ensure_ready() (errors out)  │
//! │                                                │                        │
//! │                                                ▼                        │
//! │                                   ┌── writer lock ───────────────────┐  │
//! │                                   │ stamp → write txn → refresh cache│  │
//! │                                   └──────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Consistency
//! Writes are serialized by the writer lock and each one is a single
//! transaction, so every committed write is a complete step from one
//! consistent inventory to the next. Reads go straight to the database and
//! see the last committed state (WAL). The cache is republished by the
//! writer that just committed, before the next writer can start, so cache
//! snapshots advance in commit order.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use asset_core::validation::{normalize_search_query, validate_batch, validate_input};
use asset_core::{ConflictKey, DeviceInput, DeviceRecord, MonotonicClock, MAX_SERIAL_LEN};

use crate::backend::{BackendStatus, InventoryBackend, WriteBatch};
use crate::cache::{ReadCache, Snapshot};
use crate::connection::{ConnectionManager, ConnectionState};
use crate::error::{DbError, DbResult};

/// Device inventory over a lazily opened backend.
#[derive(Debug)]
pub struct InventoryStore {
    connection: ConnectionManager,
    cache: ReadCache,
    clock: MonotonicClock,
    writer: Mutex<()>,
    primed: AtomicBool,
}

impl InventoryStore {
    /// Creates a store. Nothing is opened until the first operation.
    pub fn new(connection: ConnectionManager) -> Self {
        InventoryStore {
            connection,
            cache: ReadCache::new(),
            clock: MonotonicClock::new(),
            writer: Mutex::new(()),
            primed: AtomicBool::new(false),
        }
    }

    /// The connection manager (state, attempts, diagnostics).
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Opens storage now instead of on first use.
    pub async fn ready(&self) -> DbResult<()> {
        self.backend().await.map(|_| ())
    }

    /// Closes storage and empties the cache. The next operation reopens.
    pub async fn close(&self) {
        let _writer = self.writer.lock().await;
        self.connection.close().await;
        self.primed.store(false, Ordering::SeqCst);
        self.cache.clear();
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Backend diagnostics. Opens storage if needed.
    pub async fn status(&self) -> DbResult<BackendStatus> {
        self.backend().await?.status().await
    }

    // =========================================================================
    // Read Cache
    // =========================================================================

    /// The last published full listing.
    pub fn devices(&self) -> Snapshot {
        self.cache.snapshot()
    }

    /// Wakes on every cache publish.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.cache.subscribe()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Searches devices by serial number.
    ///
    /// ## Behavior
    /// - `None` or blank query: every device, newest first, and the cache is
    ///   republished with that listing
    /// - otherwise: case-insensitive substring match on the serial number,
    ///   cache untouched
    /// - query longer than any storable serial number: empty result
    /// - storage unavailable: empty result, no error
    pub async fn search(&self, query: Option<&str>) -> DbResult<Vec<DeviceRecord>> {
        let query = query.and_then(normalize_search_query);

        let Some(backend) = self.backend_for_read().await? else {
            return Ok(Vec::new());
        };

        match query {
            None => {
                let _writer = self.writer.lock().await;
                let records = backend.fetch_all().await?;
                self.cache.publish(records.clone());
                Ok(records)
            }
            Some(query) if query.chars().count() > MAX_SERIAL_LEN => {
                debug!(len = query.len(), "Search query longer than any serial number");
                Ok(Vec::new())
            }
            Some(query) => {
                let needle = query.to_ascii_lowercase();
                let records = backend.search_serial(&needle).await?;
                debug!(query = %query, results = records.len(), "Device search");
                Ok(records)
            }
        }
    }

    /// Looks a device up by id.
    ///
    /// Blank ids and unavailable storage both give `None`.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<DeviceRecord>> {
        let id = id.trim();
        if id.is_empty() {
            return Ok(None);
        }

        match self.backend_for_read().await? {
            Some(backend) => backend.get_by_id(id).await,
            None => Ok(None),
        }
    }

    /// Every device, newest first, for export.
    ///
    /// Unavailable storage gives an empty list.
    pub async fn export_all(&self) -> DbResult<Vec<DeviceRecord>> {
        match self.backend_for_read().await? {
            Some(backend) => backend.fetch_all().await,
            None => Ok(Vec::new()),
        }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts or updates one device, keyed by id.
    ///
    /// A missing id is generated; `updated_at` is always set to now.
    ///
    /// ## Errors
    /// - `Validation` before any storage access
    /// - `ConnectionUnavailable` if storage cannot be opened
    /// - `ConstraintViolation` if the serial number belongs to another device
    pub async fn save(&self, input: DeviceInput) -> DbResult<DeviceRecord> {
        validate_input(&input)?;
        let backend = self.backend().await?;

        let _writer = self.writer.lock().await;
        let id = input.ensure_id();
        let record = input.into_record(id, self.clock.now());

        backend
            .write(WriteBatch::upsert(ConflictKey::Id, vec![record.clone()]))
            .await?;
        self.refresh_after_write(backend.as_ref()).await;

        info!(id = %record.id, serial = %record.serial_number, "Device saved");
        Ok(record)
    }

    /// Replaces the whole inventory with `inputs`, atomically.
    ///
    /// An empty list empties the inventory. Inputs without `updated_at` are
    /// stamped with one shared time for the batch.
    ///
    /// ## Errors
    /// - `Validation` before any storage access
    /// - `TransactionAborted` if any row fails; nothing is changed
    pub async fn replace_all(&self, inputs: Vec<DeviceInput>) -> DbResult<usize> {
        validate_batch(&inputs)?;
        let backend = self.backend().await?;

        let _writer = self.writer.lock().await;
        let records = self.stamp_batch(inputs);
        let count = records.len();

        backend
            .write(WriteBatch::replace(records))
            .await
            .map_err(|err| DbError::aborted("replace_all", err))?;
        self.refresh_after_write(backend.as_ref()).await;

        info!(count, "Inventory replaced");
        Ok(count)
    }

    /// Upserts `inputs` keyed by serial number, atomically.
    ///
    /// Existing rows with a matching serial number are overwritten, id
    /// included; other rows are left alone. Inputs repeating a serial number
    /// are applied in order, so the last one wins.
    ///
    /// ## Errors
    /// - `Validation` before any storage access
    /// - `TransactionAborted` if any row fails; nothing is changed
    pub async fn merge_by_serial(&self, inputs: Vec<DeviceInput>) -> DbResult<usize> {
        validate_batch(&inputs)?;
        let backend = self.backend().await?;

        let _writer = self.writer.lock().await;
        let records = self.stamp_batch(inputs);
        let count = records.len();

        if count > 0 {
            backend
                .write(WriteBatch::upsert(ConflictKey::SerialNumber, records))
                .await
                .map_err(|err| DbError::aborted("merge_by_serial", err))?;
            self.refresh_after_write(backend.as_ref()).await;
        }

        info!(count, "Devices merged by serial number");
        Ok(count)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Opens storage if needed; the first successful open primes the cache.
    async fn backend(&self) -> DbResult<Arc<dyn InventoryBackend>> {
        let backend = self.connection.ensure_ready().await?;

        if !self.primed.load(Ordering::SeqCst) {
            let _writer = self.writer.lock().await;
            if !self.primed.load(Ordering::SeqCst) {
                self.refresh_after_write(backend.as_ref()).await;
                self.primed.store(true, Ordering::SeqCst);
            }
        }

        Ok(backend)
    }

    /// Like `backend()`, but unavailable storage is `None` instead of an error.
    async fn backend_for_read(&self) -> DbResult<Option<Arc<dyn InventoryBackend>>> {
        match self.backend().await {
            Ok(backend) => Ok(Some(backend)),
            Err(err) if err.is_connection_unavailable() => {
                debug!(error = %err, "Storage unavailable, returning empty result");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    fn stamp_batch(&self, inputs: Vec<DeviceInput>) -> Vec<DeviceRecord> {
        let now: DateTime<Utc> = self.clock.now();
        inputs
            .into_iter()
            .map(|input| {
                let id = input.ensure_id();
                let updated_at = input.updated_at.unwrap_or(now);
                input.into_record(id, updated_at)
            })
            .collect()
    }

    /// Republishes the cache. Caller holds the writer lock.
    ///
    /// A failed refresh keeps the previous snapshot, which is still a
    /// complete committed listing.
    async fn refresh_after_write(&self, backend: &dyn InventoryBackend) {
        match backend.fetch_all().await {
            Ok(records) => {
                debug!(devices = records.len(), "Read cache refreshed");
                self.cache.publish(records);
            }
            Err(err) => warn!(error = %err, "Read cache refresh failed, keeping previous snapshot"),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryBackend, MemoryConnector};
    use crate::notify::RecordingNotifier;
    use crate::pool::DbConfig;
    use asset_core::{DeviceStatus, ValidationError};
    use chrono::TimeZone;

    struct Harness {
        connector: Arc<MemoryConnector>,
        notifier: Arc<RecordingNotifier>,
        store: Arc<InventoryStore>,
    }

    fn harness(seed: bool) -> Harness {
        let connector = Arc::new(MemoryConnector::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let connection = ConnectionManager::new(connector.clone())
            .with_notifier(notifier.clone())
            .seed_on_empty(seed);
        Harness {
            connector,
            notifier,
            store: Arc::new(InventoryStore::new(connection)),
        }
    }

    fn memory(h: &Harness) -> Arc<MemoryBackend> {
        h.connector.backend()
    }

    fn device(serial: &str, name: &str) -> DeviceInput {
        DeviceInput::new(serial, name)
            .with_model("TS-200")
            .with_status(DeviceStatus::Active)
            .with_location("Warehouse A")
    }

    #[tokio::test]
    async fn test_first_read_seeds_and_primes_cache() {
        let h = harness(true);
        assert!(h.store.devices().is_empty());

        let all = h.store.search(None).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(h.store.devices().len(), 3);
        assert_eq!(h.store.state(), ConnectionState::Ready);
    }

    #[tokio::test]
    async fn test_save_then_get_returns_record() {
        let h = harness(false);
        let input = device("SN-100", "Thermal Scanner").with_notes("Spare unit");

        let saved = h.store.save(input.clone()).await.unwrap();
        assert_eq!(saved.id.len(), 36);

        let fetched = h.store.get_by_id(&saved.id).await.unwrap().unwrap();
        assert_eq!(fetched, saved);
        assert_eq!(fetched.serial_number, input.serial_number);
        assert_eq!(fetched.notes.as_deref(), Some("Spare unit"));
    }

    #[tokio::test]
    async fn test_save_ignores_supplied_timestamp() {
        let h = harness(false);
        let old = Utc.with_ymd_and_hms(2001, 1, 1, 0, 0, 0).unwrap();

        let saved = h
            .store
            .save(device("SN-1", "A").with_updated_at(old))
            .await
            .unwrap();
        assert!(saved.updated_at > old);
    }

    #[tokio::test]
    async fn test_save_existing_id_updates_in_place() {
        let h = harness(false);
        let first = h.store.save(device("SN-1", "Scanner").with_id("dev-1")).await.unwrap();

        let edited = DeviceInput::from(first.clone()).with_status(DeviceStatus::Retired);
        let second = h.store.save(edited).await.unwrap();

        assert_eq!(second.id, "dev-1");
        assert_eq!(second.status, DeviceStatus::Retired);
        assert!(second.updated_at > first.updated_at);
        assert_eq!(h.store.search(None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_duplicate_serial_is_constraint_violation() {
        let h = harness(false);
        h.store.save(device("SN-1", "A")).await.unwrap();

        let err = h.store.save(device("SN-1", "B")).await.unwrap_err();
        assert!(matches!(err, DbError::ConstraintViolation { .. }));
        assert_eq!(h.store.devices().len(), 1);
    }

    #[tokio::test]
    async fn test_save_validation_runs_before_storage() {
        let h = harness(false);
        let err = h.store.save(DeviceInput::new("  ", "Nameless")).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(ValidationError::Required { .. })));
        assert_eq!(h.connector.attempts(), 0);
    }

    #[tokio::test]
    async fn test_saves_are_newest_first() {
        let h = harness(false);
        for n in 0..5 {
            h.store.save(device(&format!("SN-{n}"), "Unit")).await.unwrap();
        }

        let serials: Vec<_> = h
            .store
            .search(None)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.serial_number)
            .collect();
        assert_eq!(serials, ["SN-4", "SN-3", "SN-2", "SN-1", "SN-0"]);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_substring() {
        let h = harness(true);

        let found = h.store.search(Some("ax-2024")).await.unwrap();
        assert_eq!(found.len(), 3);

        let found = h.store.search(Some("  sn-ax-202402 ")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "dev-1002");

        assert!(h.store.search(Some("nothing")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_blank_query_lists_everything() {
        let h = harness(true);
        assert_eq!(h.store.search(Some("   ")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_filtered_search_leaves_cache_alone() {
        let h = harness(true);
        h.store.search(None).await.unwrap();

        h.store.search(Some("202401")).await.unwrap();
        assert_eq!(h.store.devices().len(), 3);
    }

    #[tokio::test]
    async fn test_reads_degrade_when_unavailable() {
        let h = harness(true);
        h.connector.fail_next_connects(3);

        assert!(h.store.search(None).await.unwrap().is_empty());
        assert!(h.store.search(Some("SN")).await.unwrap().is_empty());
        assert!(h.store.get_by_id("dev-1001").await.unwrap().is_none());
        assert_eq!(h.notifier.count(), 3);

        // Connector works again: the next read opens and sees the seed set
        assert_eq!(h.store.export_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_writes_fail_when_unavailable() {
        let h = harness(false);
        h.connector.fail_next_connects(1);

        let err = h.store.save(device("SN-1", "A")).await.unwrap_err();
        assert!(err.is_connection_unavailable());
        assert_eq!(h.notifier.count(), 1);
    }

    #[tokio::test]
    async fn test_non_connection_read_errors_propagate() {
        let h = harness(false);
        h.store.ready().await.unwrap();
        memory(&h).fail_reads(true);

        assert!(matches!(
            h.store.search(Some("SN")).await,
            Err(DbError::QueryFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_replace_all_discards_previous_rows() {
        let h = harness(true);
        h.store.search(None).await.unwrap();

        let count = h
            .store
            .replace_all(vec![device("SN-X", "X"), device("SN-Y", "Y")])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let all = h.store.export_all().await.unwrap();
        let mut serials: Vec<_> = all.iter().map(|r| r.serial_number.as_str()).collect();
        serials.sort();
        assert_eq!(serials, ["SN-X", "SN-Y"]);
        assert_eq!(h.store.devices().len(), 2);
    }

    #[tokio::test]
    async fn test_replace_all_with_nothing_empties_store() {
        let h = harness(true);
        assert_eq!(h.store.replace_all(Vec::new()).await.unwrap(), 0);
        assert!(h.store.search(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replace_all_honors_supplied_timestamps() {
        let h = harness(false);
        let old = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        h.store
            .replace_all(vec![
                device("SN-OLD", "Old").with_updated_at(old),
                device("SN-NEW", "New"),
            ])
            .await
            .unwrap();

        let all = h.store.search(None).await.unwrap();
        assert_eq!(all[0].serial_number, "SN-NEW");
        assert_eq!(all[1].updated_at, old);
    }

    #[tokio::test]
    async fn test_failed_replace_rolls_back_store_and_cache() {
        let h = harness(true);
        let before = h.store.search(None).await.unwrap();

        memory(&h).fail_on_row(3);
        let err = h
            .store
            .replace_all(vec![
                device("SN-1", "A"),
                device("SN-2", "B"),
                device("SN-3", "C"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::TransactionAborted { .. }));
        assert_eq!(h.store.search(None).await.unwrap(), before);
        assert_eq!(*h.store.devices(), before);
    }

    async fn assert_repeated_keys_last_wins(store: &InventoryStore) {
        let written = store
            .replace_all(vec![
                device("SN-A", "First").with_id("x"),
                device("SN-B", "Second").with_id("x"),
            ])
            .await
            .unwrap();
        assert_eq!(written, 2);

        let all = store.export_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, "x");
        assert_eq!(all[0].serial_number, "SN-B");
        assert_eq!(all[0].name, "Second");

        store
            .merge_by_serial(vec![device("SN-DUP", "First"), device("SN-DUP", "Second")])
            .await
            .unwrap();

        let dup = store.search(Some("sn-dup")).await.unwrap();
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[0].name, "Second");
        assert_eq!(store.export_all().await.unwrap().len(), 2);
        assert_eq!(*store.devices(), store.export_all().await.unwrap());
    }

    #[tokio::test]
    async fn test_repeated_keys_in_batch_last_wins() {
        let h = harness(true);
        assert_repeated_keys_last_wins(&h.store).await;
    }

    #[tokio::test]
    async fn test_sqlite_repeated_keys_in_batch_last_wins() {
        let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::in_memory()));
        assert_repeated_keys_last_wins(&store).await;
    }

    #[tokio::test]
    async fn test_search_with_long_query_is_empty_not_error() {
        let h = harness(true);
        assert!(h.store.search(Some(&"Q".repeat(101))).await.unwrap().is_empty());
        assert!(h
            .store
            .search(Some(&"Q".repeat(MAX_SERIAL_LEN + 1)))
            .await
            .unwrap()
            .is_empty());

        let qr = format!("https://assets.example.com/d?s={}", "7".repeat(200));
        h.store.save(device(&qr, "QR Labelled")).await.unwrap();
        let found = h.store.search(Some(&qr)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].serial_number, qr);
    }

    #[tokio::test]
    async fn test_merge_updates_matching_serial_and_keeps_others() {
        let h = harness(true);
        h.store.search(None).await.unwrap();

        let count = h
            .store
            .merge_by_serial(vec![
                device("SN-AX-202401", "Thermal Scanner v2").with_id("dev-1001"),
                device("SN-NEW-1", "Dock Printer"),
            ])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let all = h.store.export_all().await.unwrap();
        assert_eq!(all.len(), 4);

        let updated = h.store.get_by_id("dev-1001").await.unwrap().unwrap();
        assert_eq!(updated.name, "Thermal Scanner v2");
        assert!(h.store.get_by_id("dev-1002").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_merge_can_supersede_id() {
        let h = harness(true);

        h.store
            .merge_by_serial(vec![device("SN-AX-202402", "Handheld").with_id("dev-9999")])
            .await
            .unwrap();

        assert!(h.store.get_by_id("dev-1002").await.unwrap().is_none());
        let row = h.store.get_by_id("dev-9999").await.unwrap().unwrap();
        assert_eq!(row.serial_number, "SN-AX-202402");
        assert_eq!(h.store.export_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_merge_id_collision_aborts_whole_batch() {
        let h = harness(true);
        let before = h.store.search(None).await.unwrap();

        // dev-1001 already belongs to SN-AX-202401
        let err = h
            .store
            .merge_by_serial(vec![
                device("SN-FRESH", "Fresh"),
                device("SN-OTHER", "Other").with_id("dev-1001"),
            ])
            .await
            .unwrap_err();

        assert!(matches!(
            err.root_cause(),
            DbError::ConstraintViolation { .. }
        ));
        assert!(matches!(err, DbError::TransactionAborted { .. }));
        assert_eq!(h.store.export_all().await.unwrap(), before);
        assert_eq!(*h.store.devices(), before);
    }

    #[tokio::test]
    async fn test_export_matches_full_search() {
        let h = harness(true);
        h.store.save(device("SN-5", "Five")).await.unwrap();

        assert_eq!(
            h.store.export_all().await.unwrap(),
            h.store.search(None).await.unwrap()
        );
    }

    #[tokio::test]
    async fn test_concurrent_first_operations_open_once() {
        let h = harness(true);
        h.connector
            .set_open_delay(std::time::Duration::from_millis(30));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&h.store);
                tokio::spawn(async move {
                    if n % 2 == 0 {
                        store.search(None).await.map(|r| r.len())
                    } else {
                        store.get_by_id("dev-1001").await.map(|r| usize::from(r.is_some()))
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        assert_eq!(h.connector.attempts(), 1);
        assert_eq!(h.store.devices().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrent_saves_all_land() {
        let h = harness(false);
        let handles: Vec<_> = (0..10)
            .map(|n| {
                let store = Arc::clone(&h.store);
                tokio::spawn(async move { store.save(device(&format!("SN-{n}"), "Unit")).await })
            })
            .collect();

        let mut stamps = Vec::new();
        for handle in handles {
            stamps.push(handle.await.unwrap().unwrap().updated_at);
        }
        stamps.sort();
        stamps.dedup();
        assert_eq!(stamps.len(), 10);
        assert_eq!(h.store.devices().len(), 10);
    }

    #[tokio::test]
    async fn test_close_then_reopen_keeps_data() {
        let h = harness(false);
        h.store.save(device("SN-1", "A")).await.unwrap();

        h.store.close().await;
        assert!(h.store.devices().is_empty());
        assert_eq!(h.store.state(), ConnectionState::Uninitialized);

        assert_eq!(h.store.search(None).await.unwrap().len(), 1);
        assert_eq!(h.connector.attempts(), 2);
    }

    #[tokio::test]
    async fn test_sqlite_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("asset_scan.db");

        {
            let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::new(&path)));
            store.save(device("SN-FILE", "Persisted")).await.unwrap();
            store.close().await;
        }

        let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::new(&path)));
        let found = store.search(Some("sn-file")).await.unwrap();
        assert_eq!(found.len(), 1);
        // Seed set was written on first open, so four rows in total
        assert_eq!(store.export_all().await.unwrap().len(), 4);
        store.close().await;
    }

    #[tokio::test]
    async fn test_sqlite_merge_rollback() {
        let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::in_memory()));
        let before = store.search(None).await.unwrap();

        let err = store
            .merge_by_serial(vec![
                device("SN-FRESH", "Fresh"),
                device("SN-OTHER", "Other").with_id("dev-1001"),
            ])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::TransactionAborted { .. }));
        assert_eq!(store.export_all().await.unwrap(), before);
    }
}
