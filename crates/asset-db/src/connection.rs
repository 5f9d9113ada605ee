//! # Connection Manager
//!
//! Opens the database lazily, exactly once for any number of concurrent
//! callers, and reports failures to the user once per attempt.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Uninitialized ──ensure_ready()──► Initializing ──ok──► Ready          │
//! │         ▲                              │    │                │          │
//! │         │        driver dropped        │    └──err──► Failed │          │
//! │         └──────────────────────────────┘                 │   │          │
//! │         ▲                                                │   │          │
//! │         └───────────────────── close() ──────────────────┼───┘          │
//! │                                                          │              │
//! │                      ensure_ready() ◄────────────────────┘              │
//! │                      (fresh attempt)                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Coalescing
//! The first caller to find the manager `Uninitialized` (or `Failed`) becomes
//! the driver: it runs the attempt inline. Everyone arriving while the attempt
//! is in flight clones a `watch::Receiver` out of the state and waits for the
//! driver to publish the outcome. One attempt, one outcome, shared by all.
//!
//! ## Attempt
//! 1. `Connector::connect()`
//! 2. `prepare_schema()` (migrations)
//! 3. Seed example devices if the table is empty and seeding is enabled
//!
//! If step 2 or 3 fails the half-open backend is closed before the failure is
//! published.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{SubsecRound, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use asset_core::seed::seed_devices;
use asset_core::ConflictKey;

use crate::backend::{
    Connector, InventoryBackend, MemoryConnector, SqliteConnector, WriteBatch,
};
use crate::error::{DbError, DbResult};
use crate::notify::{InitFailureNotice, LogNotifier, Notifier};
use crate::pool::DbConfig;

type InitOutcome = DbResult<Arc<dyn InventoryBackend>>;

/// Observable lifecycle of the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Uninitialized,
    Initializing,
    Ready,
    Failed,
}

enum Slot {
    Uninitialized,
    Initializing(watch::Receiver<Option<InitOutcome>>),
    Ready(Arc<dyn InventoryBackend>),
    Failed(DbError),
}

enum Next {
    Ready(Arc<dyn InventoryBackend>),
    Wait(watch::Receiver<Option<InitOutcome>>),
    Drive(watch::Sender<Option<InitOutcome>>),
}

// =============================================================================
// Connection Manager
// =============================================================================

/// Owns the lifecycle of the single storage connection.
pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    notifier: Arc<dyn Notifier>,
    seed_on_empty: bool,
    slot: Mutex<Slot>,
    notified: AtomicBool,
    attempts: AtomicUsize,
}

impl std::fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("connector", &self.connector)
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .finish()
    }
}

impl ConnectionManager {
    /// Creates a manager. Nothing is opened until the first `ensure_ready()`.
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        ConnectionManager {
            connector,
            notifier: Arc::new(LogNotifier),
            seed_on_empty: true,
            slot: Mutex::new(Slot::Uninitialized),
            notified: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Manager over a SQLite database.
    pub fn sqlite(config: DbConfig) -> Self {
        ConnectionManager::new(Arc::new(SqliteConnector::new(config)))
    }

    /// Manager over a fresh in-memory backend.
    pub fn memory() -> Self {
        ConnectionManager::new(Arc::new(MemoryConnector::new()))
    }

    /// Sets who is told about initialization failures.
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Sets whether an empty database is seeded with example devices.
    pub fn seed_on_empty(mut self, seed: bool) -> Self {
        self.seed_on_empty = seed;
        self
    }

    /// Human-readable storage target.
    pub fn describe(&self) -> String {
        self.connector.describe()
    }

    /// Initialization attempts started so far.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        match &*self.lock_slot() {
            Slot::Uninitialized => ConnectionState::Uninitialized,
            Slot::Initializing(_) => ConnectionState::Initializing,
            Slot::Ready(_) => ConnectionState::Ready,
            Slot::Failed(_) => ConnectionState::Failed,
        }
    }

    /// Error of the last failed attempt, while in `Failed`.
    pub fn last_error(&self) -> Option<DbError> {
        match &*self.lock_slot() {
            Slot::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    /// Returns the open backend, initializing it first if needed.
    ///
    /// Concurrent callers share one attempt. After a failure the next call
    /// starts a fresh attempt.
    ///
    /// ## Errors
    /// `ConnectionUnavailable` if the attempt failed or was abandoned.
    pub async fn ensure_ready(&self) -> DbResult<Arc<dyn InventoryBackend>> {
        let next = {
            let mut slot = self.lock_slot();
            match &*slot {
                Slot::Ready(backend) => Next::Ready(Arc::clone(backend)),
                Slot::Initializing(rx) => Next::Wait(rx.clone()),
                Slot::Uninitialized | Slot::Failed(_) => {
                    let (tx, rx) = watch::channel(None);
                    *slot = Slot::Initializing(rx);
                    Next::Drive(tx)
                }
            }
        };

        match next {
            Next::Ready(backend) => Ok(backend),
            Next::Wait(rx) => Self::wait_for_outcome(rx).await,
            Next::Drive(tx) => self.drive(tx).await,
        }
    }

    /// Closes the backend if open and returns to `Uninitialized`.
    ///
    /// An attempt in flight is left to finish.
    pub async fn close(&self) {
        let backend = {
            let mut slot = self.lock_slot();
            match std::mem::replace(&mut *slot, Slot::Uninitialized) {
                Slot::Ready(backend) => Some(backend),
                Slot::Initializing(rx) => {
                    *slot = Slot::Initializing(rx);
                    None
                }
                Slot::Uninitialized | Slot::Failed(_) => None,
            }
        };

        if let Some(backend) = backend {
            info!(target_db = %self.describe(), "Closing inventory storage");
            backend.close().await;
        }
    }

    // -------------------------------------------------------------------------
    // Attempt
    // -------------------------------------------------------------------------

    async fn wait_for_outcome(mut rx: watch::Receiver<Option<InitOutcome>>) -> InitOutcome {
        debug!("Waiting on in-flight initialization");
        let outcome = rx
            .wait_for(Option::is_some)
            .await
            .map(|seen| (*seen).clone());

        match outcome {
            Ok(Some(outcome)) => outcome,
            _ => Err(DbError::ConnectionUnavailable(
                "initialization was abandoned before it finished".to_string(),
            )),
        }
    }

    async fn drive(&self, tx: watch::Sender<Option<InitOutcome>>) -> InitOutcome {
        self.notified.store(false, Ordering::SeqCst);
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        info!(attempt, target_db = %self.describe(), "Initializing inventory storage");

        let mut guard = AttemptGuard {
            manager: self,
            armed: true,
        };
        let outcome = self.attempt().await;
        guard.armed = false;

        {
            let mut slot = self.lock_slot();
            *slot = match &outcome {
                Ok(backend) => Slot::Ready(Arc::clone(backend)),
                Err(err) => Slot::Failed(err.clone()),
            };
        }

        match &outcome {
            Ok(_) => info!(attempt, "Inventory storage ready"),
            Err(err) => {
                warn!(attempt, error = %err, "Inventory storage initialization failed");
                self.report_failure(err);
            }
        }

        tx.send_replace(Some(outcome.clone()));
        outcome
    }

    async fn attempt(&self) -> InitOutcome {
        let backend = self.connector.connect().await.map_err(DbError::unavailable)?;

        match self.prepare(backend.as_ref()).await {
            Ok(()) => Ok(backend),
            Err(err) => {
                debug!("Closing half-open backend");
                backend.close().await;
                Err(DbError::unavailable(err))
            }
        }
    }

    async fn prepare(&self, backend: &dyn InventoryBackend) -> DbResult<()> {
        backend.prepare_schema().await?;

        if self.seed_on_empty && backend.count().await? == 0 {
            let now = Utc::now().trunc_subsecs(3);
            let records: Vec<_> = seed_devices(now)
                .into_iter()
                .map(|input| {
                    let id = input.ensure_id();
                    let updated_at = input.updated_at.unwrap_or(now);
                    input.into_record(id, updated_at)
                })
                .collect();

            let seeded = records.len();
            backend
                .write(WriteBatch::upsert(ConflictKey::Id, records))
                .await?;
            info!(seeded, "Seeded empty inventory with example devices");
        }

        Ok(())
    }

    fn report_failure(&self, err: &DbError) {
        if self.notified.swap(true, Ordering::SeqCst) {
            return;
        }
        self.notifier
            .notify(&InitFailureNotice::storage_unavailable(err));
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Puts the manager back to `Uninitialized` if the driving future is dropped
/// mid-attempt. Waiters see the sender vanish and get an error.
struct AttemptGuard<'a> {
    manager: &'a ConnectionManager,
    armed: bool,
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.armed {
            warn!("Initialization attempt abandoned");
            *self.manager.lock_slot() = Slot::Uninitialized;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
