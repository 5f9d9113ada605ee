//! # Read Cache
//!
//! The last full device listing, held in memory for the UI.
//!
//! ```text
//!   writer (store, under its writer lock)          readers (any task)
//!   ─────────────────────────────────────          ──────────────────
//!   fetch_all() ──► publish(Vec) ──► watch ──► snapshot()  / subscribe()
//! ```
//!
//! A snapshot is an `Arc<Vec<DeviceRecord>>` swapped in whole, so a reader
//! always sees one complete listing: the one before a write or the one
//! after it, never a mix.

use std::sync::Arc;

use tokio::sync::watch;

use asset_core::DeviceRecord;

/// Immutable listing shared with readers.
pub type Snapshot = Arc<Vec<DeviceRecord>>;

/// Holds the newest published listing and notifies subscribers of changes.
#[derive(Debug)]
pub struct ReadCache {
    tx: watch::Sender<Snapshot>,
}

impl Default for ReadCache {
    fn default() -> Self {
        ReadCache::new()
    }
}

impl ReadCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Vec::new()));
        ReadCache { tx }
    }

    /// The current listing.
    pub fn snapshot(&self) -> Snapshot {
        Arc::clone(&self.tx.borrow())
    }

    /// A receiver that wakes on every publish.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Replaces the listing wholesale.
    pub(crate) fn publish(&self, records: Vec<DeviceRecord>) {
        self.tx.send_replace(Arc::new(records));
    }

    /// Drops back to an empty listing.
    pub(crate) fn clear(&self) {
        self.publish(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.tx.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
