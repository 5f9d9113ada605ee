//! # asset-db: Inventory Store for Asset Scan
//!
//! Every read and write of device data goes through this crate. Storage is
//! SQLite via sqlx, opened lazily on first use; an in-memory backend with the
//! same behavior backs tests and demos.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Asset Scan Data Flow                             │
//! │                                                                         │
//! │  CLI command (search, save, import, export, scan)                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     asset-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌────────────────┐   ┌───────────────┐   │   │
//! │  │   │ InventoryStore│──►│ConnectionManager│──►│   Connector   │   │   │
//! │  │   │  (store.rs)   │   │ (connection.rs) │   │  sqlite/memory│   │   │
//! │  │   └──────┬────────┘   └────────────────┘   └───────┬───────┘   │   │
//! │  │          │                                         │           │   │
//! │  │   ┌──────▼────────┐                        ┌───────▼───────┐   │   │
//! │  │   │   ReadCache   │                        │InventoryBackend│  │   │
//! │  │   │  (cache.rs)   │                        │ + migrations   │   │   │
//! │  │   └───────────────┘                        └───────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │       SQLite Database  (<data dir>/asset_scan.db)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - Search, lookup, save, bulk replace/merge, export
//! - [`connection`] - Lazy, coalesced initialization and failure notices
//! - [`cache`] - Snapshot of the last full listing
//! - [`backend`] - Storage trait with SQLite and in-memory implementations
//! - [`pool`] - SQLite pool configuration
//! - [`migrations`] - Embedded schema migrations
//! - [`notify`] - Where initialization failures are reported
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use asset_db::{ConnectionManager, DbConfig, InventoryStore};
//!
//! let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::new("asset_scan.db")));
//!
//! let saved = store.save(DeviceInput::new("SN-AX-202404", "Label Printer")).await?;
//! let hits = store.search(Some("ax-2024")).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod backend;
pub mod cache;
pub mod connection;
pub mod error;
pub mod migrations;
pub mod notify;
pub mod pool;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use backend::{
    BackendStatus, Connector, InventoryBackend, MemoryBackend, MemoryConnector, SqliteBackend,
    SqliteConnector, WriteBatch, WriteMode,
};
pub use cache::{ReadCache, Snapshot};
pub use connection::{ConnectionManager, ConnectionState};
pub use error::{DbError, DbResult};
pub use notify::{InitFailureNotice, LogNotifier, Notifier, RecordingNotifier};
pub use pool::DbConfig;
pub use store::InventoryStore;
