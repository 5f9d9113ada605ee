//! # Store State
//!
//! Owns the [`InventoryStore`] for the lifetime of the process.
//!
//! Building the state does not touch the database; the first command that
//! needs data opens it.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn search(store: &StoreState, query: &str) -> Result<Vec<DeviceDto>, ApiError> {
//!     let devices = store.inner().search(Some(query)).await?;
//!     Ok(devices.into_iter().map(DeviceDto::from).collect())
//! }
//! ```

use std::sync::Arc;

use tracing::{info, warn};

use asset_db::{ConnectionManager, InventoryStore, Notifier};

use crate::config::{AppConfig, BackendKind};

#[derive(Debug)]
pub struct StoreState {
    store: InventoryStore,
}

impl StoreState {
    /// Wraps an already-built store.
    pub fn new(store: InventoryStore) -> Self {
        StoreState { store }
    }

    /// Builds the store the configuration asks for.
    pub fn from_config(config: &AppConfig, notifier: Arc<dyn Notifier>) -> Self {
        let connection = match config.storage.backend {
            BackendKind::Sqlite => {
                let db_config = config.db_config();
                if let Some(parent) = db_config.database_path.parent() {
                    if let Err(e) = std::fs::create_dir_all(parent) {
                        warn!(dir = ?parent, "Cannot create data directory: {}", e);
                    }
                }
                ConnectionManager::sqlite(db_config)
            }
            BackendKind::Memory => ConnectionManager::memory(),
        }
        .with_notifier(notifier)
        .seed_on_empty(config.storage.seed_on_empty);

        info!(
            backend = %config.storage.backend,
            target = %connection.describe(),
            "Device store configured"
        );

        StoreState::new(InventoryStore::new(connection))
    }

    pub fn inner(&self) -> &InventoryStore {
        &self.store
    }
}
