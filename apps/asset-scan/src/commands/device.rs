//! # Device Commands
//!
//! Listing, lookup and editing of single devices.
//!
//! ## Lookup Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  list            search <q>             show <id>          save         │
//! │   │                  │                      │                │          │
//! │   ▼                  ▼                      ▼                ▼          │
//! │  search(None)    search(Some(q))      get_by_id(id)     save(input)     │
//! │   │  refreshes        │ serial LIKE          │                │          │
//! │   │  the cache        │ %q%, no case         │ None →         │ stamps   │
//! │   ▼                  ▼                      ▼ NOT_FOUND      ▼ now      │
//! │  Vec<DeviceDto>   Vec<DeviceDto>        DeviceDto         DeviceDto     │
//! │                                                                         │
//! │  Database unavailable: list/search/show answer empty (after one        │
//! │  notice on stderr); save fails with DATABASE_UNAVAILABLE.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use asset_core::{format_timestamp, CoreError, DeviceInput, DeviceRecord, DeviceStatus};
use asset_db::{BackendStatus, ConnectionState};

use crate::error::ApiError;
use crate::state::StoreState;

/// Device as printed by every command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDto {
    pub id: String,
    pub serial_number: String,
    pub name: String,
    pub model: String,
    pub status: DeviceStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    /// RFC 3339, millisecond precision, `Z` suffix.
    pub updated_at: String,
}

impl From<DeviceRecord> for DeviceDto {
    fn from(d: DeviceRecord) -> Self {
        DeviceDto {
            updated_at: format_timestamp(&d.updated_at),
            id: d.id,
            serial_number: d.serial_number,
            name: d.name,
            model: d.model,
            status: d.status,
            location: d.location,
            notes: d.notes,
        }
    }
}

/// Output of `status`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub state: ConnectionState,
    pub target: String,
    pub attempts: usize,
    pub cached_devices: usize,
    pub backend: Option<BackendStatus>,
    pub error: Option<String>,
}

/// Every device, newest first.
pub async fn list(store: &StoreState) -> Result<Vec<DeviceDto>, ApiError> {
    let start = Instant::now();
    debug!("list command");

    let devices = store.inner().search(None).await?;
    let dtos: Vec<DeviceDto> = devices.into_iter().map(DeviceDto::from).collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        "list complete"
    );
    Ok(dtos)
}

/// Devices whose serial number contains `query`.
pub async fn search(store: &StoreState, query: &str) -> Result<Vec<DeviceDto>, ApiError> {
    let start = Instant::now();
    debug!(query = %query, "search command");

    let devices = store.inner().search(Some(query)).await?;
    let dtos: Vec<DeviceDto> = devices.into_iter().map(DeviceDto::from).collect();

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        count = dtos.len(),
        query = %query,
        "search complete"
    );
    Ok(dtos)
}

/// One device by id, or `NOT_FOUND`.
pub async fn show(store: &StoreState, id: &str) -> Result<DeviceDto, ApiError> {
    debug!(id = %id, "show command");
    let device = store
        .inner()
        .get_by_id(id)
        .await?
        .ok_or_else(|| CoreError::DeviceNotFound(id.to_string()))?;
    Ok(DeviceDto::from(device))
}

/// Creates or updates a device.
pub async fn save(store: &StoreState, input: DeviceInput) -> Result<DeviceDto, ApiError> {
    let start = Instant::now();
    debug!(serial = %input.serial_number, id = ?input.id, "save command");

    let saved = store.inner().save(input).await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        id = %saved.id,
        serial = %saved.serial_number,
        "save complete"
    );
    Ok(DeviceDto::from(saved))
}

/// Connection diagnostics. Never fails; a failed open shows up in `error`.
pub async fn status(store: &StoreState) -> StatusDto {
    let store = store.inner();
    let (backend, error) = match store.status().await {
        Ok(status) => (Some(status), None),
        Err(e) => (None, Some(e.to_string())),
    };

    StatusDto {
        state: store.state(),
        target: store.connection().describe(),
        attempts: store.connection().attempts(),
        cached_devices: store.devices().len(),
        backend,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use asset_db::{ConnectionManager, InventoryStore, MemoryConnector, RecordingNotifier};

    use crate::error::ErrorCode;

    fn memory_store() -> StoreState {
        StoreState::new(InventoryStore::new(ConnectionManager::memory()))
    }

    fn broken_store(notifier: Arc<RecordingNotifier>) -> StoreState {
        let connector = Arc::new(MemoryConnector::default());
        connector.fail_next_connects(usize::MAX);
        StoreState::new(InventoryStore::new(
            ConnectionManager::new(connector).with_notifier(notifier),
        ))
    }

    #[tokio::test]
    async fn test_save_then_search_case_insensitive() {
        let store = memory_store();
        let saved = save(&store, DeviceInput::new("SN-ZZ-1", "Label Printer"))
            .await
            .unwrap();

        let hits = search(&store, "sn-zz").await.unwrap();
        assert_eq!(hits, vec![saved.clone()]);

        let shown = show(&store, &saved.id).await.unwrap();
        assert_eq!(shown, saved);
        assert!(shown.updated_at.ends_with('Z'));
    }

    #[tokio::test]
    async fn test_show_missing_device_is_not_found() {
        let store = memory_store();
        let err = show(&store, "dev-missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert!(err.message.contains("dev-missing"));
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = memory_store();
        store.inner().ready().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let saved = save(&store, DeviceInput::new("SN-NEW", "Newest")).await.unwrap();

        let all = list(&store).await.unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all[0].id, saved.id);
    }

    #[tokio::test]
    async fn test_save_duplicate_serial_is_conflict() {
        let store = memory_store();
        let err = save(&store, DeviceInput::new("SN-AX-202401", "Copy"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_unavailable_reads_are_empty_writes_fail() {
        let notifier = Arc::new(RecordingNotifier::new());
        let store = broken_store(notifier.clone());

        assert!(list(&store).await.unwrap().is_empty());
        assert_eq!(
            show(&store, "dev-1001").await.unwrap_err().code,
            ErrorCode::NotFound
        );

        let err = save(&store, DeviceInput::new("SN-1", "X")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseUnavailable);

        let report = status(&store).await;
        assert_eq!(report.state, ConnectionState::Failed);
        assert!(report.backend.is_none());
        assert!(report.error.is_some());
        assert!(notifier.count() >= 1);
    }

    #[tokio::test]
    async fn test_status_reports_backend() {
        let store = memory_store();
        let report = status(&store).await;
        assert_eq!(report.state, ConnectionState::Ready);
        assert_eq!(report.target, "memory");
        let backend = report.backend.unwrap();
        assert_eq!(backend.kind, "memory");
        assert_eq!(backend.device_count, 3);
    }
}
