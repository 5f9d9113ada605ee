//! # Transfer Commands
//!
//! CSV import and export.
//!
//! ## Import Modes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  merge (default)                    replace                            │
//! │  ────────────────                   ───────                            │
//! │  upsert on serialNumber             delete every device, then insert   │
//! │  devices not in the file stay       only the file's devices remain     │
//! │                                                                         │
//! │  Either way the whole file is one transaction: one bad row and         │
//! │  nothing changes.                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::cli::ImportMode;
use crate::error::ApiError;
use crate::sheet::{read_devices, write_devices};
use crate::state::{ConfigState, StoreState};

/// Output of `import`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummaryDto {
    pub file: String,
    pub mode: &'static str,
    /// Rows with a serial number.
    pub rows: usize,
    /// Devices written.
    pub written: usize,
}

/// Output of `export`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummaryDto {
    pub file: String,
    pub devices: usize,
}

/// Loads `file` into the inventory.
///
/// ## Errors
/// - `IO_ERROR` / `IMPORT_ERROR` if the file can't be read or parsed
/// - `VALIDATION_ERROR` for a replace with no usable rows
/// - any storage error; the inventory is left untouched
pub async fn import(
    store: &StoreState,
    file: &Path,
    mode: ImportMode,
) -> Result<ImportSummaryDto, ApiError> {
    let start = Instant::now();
    debug!(file = ?file, ?mode, "import command");

    let bytes = tokio::fs::read(file).await?;
    let inputs = read_devices(bytes.as_slice())?;
    let rows = inputs.len();

    let written = match mode {
        ImportMode::Merge => store.inner().merge_by_serial(inputs).await?,
        ImportMode::Replace => {
            if inputs.is_empty() {
                return Err(ApiError::validation(format!(
                    "{} has no devices with a serial number; refusing to empty the inventory",
                    file.display()
                )));
            }
            store.inner().replace_all(inputs).await?
        }
    };

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        rows,
        written,
        ?mode,
        "import complete"
    );

    Ok(ImportSummaryDto {
        file: file.display().to_string(),
        mode: match mode {
            ImportMode::Merge => "merge",
            ImportMode::Replace => "replace",
        },
        rows,
        written,
    })
}

/// Writes every device to `out`, or to today's default file.
pub async fn export(
    store: &StoreState,
    config: &ConfigState,
    out: Option<PathBuf>,
) -> Result<ExportSummaryDto, ApiError> {
    let start = Instant::now();
    let path = out.unwrap_or_else(|| config.export_path(Utc::now().date_naive()));
    debug!(file = ?path, "export command");

    let devices = store.inner().export_all().await?;
    let mut buffer = Vec::new();
    let count = write_devices(&mut buffer, &devices)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&path, buffer).await?;

    info!(
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        devices = count,
        file = ?path,
        "export complete"
    );

    Ok(ExportSummaryDto {
        file: path.display().to_string(),
        devices: count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_db::{ConnectionManager, InventoryStore};

    use crate::config::AppConfig;
    use crate::error::ErrorCode;

    fn memory_store() -> StoreState {
        StoreState::new(InventoryStore::new(ConnectionManager::memory()))
    }

    fn config_in(dir: &Path) -> ConfigState {
        let mut config = AppConfig::default();
        config.transfer.export_dir = Some(dir.to_path_buf());
        ConfigState::new(config)
    }

    #[tokio::test]
    async fn test_export_then_replace_restores_inventory() {
        let dir = tempfile::tempdir().unwrap();
        let store = memory_store();
        let config = config_in(dir.path());

        let summary = export(&store, &config, None).await.unwrap();
        assert_eq!(summary.devices, 3);
        assert!(summary.file.contains("devices-"));
        let before = store.inner().export_all().await.unwrap();

        store
            .inner()
            .merge_by_serial(vec![asset_core::DeviceInput::new("SN-EXTRA", "Extra")])
            .await
            .unwrap();
        assert_eq!(store.inner().export_all().await.unwrap().len(), 4);

        let imported = import(&store, Path::new(&summary.file), ImportMode::Replace)
            .await
            .unwrap();
        assert_eq!(imported.written, 3);
        assert_eq!(store.inner().export_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_merge_import_keeps_other_devices() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("incoming.csv");
        tokio::fs::write(
            &file,
            "serialNumber,name,status\nSN-AX-202401,Renamed Scanner,retired\nSN-NEW-1,,active\n,skipped,\n",
        )
        .await
        .unwrap();

        let store = memory_store();
        let summary = import(&store, &file, ImportMode::Merge).await.unwrap();
        assert_eq!(summary.rows, 2);
        assert_eq!(summary.mode, "merge");

        let all = store.inner().export_all().await.unwrap();
        assert_eq!(all.len(), 4);

        let renamed = store.inner().search(Some("SN-AX-202401")).await.unwrap();
        assert_eq!(renamed.len(), 1);
        assert_eq!(renamed[0].name, "Renamed Scanner");
        assert_ne!(renamed[0].id, "dev-1001");

        let added = store.inner().search(Some("sn-new-1")).await.unwrap();
        assert_eq!(added[0].name, "Device 2");
    }

    #[tokio::test]
    async fn test_replace_with_empty_file_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.csv");
        tokio::fs::write(&file, "serialNumber,name\n").await.unwrap();

        let store = memory_store();
        let err = import(&store, &file, ImportMode::Replace).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(store.inner().export_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = memory_store();
        let err = import(&store, &dir.path().join("nope.csv"), ImportMode::Merge)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::IoError);
    }
}
