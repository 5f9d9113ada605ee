//! # Commands Module
//!
//! One function per CLI subcommand. Each returns a serializable DTO (or
//! writes a stream of them) and leaves printing to [`emit`].
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs       ◄─── You are here (dispatch, output)
//! ├── device.rs    ◄─── list, search, show, save, status
//! ├── transfer.rs  ◄─── CSV import and export
//! └── scan.rs      ◄─── Scanner loop
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  $ asset-scan search ax-2024                                            │
//! │         │                                                               │
//! │         ▼  clap                                                         │
//! │  Command::Search { query }                                              │
//! │         │                                                               │
//! │         ▼  dispatch(command, &StoreState, &ConfigState, stdout)         │
//! │  device::search(&store, "ax-2024") -> Vec<DeviceDto>                    │
//! │         │                                                               │
//! │         ▼  emit                                                         │
//! │  [ { "id": "dev-1001", "serialNumber": "SN-AX-202401", ... } ]          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod device;
pub mod scan;
pub mod transfer;

use std::io::Write;

use serde::Serialize;

use crate::cli::Command;
use crate::error::ApiError;
use crate::scanner::LineScanner;
use crate::state::{ConfigState, StoreState};

pub use device::{DeviceDto, StatusDto};
pub use scan::ScanResultDto;
pub use transfer::{ExportSummaryDto, ImportSummaryDto};

/// Runs one command, writing its JSON output to `out`.
pub async fn dispatch(
    command: Command,
    store: &StoreState,
    config: &ConfigState,
    out: &mut (dyn Write + Send),
) -> Result<(), ApiError> {
    match command {
        Command::List => emit(out, &device::list(store).await?),
        Command::Search { query } => emit(out, &device::search(store, &query).await?),
        Command::Show { id } => emit(out, &device::show(store, &id).await?),
        Command::Save(args) => emit(out, &device::save(store, args.into_input()?).await?),
        Command::Import { file, mode } => {
            emit(out, &transfer::import(store, &file, mode).await?)
        }
        Command::Export { out: path } => {
            emit(out, &transfer::export(store, config, path).await?)
        }
        Command::Scan => {
            let mut source = LineScanner::stdin();
            scan::run(store, &mut source, out).await.map(|_| ())
        }
        Command::Status => emit(out, &device::status(store).await),
    }
}

/// Writes `value` as pretty JSON followed by a newline.
pub fn emit<T: Serialize + ?Sized>(out: &mut (dyn Write + Send), value: &T) -> Result<(), ApiError> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Writes `value` as a single JSON line.
pub fn emit_line<T: Serialize + ?Sized>(
    out: &mut (dyn Write + Send),
    value: &T,
) -> Result<(), ApiError> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use asset_db::{ConnectionManager, InventoryStore};

    #[tokio::test]
    async fn test_dispatch_list_prints_seed_devices() {
        let store = StoreState::new(InventoryStore::new(ConnectionManager::memory()));
        let config = ConfigState::default();
        let mut out = Vec::new();

        dispatch(Command::List, &store, &config, &mut out).await.unwrap();

        let devices: Vec<serde_json::Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(devices.len(), 3);
        assert!(devices[0]["serialNumber"].as_str().unwrap().starts_with("SN-AX-"));
    }

    #[tokio::test]
    async fn test_dispatch_show_missing_is_not_found() {
        let store = StoreState::new(InventoryStore::new(ConnectionManager::memory()));
        let config = ConfigState::default();
        let mut out = Vec::new();

        let err = dispatch(Command::Show { id: "nope".into() }, &store, &config, &mut out)
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::NotFound);
        assert!(out.is_empty());
    }
}
