//! # Scan Command
//!
//! Each scanned code is used as a serial-number search; one JSON line is
//! printed per scan so the output can be piped while scanning continues.

use std::io::Write;

use serde::Serialize;
use tracing::{debug, info};

use super::device::DeviceDto;
use super::emit_line;
use crate::error::ApiError;
use crate::scanner::ScanSource;
use crate::state::StoreState;

/// One scan and what it matched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResultDto {
    pub code: String,
    pub matches: Vec<DeviceDto>,
}

/// Reads codes until the source ends. Returns how many were scanned.
pub async fn run(
    store: &StoreState,
    source: &mut dyn ScanSource,
    out: &mut (dyn Write + Send),
) -> Result<usize, ApiError> {
    let mut scanned = 0;

    while let Some(code) = source.next_code().await? {
        scanned += 1;
        debug!(code = %code, "scanned");

        let matches = store
            .inner()
            .search(Some(&code))
            .await?
            .into_iter()
            .map(DeviceDto::from)
            .collect();

        emit_line(out, &ScanResultDto { code, matches })?;
    }

    info!(scanned, "scan session ended");
    Ok(scanned)
}
