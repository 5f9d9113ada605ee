//! # Spreadsheet Codec
//!
//! CSV import and export of device records.
//!
//! ## Column Layout
//! ```text
//! id,serialNumber,name,model,status,location,notes,updatedAt
//! dev-1001,SN-AX-202401,Thermal Scanner,TS-200,active,Warehouse A,,2024-05-01T08:00:00.000Z
//! ```
//!
//! ## Import Rules
//! - Rows with a blank `serialNumber` are skipped
//! - A blank `name` becomes `Device {n}` where `n` is the 1-based data row
//! - `status` is matched case-insensitively; anything else is `inactive`
//! - `updatedAt` is kept only when it parses; otherwise the store stamps it
//! - Missing columns read as blank

use std::io;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use asset_core::{non_blank, parse_timestamp, DeviceInput, DeviceRecord, DeviceStatus};

/// Header row written on export.
pub const HEADER: [&str; 8] = [
    "id",
    "serialNumber",
    "name",
    "model",
    "status",
    "location",
    "notes",
    "updatedAt",
];

/// Spreadsheet read/write failures.
#[derive(Debug, Error)]
pub enum SheetError {
    #[error("Malformed spreadsheet: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet I/O failed: {0}")]
    Io(#[from] io::Error),
}

// =============================================================================
// Rows
// =============================================================================

/// One data row as read. Every cell is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct SheetRow {
    id: Option<String>,
    serial_number: Option<String>,
    name: Option<String>,
    model: Option<String>,
    status: Option<String>,
    location: Option<String>,
    notes: Option<String>,
    updated_at: Option<String>,
}

impl SheetRow {
    /// Converts the row at `index` (0-based) into an input, or `None` when it
    /// has no serial number.
    fn into_input(self, index: usize) -> Option<DeviceInput> {
        let serial_number = non_blank(self.serial_number)?;
        let name = non_blank(self.name).unwrap_or_else(|| format!("Device {}", index + 1));

        Some(DeviceInput {
            id: non_blank(self.id),
            serial_number,
            name,
            model: non_blank(self.model).unwrap_or_default(),
            status: DeviceStatus::coerce_opt(self.status.as_deref()),
            location: non_blank(self.location),
            notes: non_blank(self.notes),
            updated_at: self.updated_at.as_deref().and_then(parse_timestamp),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportRow<'a> {
    id: &'a str,
    serial_number: &'a str,
    name: &'a str,
    model: &'a str,
    status: &'static str,
    location: Option<&'a str>,
    notes: Option<&'a str>,
    updated_at: String,
}

impl<'a> From<&'a DeviceRecord> for ExportRow<'a> {
    fn from(d: &'a DeviceRecord) -> Self {
        ExportRow {
            id: &d.id,
            serial_number: &d.serial_number,
            name: &d.name,
            model: &d.model,
            status: d.status.as_str(),
            location: d.location.as_deref(),
            notes: d.notes.as_deref(),
            updated_at: asset_core::format_timestamp(&d.updated_at),
        }
    }
}

// =============================================================================
// Codec
// =============================================================================

/// Writes `devices` as CSV (header always present). Returns rows written.
pub fn write_devices<W: io::Write>(writer: W, devices: &[DeviceRecord]) -> Result<usize, SheetError> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);

    csv.write_record(HEADER)?;
    for device in devices {
        csv.serialize(ExportRow::from(device))?;
    }
    csv.flush()?;

    Ok(devices.len())
}

/// Reads device inputs from CSV, applying the import rules above.
pub fn read_devices<R: io::Read>(reader: R) -> Result<Vec<DeviceInput>, SheetError> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut inputs = Vec::new();
    for (index, row) in csv.deserialize::<SheetRow>().enumerate() {
        if let Some(input) = row?.into_input(index) {
            inputs.push(input);
        }
    }

    Ok(inputs)
}

/// Default export file name for `date`: `devices-YYYY-MM-DD.csv`.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("devices-{}.csv", date.format("%Y-%m-%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: &str, serial: &str) -> DeviceRecord {
        DeviceInput::new(serial, format!("Unit {id}"))
            .with_model("TS-200")
            .with_status(DeviceStatus::Maintenance)
            .with_location("Bench, left")
            .into_record(
                id.to_string(),
                Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
            )
    }

    #[test]
    fn test_export_writes_header_and_rows() {
        let mut out = Vec::new();
        let written = write_devices(&mut out, &[record("a", "SN-1")]).unwrap();
        assert_eq!(written, 1);

        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some(HEADER.join(",").as_str()));
        assert_eq!(
            lines.next(),
            Some("a,SN-1,Unit a,TS-200,maintenance,\"Bench, left\",,2024-05-01T08:00:00.000Z")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_export_of_nothing_still_has_header() {
        let mut out = Vec::new();
        write_devices(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap().trim_end(), HEADER.join(","));
    }

    #[test]
    fn test_exported_file_imports_back() {
        let devices = vec![record("a", "SN-1"), record("b", "SN-2")];
        let mut out = Vec::new();
        write_devices(&mut out, &devices).unwrap();

        let inputs = read_devices(out.as_slice()).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs[0], DeviceInput::from(devices[0].clone()));
        assert_eq!(inputs[1].location.as_deref(), Some("Bench, left"));
    }

    #[test]
    fn test_import_rules() {
        let csv = "\
serialNumber,name,status,updatedAt,notes
  SN-1  ,,ACTIVE,2024-03-09,
,Orphan,active,,
SN-3,Printer,broken,not a date,  fragile
";
        let inputs = read_devices(csv.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 2);

        let first = &inputs[0];
        assert_eq!(first.serial_number, "SN-1");
        assert_eq!(first.name, "Device 1");
        assert_eq!(first.status, DeviceStatus::Active);
        assert_eq!(first.id, None);
        assert_eq!(first.model, "");
        assert_eq!(
            first.updated_at,
            Some(Utc.with_ymd_and_hms(2024, 3, 9, 0, 0, 0).unwrap())
        );
        assert_eq!(first.notes, None);

        let third = &inputs[1];
        assert_eq!(third.serial_number, "SN-3");
        assert_eq!(third.status, DeviceStatus::Inactive);
        assert_eq!(third.updated_at, None);
        assert_eq!(third.notes.as_deref(), Some("fragile"));
    }

    #[test]
    fn test_fallback_name_counts_skipped_rows() {
        let csv = "serialNumber,name\n,\n,\nSN-9,\n";
        let inputs = read_devices(csv.as_bytes()).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name, "Device 3");
    }

    #[test]
    fn test_header_only_file_is_empty() {
        let inputs = read_devices(HEADER.join(",").as_bytes()).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_export_file_name() {
        let date = NaiveDate::from_ymd_opt(2024, 7, 4).unwrap();
        assert_eq!(export_file_name(date), "devices-2024-07-04.csv");
    }
}
