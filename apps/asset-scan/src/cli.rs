//! Command-line interface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use asset_core::{DeviceInput, DeviceStatus};

/// Scan, edit, import and export a local device inventory.
#[derive(Debug, Parser)]
#[command(name = "asset-scan", version, about)]
pub struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, short = 'c', global = true, env = "ASSET_SCAN_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List every device, newest first
    List,

    /// Find devices whose serial number contains QUERY (case-insensitive)
    Search { query: String },

    /// Show one device by id
    Show { id: String },

    /// Create or update a device
    Save(SaveArgs),

    /// Load devices from a CSV file
    Import {
        file: PathBuf,

        /// Merge by serial number, or replace the whole inventory
        #[arg(long, value_enum, default_value_t = ImportMode::Merge)]
        mode: ImportMode,
    },

    /// Write every device to a CSV file
    Export {
        /// Output file (default: devices-YYYY-MM-DD.csv in the export dir)
        #[arg(long, short = 'o')]
        out: Option<PathBuf>,
    },

    /// Read scanned codes from stdin and look each one up
    Scan,

    /// Show connection state and device count
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImportMode {
    /// Upsert on serial number; other devices are kept
    Merge,
    /// Delete everything, then insert the file's rows
    Replace,
}

/// Fields for `save`. Omitting `--id` creates a new device.
#[derive(Debug, Args)]
pub struct SaveArgs {
    #[arg(long)]
    pub id: Option<String>,

    #[arg(long = "serial", short = 's')]
    pub serial_number: String,

    #[arg(long, short = 'n')]
    pub name: String,

    #[arg(long, short = 'm', default_value = "")]
    pub model: String,

    /// active, inactive, maintenance or retired
    #[arg(long, default_value = "inactive")]
    pub status: String,

    #[arg(long, short = 'l')]
    pub location: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,
}

impl SaveArgs {
    /// Builds the input. The status must be one of the four names.
    pub fn into_input(self) -> Result<DeviceInput, asset_core::CoreError> {
        let status: DeviceStatus = self.status.parse()?;
        Ok(DeviceInput {
            id: self.id,
            serial_number: self.serial_number,
            name: self.name,
            model: self.model,
            status,
            location: self.location,
            notes: self.notes,
            updated_at: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_import_defaults_to_merge() {
        let cli = Cli::try_parse_from(["asset-scan", "import", "devices.csv"]).unwrap();
        match cli.command {
            Command::Import { file, mode } => {
                assert_eq!(file, PathBuf::from("devices.csv"));
                assert_eq!(mode, ImportMode::Merge);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_save() {
        let cli = Cli::try_parse_from([
            "asset-scan", "save", "--serial", "SN-1", "--name", "Scanner", "--status", "Active",
        ])
        .unwrap();
        let Command::Save(args) = cli.command else {
            panic!("expected save");
        };
        let input = args.into_input().unwrap();
        assert_eq!(input.serial_number, "SN-1");
        assert_eq!(input.status, DeviceStatus::Active);
        assert_eq!(input.id, None);
    }

    #[test]
    fn test_save_rejects_unknown_status() {
        let cli = Cli::try_parse_from([
            "asset-scan", "save", "-s", "SN-1", "-n", "Scanner", "--status", "broken",
        ])
        .unwrap();
        let Command::Save(args) = cli.command else {
            panic!("expected save");
        };
        assert!(args.into_input().is_err());
    }
}
