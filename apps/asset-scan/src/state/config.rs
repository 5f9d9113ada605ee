//! # Configuration State
//!
//! Read-only view of [`AppConfig`] for commands.

use std::path::PathBuf;

use chrono::NaiveDate;

use crate::config::AppConfig;
use crate::sheet::export_file_name;

#[derive(Debug, Clone, Default)]
pub struct ConfigState {
    config: AppConfig,
}

impl ConfigState {
    pub fn new(config: AppConfig) -> Self {
        ConfigState { config }
    }

    pub fn inner(&self) -> &AppConfig {
        &self.config
    }

    /// Where an export made on `date` goes when no path is given.
    pub fn export_path(&self, date: NaiveDate) -> PathBuf {
        self.config.export_dir().join(export_file_name(date))
    }
}
