//! # Application Configuration
//!
//! Where the inventory lives and how it is opened.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     ASSET_SCAN_DB_PATH=/data/devices.db                                │
//! │     ASSET_SCAN_BACKEND=memory                                          │
//! │     ASSET_SCAN_SEED=false                                              │
//! │     ASSET_SCAN_EXPORT_DIR=/mnt/share                                   │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config <path>, else                                              │
//! │     ~/.config/asset-scan/config.toml (Linux)                           │
//! │     ~/Library/Application Support/com.assetscan.asset-scan (macOS)     │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     sqlite in the platform data dir, seed on empty                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [storage]
//! backend = "sqlite"          # sqlite | memory
//! database_path = "/data/asset_scan.db"
//! seed_on_empty = true
//! max_connections = 5
//! connect_timeout_secs = 30
//!
//! [transfer]
//! export_dir = "/home/me/Documents"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use asset_db::DbConfig;

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML for [`AppConfig`].
    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Storage Settings
// =============================================================================

/// Which backend holds the inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// SQLite file on disk.
    #[default]
    Sqlite,
    /// Process memory; gone on exit.
    Memory,
}

impl std::str::FromStr for BackendKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" | "file" => Ok(BackendKind::Sqlite),
            "memory" | "mem" => Ok(BackendKind::Memory),
            other => Err(ConfigError::Invalid(format!(
                "Unknown storage backend: '{}'. Valid options: sqlite, memory",
                other
            ))),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Sqlite => write!(f, "sqlite"),
            BackendKind::Memory => write!(f, "memory"),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default)]
    pub backend: BackendKind,

    /// Database file. Default: `<platform data dir>/asset_scan.db`.
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Write the example devices into an empty database.
    #[serde(default = "default_true")]
    pub seed_on_empty: bool,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_connections() -> u32 {
    5
}

fn default_connect_timeout() -> u64 {
    30
}

impl Default for StorageSettings {
    fn default() -> Self {
        StorageSettings {
            backend: BackendKind::default(),
            database_path: None,
            seed_on_empty: true,
            max_connections: default_max_connections(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// `[transfer]` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferSettings {
    /// Where `export` writes when no `--out` is given. Default: current dir.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
}

// =============================================================================
// App Configuration
// =============================================================================

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub transfer: TransferSettings,
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, else the platform config dir)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ConfigResult<Self> {
        let explicit = config_path.is_some();
        let mut config = AppConfig::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else if explicit {
                return Err(ConfigError::Io {
                    path,
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
                });
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns defaults (plus environment) if loading fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            let mut config = AppConfig::default();
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        })
    }

    /// Parses a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&contents)?)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "max_connections must be greater than 0".into(),
            ));
        }

        if self.storage.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be greater than 0".into(),
            ));
        }

        if let Some(path) = &self.storage.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Invalid("database_path must not be empty".into()));
            }
        }

        Ok(())
    }

    /// Applies `ASSET_SCAN_*` overrides read through `lookup`.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("ASSET_SCAN_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.storage.database_path = Some(PathBuf::from(path));
        }

        if let Some(backend) = lookup("ASSET_SCAN_BACKEND") {
            match backend.parse() {
                Ok(kind) => self.storage.backend = kind,
                Err(e) => warn!(backend = %backend, "Ignoring backend override: {}", e),
            }
        }

        if let Some(seed) = lookup("ASSET_SCAN_SEED") {
            match seed.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => self.storage.seed_on_empty = true,
                "0" | "false" | "no" | "off" => self.storage.seed_on_empty = false,
                _ => warn!(seed = %seed, "Unknown seed flag in environment"),
            }
        }

        if let Some(dir) = lookup("ASSET_SCAN_EXPORT_DIR") {
            self.transfer.export_dir = Some(PathBuf::from(dir));
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// The database file that will be opened.
    ///
    /// ## Platform-Specific Defaults
    /// - **macOS**: `~/Library/Application Support/com.assetscan.asset-scan/asset_scan.db`
    /// - **Windows**: `%APPDATA%\assetscan\asset-scan\data\asset_scan.db`
    /// - **Linux**: `~/.local/share/asset-scan/asset_scan.db`
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.storage.database_path {
            return path.clone();
        }
        let file = format!("{}.db", asset_core::DB_NAME);
        match project_dirs() {
            Some(dirs) => dirs.data_dir().join(file),
            None => PathBuf::from(file),
        }
    }

    /// Pool settings for the SQLite backend.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(self.database_path())
            .max_connections(self.storage.max_connections)
            .min_connections(1u32.min(self.storage.max_connections))
            .connect_timeout(Duration::from_secs(self.storage.connect_timeout_secs))
    }

    /// Directory for exports without an explicit `--out`.
    pub fn export_dir(&self) -> PathBuf {
        self.transfer
            .export_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "assetscan", "asset-scan")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.storage.backend, BackendKind::Sqlite);
        assert!(config.storage.seed_on_empty);
        assert_eq!(config.storage.max_connections, 5);
        assert!(config.validate().is_ok());
        assert!(config.database_path().ends_with("asset_scan.db"));
    }

    #[test]
    fn test_parse_toml_with_partial_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [storage]
            backend = "memory"
            seed_on_empty = false
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert!(!config.storage.seed_on_empty);
        assert_eq!(config.storage.connect_timeout_secs, 30);
        assert_eq!(config.transfer, TransferSettings::default());
    }

    #[test]
    fn test_env_overrides_win() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[
            ("ASSET_SCAN_DB_PATH", "/tmp/inventory.db"),
            ("ASSET_SCAN_BACKEND", "MEMORY"),
            ("ASSET_SCAN_SEED", "off"),
            ("ASSET_SCAN_EXPORT_DIR", "/tmp/out"),
        ]));

        assert_eq!(config.database_path(), PathBuf::from("/tmp/inventory.db"));
        assert_eq!(config.storage.backend, BackendKind::Memory);
        assert!(!config.storage.seed_on_empty);
        assert_eq!(config.export_dir(), PathBuf::from("/tmp/out"));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_overrides(env(&[
            ("ASSET_SCAN_BACKEND", "postgres"),
            ("ASSET_SCAN_SEED", "maybe"),
        ]));
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        config.storage.max_connections = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.storage.database_path = Some(PathBuf::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[storage]\nmax_connections = 2\n\n[transfer]\nexport_dir = \"/srv/exports\"\n",
        )
        .unwrap();

        let config = AppConfig::from_file(&path).unwrap();
        assert_eq!(config.storage.max_connections, 2);
        assert_eq!(config.db_config().max_connections, 2);
        assert_eq!(config.export_dir(), PathBuf::from("/srv/exports"));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = AppConfig::load(Some(dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_toml_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[storage]"));
        assert!(toml_str.contains("backend = \"sqlite\""));
    }
}
