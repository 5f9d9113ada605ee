//! # asset-scan: Command-Line Shell for the Device Inventory
//!
//! ## Application Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Asset Scan CLI                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  stdin (scanner wedge)          argv (clap)          config.toml │  │
//! │  └───────────┬───────────────────────┬─────────────────────┬────────┘  │
//! │              ▼                       ▼                     ▼           │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Shell (this crate)                       │  │
//! │  │                                                                  │  │
//! │  │  lib.rs ─────► logging, config, state, dispatch                 │  │
//! │  │  cli.rs ─────► list, search, show, save, import, export, scan   │  │
//! │  │  commands/ ──► one function per subcommand, JSON DTOs            │  │
//! │  │  sheet.rs ───► CSV codec                                         │  │
//! │  │  state/ ─────► StoreState, ConfigState                           │  │
//! │  └──────────────────────────────────┬───────────────────────────────┘  │
//! │                                     ▼                                   │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  asset-db InventoryStore ──► SQLite (asset_scan.db, WAL)         │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Startup Sequence
//! 1. Initialize tracing (stderr)
//! 2. Parse the command line
//! 3. Load configuration (defaults → file → environment)
//! 4. Build state objects (the database is not opened yet)
//! 5. Dispatch the command; the first data access opens the database
//! 6. Close the store and exit

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod notifier;
pub mod scanner;
pub mod sheet;
pub mod state;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::AppConfig;
use error::ApiError;
use notifier::StderrNotifier;
use state::{ConfigState, StoreState};

/// Runs one CLI invocation.
///
/// Output is JSON on stdout. On failure the [`ApiError`] is printed instead
/// and the exit code is non-zero.
pub async fn run() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match execute(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(code = ?err.code, "{}", err.message);
            match serde_json::to_string_pretty(&err) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{err}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: Cli) -> Result<(), ApiError> {
    let config = AppConfig::load(cli.config)?;
    info!(backend = %config.storage.backend, "Starting Asset Scan");

    let store = StoreState::from_config(&config, Arc::new(StderrNotifier));
    let config = ConfigState::new(config);

    let mut stdout = std::io::stdout();
    let result = commands::dispatch(cli.command, &store, &config, &mut stdout).await;

    store.inner().close().await;
    result
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=asset_db=trace` - Trace the storage layer only
/// - Default: INFO, DEBUG for asset crates, WARN for sqlx
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,asset_scan=debug,asset_db=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
