//! # Asset Scan Entry Point
//!
//! The actual setup lives in lib.rs so it can be tested.

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    asset_scan::run().await
}
