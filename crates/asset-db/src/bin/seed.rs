//! # Seed Data Generator
//!
//! Populates a database with synthetic devices for development.
//!
//! ## Usage
//! ```bash
//! # Generate 500 devices (default)
//! cargo run -p asset-db --bin seed
//!
//! # Generate custom amount
//! cargo run -p asset-db --bin seed -- --count 5000
//!
//! # Specify database path
//! cargo run -p asset-db --bin seed -- --db ./data/asset_scan.db
//! ```
//!
//! Devices are merged by serial number, so running it twice updates the same
//! rows instead of piling up duplicates.

use std::env;

use asset_core::{DeviceInput, DeviceStatus};
use asset_db::{ConnectionManager, DbConfig, InventoryStore};

/// Device families: (serial prefix, name, model)
const FAMILIES: &[(&str, &str, &str)] = &[
    ("TS", "Thermal Scanner", "TS-200"),
    ("BH", "Barcode Handheld", "BHX-10"),
    ("AT", "Asset Tracker", "AT-4G"),
    ("LP", "Label Printer", "LP-8"),
    ("RF", "RFID Gate", "RF-2"),
];

const LOCATIONS: &[&str] = &[
    "Warehouse A",
    "Warehouse B",
    "Repair Bench",
    "Loading Dock",
    "Front Office",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut count: usize = 500;
    let mut db_path = String::from("./asset_scan_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--count" | "-c" => {
                if i + 1 < args.len() {
                    count = args[i + 1].parse().unwrap_or(500);
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Asset Scan Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --count <N>    Number of devices to generate (default: 500)");
                println!("  -d, --db <PATH>    Database file path (default: ./asset_scan_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Asset Scan Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);
    println!("Devices:  {}", count);
    println!();

    let store = InventoryStore::new(ConnectionManager::sqlite(DbConfig::new(&db_path)));
    store.ready().await?;
    println!("✓ Connected, migrations applied");

    let start = std::time::Instant::now();
    let devices: Vec<DeviceInput> = (0..count).map(generate_device).collect();
    let merged = store.merge_by_serial(devices).await?;

    let elapsed = start.elapsed();
    println!("✓ Merged {} devices in {:?}", merged, elapsed);

    let hits = store.search(Some("TS")).await?;
    println!("  Search 'TS': {} results", hits.len());

    store.close().await;
    println!("✓ Seed complete!");

    Ok(())
}

/// Generates one device; the same `seed` always yields the same serial.
fn generate_device(seed: usize) -> DeviceInput {
    let (prefix, name, model) = FAMILIES[seed % FAMILIES.len()];
    let status = DeviceStatus::ALL[(seed / FAMILIES.len()) % DeviceStatus::ALL.len()];
    let location = LOCATIONS[(seed * 7) % LOCATIONS.len()];

    DeviceInput::new(format!("SN-{prefix}-{:06}", seed), format!("{name} #{}", seed + 1))
        .with_model(model)
        .with_status(status)
        .with_location(location)
}
