//! # Seed Data
//!
//! Example devices written into a freshly created, empty inventory so the
//! app has something to show (and to scan against) on first launch.
//!
//! Seeding happens at most once per database: only when the `devices` table
//! is empty at initialization time.

use chrono::{DateTime, Utc};

use crate::types::{DeviceInput, DeviceStatus};

/// (id, serial, name, model, status, location, notes)
const SEED_DEVICES: &[(&str, &str, &str, &str, DeviceStatus, &str, &str)] = &[
    (
        "dev-1001",
        "SN-AX-202401",
        "Thermal Scanner",
        "TS-200",
        DeviceStatus::Active,
        "Warehouse A",
        "Calibrated last week",
    ),
    (
        "dev-1002",
        "SN-AX-202402",
        "Barcode Handheld",
        "BHX-10",
        DeviceStatus::Maintenance,
        "Repair Bench",
        "Battery replacement pending",
    ),
    (
        "dev-1003",
        "SN-AX-202403",
        "Asset Tracker",
        "AT-4G",
        DeviceStatus::Inactive,
        "Warehouse B",
        "Awaiting redeployment",
    ),
];

/// Returns the seed set, all stamped with `now`.
pub fn seed_devices(now: DateTime<Utc>) -> Vec<DeviceInput> {
    SEED_DEVICES
        .iter()
        .map(|(id, serial, name, model, status, location, notes)| {
            DeviceInput::new(*serial, *name)
                .with_id(*id)
                .with_model(*model)
                .with_status(*status)
                .with_location(*location)
                .with_notes(*notes)
                .with_updated_at(now)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_batch;

    #[test]
    fn test_seed_set_is_valid_and_unique() {
        let seeds = seed_devices(Utc::now());
        assert_eq!(seeds.len(), 3);
        assert!(validate_batch(&seeds).is_ok());

        let mut ids: Vec<_> = seeds.iter().map(|s| s.ensure_id()).collect();
        let mut serials: Vec<_> = seeds.iter().map(|s| s.serial_number.clone()).collect();
        ids.sort();
        ids.dedup();
        serials.sort();
        serials.dedup();
        assert_eq!(ids.len(), 3);
        assert_eq!(serials.len(), 3);
    }
}
