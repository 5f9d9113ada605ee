//! # SQLite Backend
//!
//! The production backend: a sqlx `SqlitePool` over the app's database file.
//!
//! ## Write Path
//! ```text
//! write(batch)
//!   │
//!   ├── BEGIN                           (pool.begin())
//!   ├── DELETE FROM devices             (Replace only)
//!   ├── INSERT ... ON CONFLICT DO UPDATE   × N rows
//!   └── COMMIT
//!
//! Any error before COMMIT drops the transaction → ROLLBACK.
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::SqlitePool;
use tracing::{debug, info};

use asset_core::{format_timestamp, ConflictKey, DeviceRecord, RawDeviceRow};

use super::{escape_like, BackendStatus, Connector, InventoryBackend, WriteBatch, WriteMode};
use crate::error::DbResult;
use crate::migrations;
use crate::pool::{open_pool, DbConfig};

// =============================================================================
// SQL
// =============================================================================

const SELECT_ALL: &str = r#"
    SELECT id, serial_number, name, model, status, location, notes, updated_at
    FROM devices
    ORDER BY updated_at DESC, id ASC
"#;

const SELECT_BY_SERIAL: &str = r#"
    SELECT id, serial_number, name, model, status, location, notes, updated_at
    FROM devices
    WHERE LOWER(serial_number) LIKE ?1 ESCAPE '\'
    ORDER BY updated_at DESC, id ASC
"#;

const SELECT_BY_ID: &str = r#"
    SELECT id, serial_number, name, model, status, location, notes, updated_at
    FROM devices
    WHERE id = ?1
"#;

const UPSERT_BY_ID: &str = r#"
    INSERT INTO devices (id, serial_number, name, model, status, location, notes, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(id) DO UPDATE SET
        serial_number = excluded.serial_number,
        name = excluded.name,
        model = excluded.model,
        status = excluded.status,
        location = excluded.location,
        notes = excluded.notes,
        updated_at = excluded.updated_at
"#;

const UPSERT_BY_SERIAL: &str = r#"
    INSERT INTO devices (id, serial_number, name, model, status, location, notes, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    ON CONFLICT(serial_number) DO UPDATE SET
        id = excluded.id,
        name = excluded.name,
        model = excluded.model,
        status = excluded.status,
        location = excluded.location,
        notes = excluded.notes,
        updated_at = excluded.updated_at
"#;

// =============================================================================
// Connector
// =============================================================================

/// Opens [`SqliteBackend`]s for a [`DbConfig`].
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    config: DbConfig,
}

impl SqliteConnector {
    pub fn new(config: DbConfig) -> Self {
        SqliteConnector { config }
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }
}

#[async_trait]
impl Connector for SqliteConnector {
    async fn connect(&self) -> DbResult<Arc<dyn InventoryBackend>> {
        let pool = open_pool(&self.config).await?;
        Ok(Arc::new(SqliteBackend::new(pool, self.config.run_migrations)))
    }

    fn describe(&self) -> String {
        format!("sqlite:{}", self.config.database_path.display())
    }
}

// =============================================================================
// Backend
// =============================================================================

/// Inventory backend over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    run_migrations: bool,
}

impl SqliteBackend {
    pub fn new(pool: SqlitePool, run_migrations: bool) -> Self {
        SqliteBackend {
            pool,
            run_migrations,
        }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    fn decode_rows(rows: Vec<RawDeviceRow>) -> DbResult<Vec<DeviceRecord>> {
        rows.into_iter()
            .map(|row| DeviceRecord::decode(row).map_err(Into::into))
            .collect()
    }
}

#[async_trait]
impl InventoryBackend for SqliteBackend {
    async fn prepare_schema(&self) -> DbResult<()> {
        if !self.run_migrations {
            debug!("Migrations disabled, assuming schema is current");
            return Ok(());
        }
        migrations::run_migrations(&self.pool).await
    }

    async fn count(&self) -> DbResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM devices")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    async fn fetch_all(&self) -> DbResult<Vec<DeviceRecord>> {
        let rows = sqlx::query_as::<_, RawDeviceRow>(SELECT_ALL)
            .fetch_all(&self.pool)
            .await?;
        Self::decode_rows(rows)
    }

    async fn search_serial(&self, needle: &str) -> DbResult<Vec<DeviceRecord>> {
        let pattern = format!("%{}%", escape_like(needle));

        let rows = sqlx::query_as::<_, RawDeviceRow>(SELECT_BY_SERIAL)
            .bind(pattern)
            .fetch_all(&self.pool)
            .await?;

        debug!(needle, results = rows.len(), "Serial search complete");
        Self::decode_rows(rows)
    }

    async fn get_by_id(&self, id: &str) -> DbResult<Option<DeviceRecord>> {
        let row = sqlx::query_as::<_, RawDeviceRow>(SELECT_BY_ID)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| DeviceRecord::decode(row).map_err(Into::into))
            .transpose()
    }

    async fn write(&self, batch: WriteBatch) -> DbResult<()> {
        let sql = match batch.mode.conflict_key() {
            ConflictKey::Id => UPSERT_BY_ID,
            ConflictKey::SerialNumber => UPSERT_BY_SERIAL,
        };

        // Dropped without commit on any early return → rolled back
        let mut tx = self.pool.begin().await?;

        if batch.mode == WriteMode::Replace {
            let removed = sqlx::query("DELETE FROM devices")
                .execute(&mut *tx)
                .await?
                .rows_affected();
            debug!(removed, "Cleared devices for replace");
        }

        for record in &batch.records {
            let updated_at = format_timestamp(&record.updated_at);
            sqlx::query(sql)
                .bind(record.id.as_str())
                .bind(record.serial_number.as_str())
                .bind(record.name.as_str())
                .bind(record.model.as_str())
                .bind(record.status.as_str())
                .bind(record.location.as_deref())
                .bind(record.notes.as_deref())
                .bind(updated_at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(rows = batch.len(), mode = ?batch.mode, "Batch committed");
        Ok(())
    }

    async fn status(&self) -> DbResult<BackendStatus> {
        let device_count = self.count().await?;
        let (migrations_total, migrations_applied) =
            migrations::migration_status(&self.pool).await?;

        Ok(BackendStatus {
            kind: "sqlite",
            device_count,
            migrations_total,
            migrations_applied,
        })
    }

    async fn close(&self) {
        if !self.pool.is_closed() {
            info!("Closing database connection pool");
            self.pool.close().await;
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
