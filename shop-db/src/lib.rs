//! Database lifecycle management for the shop.
//!
//! Provides schema bootstrap and a status report.

use sqlx::{PgPool, Row};
use tracing::{info, warn};

/// Result type for DB operations.
pub type Result<T> = std::result::Result<T, anyhow::Error>;

/// Tables owned by the shop schema.
pub const SHOP_TABLES: [&str; 3] = ["users", "products", "orders"];

/// One row of `_sqlx_migrations`.
#[derive(Debug, Clone)]
pub struct AppliedMigration {
    pub version: i64,
    pub description: String,
    pub success: bool,
}

/// Snapshot of the database as seen by `shopd db status`.
#[derive(Debug, Clone, Default)]
pub struct DbStatus {
    /// Applied migrations, newest first. Empty if the schema was never migrated.
    pub migrations: Vec<AppliedMigration>,
    /// `(table, rows not soft-deleted)` for each shop table that exists.
    pub live_rows: Vec<(&'static str, i64)>,
}

impl DbStatus {
    /// True once at least one migration ran and none of them failed.
    pub fn is_migrated(&self) -> bool {
        !self.migrations.is_empty() && self.migrations.iter().all(|m| m.success)
    }
}

/// Apply the bootstrap schema.
///
/// Uses sqlx migrations from the workspace `migrations` directory.
/// Idempotent: safe to run multiple times.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Applying shop schema");
    sqlx::migrate!("../migrations").run(pool).await?;
    info!("Shop schema is up to date");
    Ok(())
}

async fn table_exists(pool: &PgPool, table: &str) -> Result<bool> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (SELECT 1 FROM information_schema.tables WHERE table_name = $1)",
    )
    .bind(table)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

/// Check connectivity and report schema status.
///
/// Fails only when the database is unreachable. A database that was never
/// migrated yields an empty report and a warning.
pub async fn status(pool: &PgPool) -> Result<DbStatus> {
    sqlx::query("SELECT 1").execute(pool).await?;
    info!("Database reachable");

    let mut report = DbStatus::default();

    if !table_exists(pool, "_sqlx_migrations").await? {
        warn!("Schema not initialized, run `shopd db migrate`");
        return Ok(report);
    }

    let rows = sqlx::query(
        "SELECT version, description, success FROM _sqlx_migrations ORDER BY version DESC",
    )
    .fetch_all(pool)
    .await?;

    for row in rows {
        let migration = AppliedMigration {
            version: row.try_get("version")?,
            description: row.try_get("description")?,
            success: row.try_get("success")?,
        };
        info!(
            version = migration.version,
            description = %migration.description,
            success = migration.success,
            "Migration"
        );
        report.migrations.push(migration);
    }

    for table in SHOP_TABLES {
        if !table_exists(pool, table).await? {
            warn!(table, "Table missing");
            continue;
        }
        let sql = format!("SELECT COUNT(*) FROM {} WHERE deleted_at IS NULL", table);
        let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
        info!(table, live_rows = count, "Table status");
        report.live_rows.push((table, count));
    }

    Ok(report)
}
