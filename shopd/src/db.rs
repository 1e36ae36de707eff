//! Database CLI subcommands for shopd.
//!
//! Provides `db migrate` and `db status` commands.

use anyhow::{anyhow, Result};
use std::env;

use shop_db::{migrate, status};

/// Run database CLI subcommands.
///
/// Supported commands:
/// - `shopd db migrate` - Apply the bootstrap schema
/// - `shopd db status` - Check connectivity and schema status
pub async fn run_db_command(args: &[String]) -> Result<()> {
    let command = args.get(2).ok_or_else(|| anyhow!("Usage: shopd db <migrate|status>"))?;

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| anyhow!("DATABASE_URL environment variable is required for db commands"))?;

    let pool = sqlx::PgPool::connect(&database_url).await?;

    match command.as_str() {
        "migrate" => migrate(&pool).await?,
        "status" => {
            let report = status(&pool).await?;
            if !report.is_migrated() {
                return Err(anyhow!("Schema is not fully migrated"));
            }
        },
        other => {
            return Err(anyhow!("Unknown db command: {}. Use migrate or status", other));
        },
    }

    Ok(())
}
