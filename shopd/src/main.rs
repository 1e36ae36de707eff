//! Shop Daemon
//!
//! Serves the order placement API.
//!
//! # Usage
//!
//! ```bash
//! # Start with default configuration (in-memory store)
//! cargo run -p shopd
//!
//! # Start against PostgreSQL
//! SHOP_STORE=postgres DATABASE_URL=postgres://... cargo run -p shopd --features postgres
//!
//! # Apply the schema / check it
//! cargo run -p shopd --features postgres -- db migrate
//! cargo run -p shopd --features postgres -- db status
//! ```
//!
//! # Environment Variables
//!
//! - `SHOP_ENV`: Environment (test, development, production)
//! - `SHOP_API_HOST`: API host (default: 0.0.0.0)
//! - `SHOP_API_PORT`: API port (default: 8080)
//! - `SHOP_STORE`: Store backend, `memory` or `postgres` (default: memory)
//! - `DATABASE_URL`: PostgreSQL connection string
//! - `SHOP_DB_MAX_CONNECTIONS`: Pool size (default: 5)
//! - `SHOP_LOG_FORMAT`: `pretty` or `json` (default: pretty)
//! - `RUST_LOG`: Log filter (default directive: shopd=info)

use shopd::{Config, Daemon, LogFormat, StoreBackend};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive("shopd=info".parse()?)
        .add_directive("shop_workflow=info".parse()?);

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry().with(filter).with(fmt::layer().json()).init()
        },
        LogFormat::Pretty => tracing_subscriber::registry().with(filter).with(fmt::layer()).init(),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;
    init_tracing(config.log_format)?;

    let args: Vec<String> = std::env::args().collect();
    if args.get(1).map(String::as_str) == Some("db") {
        #[cfg(feature = "postgres")]
        return shopd::db::run_db_command(&args).await;

        #[cfg(not(feature = "postgres"))]
        anyhow::bail!("db commands require the `postgres` feature");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        api_host = %config.api.host,
        api_port = config.api.port,
        store = %config.store.backend,
        "Shop daemon"
    );

    match config.store.backend {
        StoreBackend::Memory => Daemon::new_memory(config).run().await?,
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => Daemon::connect(config).await?.run().await?,
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            anyhow::bail!("SHOP_STORE=postgres requires the `postgres` feature")
        },
    }

    Ok(())
}
