//! Daemon configuration.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::error::{DaemonError, DaemonResult};
use std::env;
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Configuration
// =============================================================================

/// Daemon configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage backend configuration
    pub store: StoreConfig,

    /// Log output format
    pub log_format: LogFormat,

    /// Environment (test, development, production)
    pub environment: Environment,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,
    /// Port to bind to
    pub port: u16,
}

/// Storage backend configuration.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which store to run against
    pub backend: StoreBackend,
    /// PostgreSQL connection string (required for `postgres`)
    pub database_url: Option<String>,
    /// Connection pool size
    pub max_connections: u32,
}

/// Storage backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// In-process store; data is lost on exit
    Memory,
    /// PostgreSQL (requires the `postgres` feature)
    Postgres,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines
    Pretty,
    /// One JSON object per line
    Json,
}

/// Environment type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Test environment
    Test,
    /// Development environment
    Development,
    /// Production environment
    Production,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Every variable is optional except `DATABASE_URL` with the postgres
    /// store; unset variables take the [`Default`] value.
    pub fn from_env() -> DaemonResult<Self> {
        // Load .env file if present (ignore errors)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let store = StoreConfig {
            backend: env_or("SHOP_STORE", defaults.store.backend)?,
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.is_empty()),
            max_connections: env_or("SHOP_DB_MAX_CONNECTIONS", defaults.store.max_connections)?,
        };
        if store.max_connections == 0 {
            return Err(DaemonError::Config(
                "Invalid SHOP_DB_MAX_CONNECTIONS: 0. Expected at least 1".to_string(),
            ));
        }
        if store.backend == StoreBackend::Postgres && store.database_url.is_none() {
            return Err(DaemonError::Config(
                "DATABASE_URL is required when SHOP_STORE=postgres".to_string(),
            ));
        }

        Ok(Self {
            api: ApiConfig {
                host: env::var("SHOP_API_HOST").unwrap_or(defaults.api.host),
                port: env_or("SHOP_API_PORT", defaults.api.port)?,
            },
            store,
            log_format: env_or("SHOP_LOG_FORMAT", defaults.log_format)?,
            environment: env_or("SHOP_ENV", defaults.environment)?,
        })
    }

    /// Create test configuration.
    pub fn test() -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Let OS assign port
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 1,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Test,
        }
    }
}

/// Read `key` and parse it, or fall back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> DaemonResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| DaemonError::Config(format!("Invalid {}: {}. {}", key, raw, e))),
        Err(_) => Ok(default),
    }
}

impl FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "test" => Ok(Environment::Test),
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err("Expected: test, development, production".to_string()),
        }
    }
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "memory" | "mem" => Ok(StoreBackend::Memory),
            "postgres" | "pg" => Ok(StoreBackend::Postgres),
            _ => Err("Expected: memory, postgres".to_string()),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err("Expected: pretty, json".to_string()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            store: StoreConfig {
                backend: StoreBackend::Memory,
                database_url: None,
                max_connections: 5,
            },
            log_format: LogFormat::Pretty,
            environment: Environment::Development,
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Test => write!(f, "test"),
            Environment::Development => write!(f, "development"),
            Environment::Production => write!(f, "production"),
        }
    }
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Memory => write!(f, "memory"),
            StoreBackend::Postgres => write!(f, "postgres"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.api.port, 8080);
        assert_eq!(config.api.host, "0.0.0.0");
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.max_connections, 5);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_test_config() {
        let config = Config::test();

        assert_eq!(config.api.port, 0);
        assert_eq!(config.environment, Environment::Test);
        assert!(config.store.database_url.is_none());
    }

    #[test]
    fn test_parse_settings() {
        assert_eq!("PROD".parse::<Environment>(), Ok(Environment::Production));
        assert_eq!("dev".parse::<Environment>(), Ok(Environment::Development));
        assert!("staging".parse::<Environment>().is_err());

        assert_eq!("pg".parse::<StoreBackend>(), Ok(StoreBackend::Postgres));
        assert_eq!("Memory".parse::<StoreBackend>(), Ok(StoreBackend::Memory));
        assert!("sqlite".parse::<StoreBackend>().is_err());

        assert_eq!("json".parse::<LogFormat>(), Ok(LogFormat::Json));
        assert_eq!("text".parse::<LogFormat>(), Ok(LogFormat::Pretty));
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_env_or_falls_back_when_unset() {
        let port: u16 = env_or("SHOP_TEST_UNSET_PORT", 8080).unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_display() {
        assert_eq!(Environment::Test.to_string(), "test");
        assert_eq!(Environment::Development.to_string(), "development");
        assert_eq!(Environment::Production.to_string(), "production");
        assert_eq!(StoreBackend::Postgres.to_string(), "postgres");
    }
}
