//! API configuration
//!
//! Values come from `LEDGER_`-prefixed environment variables; nested keys use
//! a double underscore, e.g. `LEDGER_ENGINE__BATCH_TIMEOUT_SECS=10`. A plain
//! `DATABASE_URL` is honoured when `LEDGER_DATABASE_URL` is absent.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

use domain_ledger::LedgerConfig;
use infra_db::{DatabaseConfig, DEFAULT_DATABASE_URL};

const ENV_PREFIX: &str = "LEDGER";

/// API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Database URL
    pub database_url: String,
    /// Maximum pooled connections
    pub max_connections: u32,
    /// Connections kept open when idle
    pub min_connections: u32,
    /// Log level used when `RUST_LOG` is unset
    pub log_level: String,
    /// Ledger engine settings
    pub engine: LedgerConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            max_connections: 10,
            min_connections: 2,
            log_level: "info".to_string(),
            engine: LedgerConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Loads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::with_prefix(ENV_PREFIX), std::env::var("DATABASE_URL").ok())
    }

    /// Loads configuration from an environment source
    ///
    /// `fallback_database_url` is used only when the source sets no
    /// database URL.
    pub fn from_environment(
        environment: Environment,
        fallback_database_url: Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(url) = fallback_database_url {
            builder = builder.set_default("database_url", url)?;
        }

        builder
            .add_source(
                environment
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Pool settings for the configured database
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig::new(self.database_url.clone())
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
    }
}
