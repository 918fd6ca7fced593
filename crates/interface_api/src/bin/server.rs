//! Ledger API Server Binary
//!
//! This binary starts the HTTP API server for the general ledger.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin ledger-api
//!
//! # Run with environment variables
//! LEDGER_PORT=8080 DATABASE_URL=postgres://... cargo run --bin ledger-api
//! ```
//!
//! # Environment Variables
//!
//! * `LEDGER_HOST` - Server host (default: 0.0.0.0)
//! * `LEDGER_PORT` - Server port (default: 8080)
//! * `LEDGER_DATABASE_URL` or `DATABASE_URL` - PostgreSQL connection string
//! * `LEDGER_MAX_CONNECTIONS` / `LEDGER_MIN_CONNECTIONS` - Pool size
//! * `LEDGER_LOG_LEVEL` - Log level when `RUST_LOG` is unset (default: info)
//! * `LEDGER_ENGINE__BATCH_TIMEOUT_SECS` - Opening batch timeout (default: 30)
//! * `LEDGER_ENGINE__SEED_STANDARD_CHART` - Seed the standard chart at startup
//! * `LEDGER_ENGINE__SYSTEM_ACCOUNTS__OPENING_EQUITY` and friends - System account codes

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_ledger::LedgerService;
use infra_db::{create_pool, run_migrations, PostgresLedgerStore};
use interface_api::{config::ApiConfig, create_router};

/// Main entry point for the API server.
///
/// Initializes logging, loads configuration, connects and migrates the
/// database, optionally seeds the chart of accounts and starts the HTTP
/// server.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("invalid configuration")?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting ledger API server"
    );

    let pool = create_pool(config.database())
        .await
        .context("failed to connect to the database")?;
    run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    let store = Arc::new(PostgresLedgerStore::new(pool));
    let service = LedgerService::new(store, config.engine.clone());

    if config.engine.seed_standard_chart {
        let created = service
            .seed_standard_chart()
            .await
            .context("failed to seed the chart of accounts")?;
        tracing::info!(created, "Chart of accounts ready");
    }

    let app = create_router(Arc::new(service));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::error!(%error, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!(%error, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
