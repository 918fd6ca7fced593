//! PostgreSQL test databases
//!
//! Every integration test gets its own throwaway container with the same
//! migrations the server runs, so tests never see each other's rows.

use infra_db::PostgresLedgerStore;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_PORT: u16 = 5432;
const POSTGRES_USER: &str = "ledger";
const POSTGRES_PASSWORD: &str = "ledger";
const POSTGRES_DB: &str = "ledger_test";

type SetupError = Box<dyn std::error::Error + Send + Sync>;

/// Connection URL for the test database on a mapped host port
pub fn test_database_url(host: &str, port: u16) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}",
        POSTGRES_USER, POSTGRES_PASSWORD, host, port, POSTGRES_DB
    )
}

/// A migrated PostgreSQL database living as long as its container
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pool: PgPool,
}

impl TestDatabase {
    /// Starts a container, connects and applies the migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the container fails to start, the pool cannot
    /// connect or a migration fails.
    pub async fn start() -> Result<Self, SetupError> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(POSTGRES_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr(
                "database system is ready to accept connections",
            ))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let host = container.get_host().await?.to_string();
        let port = container.get_host_port_ipv4(POSTGRES_PORT.tcp()).await?;

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&test_database_url(&host, port))
            .await?;
        infra_db::run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            pool,
        })
    }

    /// Raw pool, for tests that go around the store
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// A ledger store over this database
    pub fn ledger_store(&self) -> PostgresLedgerStore {
        PostgresLedgerStore::new(self.pool.clone())
    }
}

/// Starts a fresh database for a single test
pub async fn create_isolated_test_database() -> Result<TestDatabase, SetupError> {
    TestDatabase::start().await
}
