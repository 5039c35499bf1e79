//! Transient state used by the command line.
//!
//! This is initialized once the configuration has been read.

use std::time::Duration;

use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_execution::metrics;
use rql_configuration::{Configuration, PoolSettings};

/// State for running queries.
#[derive(Clone)]
pub struct State {
    pub pool: SqlitePool,
    pub metrics: metrics::Metrics,
}

/// Create a connection pool and wrap it inside a State.
pub async fn create_state(
    configuration: &Configuration,
    metrics_registry: &mut prometheus::Registry,
) -> Result<State, InitializationError> {
    let pool = create_pool(&configuration.connection_uri, &configuration.pool_settings)
        .instrument(info_span!(
            "Create connection pool",
            max_connections = configuration.pool_settings.max_connections,
        ))
        .await
        .map_err(InitializationError::UnableToCreatePool)?;

    let metrics = async {
        let metrics_inner = metrics::initialise_metrics(metrics_registry)
            .map_err(InitializationError::MetricsError)?;
        metrics::update_pool_metrics(&pool, &metrics_inner);
        Ok(metrics_inner)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    Ok(State { pool, metrics })
}

/// Create a connection pool with our settings.
async fn create_pool(
    connection_uri: &str,
    pool_settings: &PoolSettings,
) -> Result<SqlitePool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .acquire_timeout(Duration::from_secs(pool_settings.pool_timeout))
        .idle_timeout(pool_settings.idle_timeout.map(Duration::from_secs))
        .max_lifetime(pool_settings.connection_lifetime.map(Duration::from_secs))
        .connect(connection_uri)
        .await
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(sqlx::Error),
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
}
