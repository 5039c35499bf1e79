//! Metrics setup and update for query execution.

use prometheus::core::{AtomicF64, AtomicI64, AtomicU64, GenericCounter, GenericGauge};

#[derive(Debug, Clone)]
pub struct Metrics {
    pub query_total: GenericCounter<AtomicU64>,
    pub pagination_total: GenericCounter<AtomicU64>,
    pub query_failures_total: GenericCounter<AtomicU64>,
    pub query_rows_total: GenericCounter<AtomicU64>,
    pub pool_size: GenericGauge<AtomicI64>,
    pub pool_idle_count: GenericGauge<AtomicI64>,
    pub pool_max_connections: GenericGauge<AtomicI64>,
    pub pool_acquire_timeout: GenericGauge<AtomicF64>,
}

/// Create a new int counter metric and register it with the provided Prometheus Registry
fn add_int_counter_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericCounter<AtomicU64>, prometheus::Error> {
    let int_counter =
        prometheus::IntCounter::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_counter.clone()))?;
    Ok(int_counter)
}

/// Create a new int gauge metric and register it with the provided Prometheus Registry
fn add_int_gauge_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicI64>, prometheus::Error> {
    let int_gauge =
        prometheus::IntGauge::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(int_gauge.clone()))?;
    Ok(int_gauge)
}

/// Create a new gauge metric and register it with the provided Prometheus Registry
fn add_gauge_metric(
    metrics_registry: &mut prometheus::Registry,
    metric_name: &str,
    metric_description: &str,
) -> Result<GenericGauge<AtomicF64>, prometheus::Error> {
    let gauge =
        prometheus::Gauge::with_opts(prometheus::Opts::new(metric_name, metric_description))?;
    metrics_registry.register(Box::new(gauge.clone()))?;
    Ok(gauge)
}

/// Setup counters and gauges used to produce Prometheus metrics
pub fn initialise_metrics(
    metrics_registry: &mut prometheus::Registry,
) -> Result<Metrics, prometheus::Error> {
    let query_total =
        add_int_counter_metric(metrics_registry, "rql_query_total", "Total successful queries.")?;

    let pagination_total = add_int_counter_metric(
        metrics_registry,
        "rql_pagination_total",
        "Total successful paginated queries.",
    )?;

    let query_failures_total = add_int_counter_metric(
        metrics_registry,
        "rql_query_failures_total",
        "Total queries that failed to execute.",
    )?;

    let query_rows_total = add_int_counter_metric(
        metrics_registry,
        "rql_query_rows_total",
        "Total rows returned by successful queries.",
    )?;

    let pool_size = add_int_gauge_metric(
        metrics_registry,
        "rql_pool_size",
        "The number of connections currently active. This includes idle connections.",
    )?;

    let pool_idle_count = add_int_gauge_metric(
        metrics_registry,
        "rql_pool_idle",
        "The number of connections active and idle (not in use).",
    )?;

    let pool_max_connections = add_int_gauge_metric(
        metrics_registry,
        "rql_pool_max_connections",
        "The maximum number of connections that this pool should maintain.",
    )?;

    let pool_acquire_timeout = add_gauge_metric(
        metrics_registry,
        "rql_pool_acquire_timeout",
        "Get the maximum amount of time to spend waiting for a connection, in seconds.",
    )?;

    Ok(Metrics {
        query_total,
        pagination_total,
        query_failures_total,
        query_rows_total,
        pool_size,
        pool_idle_count,
        pool_max_connections,
        pool_acquire_timeout,
    })
}

// update all Prometheus gauges describing the pool
pub fn update_pool_metrics(pool: &sqlx::SqlitePool, metrics: &Metrics) {
    let pool_size: i64 = pool.size().into();
    metrics.pool_size.set(pool_size);

    let pool_idle: i64 = pool.num_idle().try_into().unwrap_or(i64::MAX);
    metrics.pool_idle_count.set(pool_idle);

    let pool_options = pool.options();

    let max_connections: i64 = pool_options.get_max_connections().into();
    metrics.pool_max_connections.set(max_connections);

    let acquire_timeout: f64 = pool_options.get_acquire_timeout().as_secs_f64();
    metrics.pool_acquire_timeout.set(acquire_timeout);
}
