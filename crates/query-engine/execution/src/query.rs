//! Execute an execution plan against the database.

use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::Row;
use tracing::{info_span, Instrument};

use query_engine_rql::rql;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{ExecutionPlan, OutputColumn, OutputType};

use crate::error::{Error, QueryError};
use crate::metrics;
use crate::rows::{decode_row, decode_value, PaginationResult, QueryResult};

/// Which query runs for a plan and how its rows become a result. The first
/// terminal clause set wins, in the order of the variants.
enum Shape<'a> {
    Scalar,
    One(&'a [OutputColumn]),
    Values(&'a OutputColumn),
    Rows(&'a [OutputColumn]),
    Entities(&'a [OutputColumn]),
}

fn shape(plan: &ExecutionPlan) -> (sql::ast::Select, Shape<'_>) {
    if let Some(aggregate) = &plan.scalar {
        return (plan.scalar_select(aggregate), Shape::Scalar);
    }
    if plan.one {
        return (plan.entity_select(), Shape::One(&plan.entity_columns));
    }
    if let Some(column) = &plan.values {
        return (plan.values_select(column), Shape::Values(column));
    }
    match &plan.columns {
        Some(columns) if !columns.is_empty() => (
            plan.columns_select(columns, plan.group_by.as_deref()),
            Shape::Rows(columns),
        ),
        _ => (plan.entity_select(), Shape::Entities(&plan.entity_columns)),
    }
}

/// Execute a query against SQLite.
pub async fn execute(
    pool: &SqlitePool,
    metrics: &metrics::Metrics,
    plan: &ExecutionPlan,
) -> Result<QueryResult, Error> {
    let result = execute_plan(pool, plan)
        .instrument(info_span!(
            "Execute query",
            collection = plan.root_collection.as_str()
        ))
        .await;

    record(pool, metrics, result.as_ref());
    result
}

/// Execute a query and fetch the page around it: the total number of rows
/// without limit or offset, and RQL expressions for the pages before and after.
pub async fn paginate(
    pool: &SqlitePool,
    metrics: &metrics::Metrics,
    plan: &ExecutionPlan,
    expression: Option<&rql::Node>,
) -> Result<PaginationResult, Error> {
    let result = paginate_plan(pool, plan, expression)
        .instrument(info_span!(
            "Paginate query",
            collection = plan.root_collection.as_str()
        ))
        .await;

    record(
        pool,
        metrics,
        result.as_ref().map(|pagination| &pagination.page),
    );
    if result.is_ok() {
        metrics.pagination_total.inc();
    }
    result
}

/// The statement `execute` runs for a plan.
pub fn statement(plan: &ExecutionPlan) -> sql::string::SQL {
    let (select, _) = shape(plan);
    sql::execution_plan::select_to_sql(&select)
}

/// Render the query a plan would run, formatted, and ask SQLite how it would run it.
pub async fn explain(pool: &SqlitePool, plan: &ExecutionPlan) -> Result<(String, String), Error> {
    let query = statement(plan);

    let explain_sql = format!("EXPLAIN QUERY PLAN {}", query.sql);
    let rows: Vec<SqliteRow> = bind_params(sqlx::query(&explain_sql), &query.params)
        .fetch_all(pool)
        .instrument(info_span!("Explain query"))
        .await?;

    let mut details = vec![];
    for row in rows {
        let detail: String = row.try_get("detail")?;
        details.push(detail);
    }

    Ok((format_sql(&query.sql), details.join("\n")))
}

/// Pretty print an SQL query.
pub fn format_sql(sql: &str) -> String {
    sqlformat::format(
        sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}

fn record(pool: &SqlitePool, metrics: &metrics::Metrics, result: Result<&QueryResult, &Error>) {
    match result {
        Ok(query_result) => {
            metrics.query_total.inc();
            let row_count = query_result.row_count();
            metrics
                .query_rows_total
                .inc_by(u64::try_from(row_count).unwrap_or(u64::MAX));
        }
        Err(error) => {
            tracing::error!(%error, "Query failed");
            metrics.query_failures_total.inc();
        }
    }
    metrics::update_pool_metrics(pool, metrics);
}

async fn execute_plan(pool: &SqlitePool, plan: &ExecutionPlan) -> Result<QueryResult, Error> {
    let (select, output) = shape(plan);
    let rows = fetch(pool, &select).await?;

    let result = match output {
        Shape::Scalar => QueryResult::Scalar(match rows.first() {
            Some(row) => decode_value(row, 0, OutputType::Default)?,
            None => serde_json::Value::Null,
        }),
        Shape::One(columns) => match rows.as_slice() {
            [] => return Err(QueryError::NoResultFound.into()),
            [row] => QueryResult::Entities(vec![decode_row(row, columns)?]),
            _ => return Err(QueryError::MultipleResultsFound.into()),
        },
        Shape::Values(column) => QueryResult::Values(
            rows.iter()
                .map(|row| decode_value(row, 0, column.output_type))
                .collect::<Result<_, _>>()?,
        ),
        Shape::Rows(columns) => QueryResult::Rows(
            rows.iter()
                .map(|row| decode_row(row, columns))
                .collect::<Result<_, _>>()?,
        ),
        Shape::Entities(columns) => QueryResult::Entities(
            rows.iter()
                .map(|row| decode_row(row, columns))
                .collect::<Result<_, _>>()?,
        ),
    };
    Ok(result)
}

async fn paginate_plan(
    pool: &SqlitePool,
    plan: &ExecutionPlan,
    expression: Option<&rql::Node>,
) -> Result<PaginationResult, Error> {
    let limit = plan.limit().ok_or(QueryError::PaginationWithoutLimit)?;
    let offset = plan.offset().unwrap_or(0);

    let page = execute_plan(pool, plan).await?;

    let total = match fetch(pool, &plan.total_count_select()).await?.first() {
        Some(row) => row.try_get::<i64, _>(0)?,
        None => 0,
    };

    let next_offset = u64::from(offset) + u64::from(limit);
    let next_page = (i64::try_from(next_offset).unwrap_or(i64::MAX) < total)
        .then(|| page_link(expression, limit, next_offset));
    let previous_page = (offset > 0 && total > 0)
        .then(|| page_link(expression, limit, u64::from(offset.saturating_sub(limit))));

    Ok(PaginationResult {
        page,
        total,
        previous_page,
        next_page,
    })
}

/// The expression with its first `limit()` changed to the given page.
fn page_link(expression: Option<&rql::Node>, limit: u32, offset: u64) -> String {
    let args = vec![
        rql::Node::integer(i64::from(limit)),
        rql::Node::integer(i64::try_from(offset).unwrap_or(i64::MAX)),
    ];
    rql::unparse(&rql::rewrite(expression, "limit", args))
}

async fn fetch(pool: &SqlitePool, select: &sql::ast::Select) -> Result<Vec<SqliteRow>, Error> {
    let query = sql::execution_plan::select_to_sql(select);

    tracing::info!(
        generated_sql = query.sql.as_str(),
        params = ?&query.params,
    );

    let rows = build_query_with_params(&query).fetch_all(pool).await?;
    tracing::debug!(rows = rows.len(), "Fetched rows");
    Ok(rows)
}

/// Create a SQLx query based on our SQL query and bind our parameters to it.
fn build_query_with_params(
    query: &sql::string::SQL,
) -> sqlx::query::Query<'_, Sqlite, SqliteArguments<'_>> {
    bind_params(sqlx::query(query.sql.as_str()), &query.params)
}

fn bind_params<'a>(
    sqlx_query: sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>>,
    params: &'a [sql::string::Param],
) -> sqlx::query::Query<'a, Sqlite, SqliteArguments<'a>> {
    params
        .iter()
        .fold(sqlx_query, |sqlx_query, param| match param {
            sql::string::Param::String(s) => sqlx_query.bind(s.as_str()),
        })
}
