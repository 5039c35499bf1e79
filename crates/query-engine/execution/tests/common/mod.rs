use serde_json::Value;
use sqlx::SqlitePool;

use query_engine_execution::error::Error;
use query_engine_execution::metrics::{self, Metrics};
use query_engine_execution::query;
use query_engine_execution::rows::{PaginationResult, QueryResult};
use query_engine_translation::translation;
use rql_configuration::QueryDefaults;

/// A fresh fixture database with the metrics to run queries against it.
pub struct Fixture {
    pub pool: SqlitePool,
    pub metrics: Metrics,
    pub defaults: QueryDefaults,
}

impl Fixture {
    pub async fn new() -> Fixture {
        Fixture::with_defaults(QueryDefaults::default()).await
    }

    pub async fn with_defaults(defaults: QueryDefaults) -> Fixture {
        tests_common::init_logging();
        let pool = tests_common::database::fixture_pool().await.unwrap();
        let mut registry = prometheus::Registry::new();
        let metrics = metrics::initialise_metrics(&mut registry).unwrap();
        Fixture {
            pool,
            metrics,
            defaults,
        }
    }

    fn translate(&self, expression: &str) -> translation::query::ComposedQuery {
        let metadata = tests_common::metadata::metadata();
        let env = translation::helpers::Env::new(&metadata, &self.defaults);
        translation::query::translate(&env, &["user"], expression, None)
            .unwrap_or_else(|err| panic!("{expression}: {err}"))
    }

    /// Translate an expression over `user` and execute it.
    pub async fn run(&self, expression: &str) -> Result<QueryResult, Error> {
        let composed = self.translate(expression);
        query::execute(&self.pool, &self.metrics, &composed.plan).await
    }

    /// Translate an expression over `user` and fetch it as a page.
    pub async fn paginate(&self, expression: &str) -> Result<PaginationResult, Error> {
        let composed = self.translate(expression);
        query::paginate(
            &self.pool,
            &self.metrics,
            &composed.plan,
            composed.expression.as_ref(),
        )
        .await
    }

    /// Execute an expression that returns whole users, as JSON objects.
    pub async fn entities(&self, expression: &str) -> Vec<Value> {
        as_entities(self.run(expression).await.unwrap())
    }

    /// Execute an expression that returns selected columns, as JSON objects.
    pub async fn rows(&self, expression: &str) -> Vec<Value> {
        match self.run(expression).await.unwrap() {
            QueryResult::Rows(rows) => rows.into_iter().map(to_object).collect(),
            other => panic!("expected rows, got {other:?}"),
        }
    }

    pub async fn values(&self, expression: &str) -> Vec<Value> {
        match self.run(expression).await.unwrap() {
            QueryResult::Values(values) => values,
            other => panic!("expected values, got {other:?}"),
        }
    }

    pub async fn scalar(&self, expression: &str) -> Value {
        match self.run(expression).await.unwrap() {
            QueryResult::Scalar(value) => value,
            other => panic!("expected a scalar, got {other:?}"),
        }
    }
}

pub fn as_entities(result: QueryResult) -> Vec<Value> {
    match result {
        QueryResult::Entities(rows) => rows.into_iter().map(to_object).collect(),
        other => panic!("expected entities, got {other:?}"),
    }
}

fn to_object(row: query_engine_execution::rows::Row) -> Value {
    Value::Object(row.into_iter().collect())
}

/// The fixture's users as entity rows, in `user_id` order.
pub fn users() -> Vec<tests_common::database::User> {
    tests_common::database::users()
}

pub fn to_json<'a>(
    users: impl IntoIterator<Item = &'a tests_common::database::User>,
) -> Vec<Value> {
    users.into_iter().map(tests_common::database::User::to_json).collect()
}

pub fn assert_close(actual: &Value, expected: f64) {
    let actual = actual
        .as_f64()
        .unwrap_or_else(|| panic!("not a number: {actual}"));
    assert!(
        (actual - expected).abs() < 1e-6 * expected.abs().max(1.0),
        "{actual} is not close to {expected}"
    );
}
