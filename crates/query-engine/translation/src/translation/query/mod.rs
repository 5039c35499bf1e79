//! Translate an RQL expression over a root collection to an execution plan.

pub mod aggregates;
pub mod attributes;
pub mod fields;
pub mod filtering;
pub mod operators;
pub mod root;
pub mod sorting;
pub mod values;

use query_engine_rql::rql;
use query_engine_sql::sql;

use super::error::Error;
use super::helpers::{Env, State, TableNameAndReference};

/// A composed query together with the expression it was built from.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedQuery {
    pub plan: sql::execution_plan::ExecutionPlan,
    /// The parsed expression, kept to build pagination links.
    pub expression: Option<rql::Node>,
}

/// Translate an RQL expression selecting from the given collections.
///
/// Exactly one collection must be given. `limit` applies when the expression
/// has no `limit()` of its own, and takes precedence over the configured default.
pub fn translate(
    env: &Env,
    collections: &[&str],
    expression: &str,
    limit: Option<u32>,
) -> Result<ComposedQuery, Error> {
    let [collection] = collections else {
        return Err(Error::UnsupportedEntityCount(collections.len()));
    };
    let table = env.lookup_table(collection)?;
    let expression = rql::parse(expression)?;

    let root_table = TableNameAndReference::root(collection);
    let mut state = State::new();
    if let Some(node) = &expression {
        state.where_ = operators::walk(env, &mut state, &root_table, node)?;
    }

    let plan = root::compose(env, state, &root_table, table, limit);
    tracing::debug!(
        collection = %collection,
        sql = %plan.query_sql().sql,
        "Composed RQL query"
    );

    Ok(ComposedQuery { plan, expression })
}
