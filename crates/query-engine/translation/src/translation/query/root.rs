//! Compose the walked state into the query over the root collection.

use query_engine_metadata::metadata;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{ExecutionPlan, OutputColumn, OutputType};

use crate::translation::helpers::{Env, State, TableNameAndReference};

/// Build the entity query and the execution plan around it.
///
/// The limit is the first of: the expression's own `limit()`, the limit
/// passed by the caller, and the configured default.
pub fn compose(
    env: &Env,
    state: State,
    root: &TableNameAndReference,
    table: &metadata::TableInfo,
    limit: Option<u32>,
) -> ExecutionPlan {
    let entity_columns: Vec<OutputColumn> = table
        .columns
        .values()
        .map(|column| OutputColumn {
            alias: sql::helpers::make_column_alias(column.name.clone()),
            expression: root.column(&column.name),
            output_type: match column.r#type {
                metadata::ScalarType::Boolean => OutputType::Boolean,
                metadata::ScalarType::Json => OutputType::Json,
                _ => OutputType::Default,
            },
        })
        .collect();

    let mut select = sql::helpers::simple_select(
        entity_columns
            .iter()
            .map(|column| (column.alias.clone(), column.expression.clone()))
            .collect(),
    );
    select.from = Some(sql::ast::From::Table {
        reference: sql::ast::TableReference::DBTable {
            table: sql::ast::TableName(table.table_name.clone()),
        },
        alias: root.alias.clone(),
    });
    select.joins = state
        .joins()
        .cloned()
        .map(sql::ast::Join::LeftOuterJoin)
        .collect();
    if let Some(where_) = state.where_ {
        select.where_ = sql::ast::Where(where_);
    }
    if let Some(elements) = state.order_by {
        select.order_by = sql::ast::OrderBy { elements };
    }
    select.limit = sql::ast::Limit {
        limit: state.limit.or(limit).or(env.defaults.default_limit),
        offset: state.offset,
    };
    select.distinct = state.distinct;

    ExecutionPlan {
        root_collection: root.name.clone(),
        select,
        entity_columns,
        scalar: state.scalar,
        one: state.one,
        values: state.values,
        columns: state.select,
        group_by: state.group_by,
    }
}
