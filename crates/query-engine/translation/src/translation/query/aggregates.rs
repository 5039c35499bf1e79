//! Handle aggregates: over the whole row set, and per group with `aggregate()`.

use query_engine_rql::rql;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{OutputColumn, OutputType, ScalarAggregate};

use super::attributes;
use super::operators::{self, Operator};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// `sum`, `mean`, `max`, `min` and `count`: reduce the query to a single value.
/// `count` counts the rows and ignores its arguments.
pub fn translate_scalar(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    args: &[rql::Node],
) -> Result<(), Error> {
    let aggregate = if operator == Operator::Count {
        ScalarAggregate::Count
    } else {
        let [path] = operators::expect_args::<1>(operator, args)?;
        let (function, argument) = translate_function(env, state, table, operator, path)?;
        ScalarAggregate::Function { function, argument }
    };
    state.scalar = Some(aggregate);
    Ok(())
}

/// `aggregate(path, ..., function(path), ...)`: group by the bare paths and
/// compute each function per group. Functions are labelled by their name.
pub fn translate_aggregate(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    args: &[rql::Node],
) -> Result<(), Error> {
    let mut group_by = vec![];
    let mut columns = vec![];
    let mut aggregates = vec![];

    for arg in args {
        match arg {
            rql::Node::Call(call) => {
                let operator = Operator::from_name(&call.name)
                    .ok_or_else(|| Error::UnknownOperator(call.name.clone()))?;
                let expression = match (operator, call.args.as_slice()) {
                    (Operator::Count, []) => {
                        sql::ast::Expression::Count(sql::ast::CountType::Star)
                    }
                    (_, [path]) => {
                        let (function, argument) =
                            translate_function(env, state, table, operator, path)?;
                        sql::ast::Expression::FunctionCall {
                            function,
                            args: vec![argument],
                        }
                    }
                    (_, args) => {
                        return Err(Error::invalid_arguments(
                            operator.name(),
                            format!("expected 1 argument(s), found {}", args.len()),
                        ))
                    }
                };
                aggregates.push(OutputColumn {
                    alias: sql::helpers::make_column_alias(call.name.clone()),
                    expression,
                    output_type: OutputType::Default,
                });
            }
            path => {
                let column = attributes::resolve(env, state, table, path)?.output_column();
                group_by.push(column.expression.clone());
                columns.push(column);
            }
        }
    }

    columns.extend(aggregates);
    state.group_by = Some(group_by);
    state.select = Some(columns);
    Ok(())
}

/// The SQL function for an aggregate operator, and the argument it applies to.
fn translate_function(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    path: &rql::Node,
) -> Result<(sql::ast::Function, sql::ast::Expression), Error> {
    let function = match operator {
        Operator::Sum => sql::ast::Function::Sum,
        Operator::Mean => sql::ast::Function::Avg,
        Operator::Max => sql::ast::Function::Max,
        Operator::Min => sql::ast::Function::Min,
        Operator::Count => sql::ast::Function::Count,
        other => {
            return Err(Error::invalid_arguments(
                Operator::Aggregate.name(),
                format!("{}() is not an aggregate function", other.name()),
            ))
        }
    };

    let attribute = attributes::resolve(env, state, table, path)?;
    if attribute.is_document()
        && matches!(operator, Operator::Sum | Operator::Mean)
        && env.defaults.strict_json_types
    {
        return Err(Error::UntypedJsonAggregate(operator.name().to_string()));
    }

    Ok((function, attribute.expression))
}
