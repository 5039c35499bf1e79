//! Handle filtering/where clauses translation.

use query_engine_rql::rql;
use query_engine_sql::sql;

use super::attributes;
use super::operators::{self, Applied, Operator};
use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// Translate a query term: a call that produces a condition, or one that only changes the state.
pub fn translate_term(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    node: &rql::Node,
) -> Result<Option<sql::ast::Expression>, Error> {
    match node {
        rql::Node::Call(call) => match operators::apply(env, state, table, call)? {
            Applied::Predicate(predicate) => Ok(Some(predicate)),
            Applied::Nothing => Ok(None),
            Applied::Value(value) => Err(Error::invalid_arguments(
                operator.name(),
                format!("expected a query term, found the value {value}"),
            )),
        },
        other => Err(Error::invalid_arguments(
            operator.name(),
            format!("expected a query term, found {other}"),
        )),
    }
}

/// Combine the conditions of the arguments with AND or OR.
/// Terms that only change the state do not take part.
pub fn translate_connective(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    args: &[rql::Node],
) -> Result<Applied, Error> {
    let mut predicates = vec![];
    for arg in args {
        if let Some(predicate) = translate_term(env, state, table, operator, arg)? {
            predicates.push(predicate);
        }
    }

    let combined = if operator == Operator::Or {
        sql::helpers::disjunction(predicates)
    } else {
        sql::helpers::conjunction(predicates)
    };
    Ok(combined.map_or(Applied::Nothing, Applied::Predicate))
}

/// Compare an attribute with a value. Equality with null tests for null.
pub fn translate_comparison(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    binary_operator: sql::ast::BinaryOperator,
    args: &[rql::Node],
) -> Result<Applied, Error> {
    let [path, value] = operators::expect_args::<2>(operator, args)?;
    let attribute = attributes::resolve(env, state, table, path)?;
    let value = values::resolve_value(env, state, table, operator, value)?;

    let left = if attribute.is_document() {
        values::coerce_document(env, &attribute, value.kind())?
    } else {
        attribute.expression
    };

    let predicate = match (binary_operator, &value) {
        (sql::ast::BinaryOperator::Equals, rql::Value::Null) => {
            sql::ast::Expression::UnaryOperation {
                expression: Box::new(left),
                operator: sql::ast::UnaryOperator::IsNull,
            }
        }
        (sql::ast::BinaryOperator::NotEquals, rql::Value::Null) => {
            sql::ast::Expression::UnaryOperation {
                expression: Box::new(left),
                operator: sql::ast::UnaryOperator::IsNotNull,
            }
        }
        _ => sql::ast::Expression::BinaryOperation {
            left: Box::new(left),
            operator: binary_operator,
            right: Box::new(sql::ast::Expression::Value(values::translate_value(&value))),
        },
    };
    Ok(Applied::Predicate(predicate))
}

/// Test an attribute for membership in a list of values, compared as text.
pub fn translate_membership(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    args: &[rql::Node],
) -> Result<Applied, Error> {
    let [path, candidates] = operators::expect_args::<2>(operator, args)?;
    let attribute = attributes::resolve(env, state, table, path)?;
    let candidates = match candidates {
        rql::Node::Tuple(items) => items
            .iter()
            .map(|item| values::resolve_value(env, state, table, operator, item))
            .collect::<Result<Vec<_>, Error>>()?,
        single => vec![values::resolve_value(env, state, table, operator, single)?],
    };

    let left = if attribute.is_document() {
        values::coerce_document(env, &attribute, rql::ValueKind::String)?
    } else {
        attribute.expression
    };

    let membership = sql::ast::Expression::BinaryArrayOperation {
        left: Box::new(left),
        operator: sql::ast::BinaryArrayOperator::In,
        right: candidates
            .iter()
            .map(|candidate| {
                sql::ast::Expression::Value(sql::ast::Value::String(values::stringify(candidate)))
            })
            .collect(),
    };

    Ok(Applied::Predicate(if operator == Operator::Out {
        sql::ast::Expression::Not(Box::new(membership))
    } else {
        membership
    }))
}

/// Match an attribute against a pattern. `like` takes `*` as a wildcard,
/// `contains` and `excludes` look for the value anywhere in the text.
pub fn translate_pattern(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    args: &[rql::Node],
) -> Result<Applied, Error> {
    let [path, value] = operators::expect_args::<2>(operator, args)?;
    let attribute = attributes::resolve(env, state, table, path)?;
    let text = values::stringify(&values::resolve_value(env, state, table, operator, value)?);

    let (binary_operator, pattern) = match operator {
        Operator::Contains => (sql::ast::BinaryOperator::Like, format!("%{text}%")),
        Operator::Excludes => (sql::ast::BinaryOperator::NotLike, format!("%{text}%")),
        _ => (sql::ast::BinaryOperator::Like, text.replace('*', "%")),
    };

    let left = if attribute.is_document() {
        values::coerce_document(env, &attribute, rql::ValueKind::String)?
    } else {
        attribute.expression
    };

    Ok(Applied::Predicate(sql::ast::Expression::BinaryOperation {
        left: Box::new(left),
        operator: binary_operator,
        right: Box::new(sql::ast::Expression::Value(sql::ast::Value::String(pattern))),
    }))
}
