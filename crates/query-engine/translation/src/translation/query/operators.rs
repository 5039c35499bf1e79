//! The operators an RQL expression may call, and the walk dispatching calls to them.

use enum_iterator::Sequence;

use query_engine_rql::rql;
use query_engine_sql::sql;

use super::{aggregates, fields, filtering, sorting, values};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// An operator of the query language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Sequence)]
pub enum Operator {
    And,
    Or,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    Out,
    Like,
    Contains,
    Excludes,
    Limit,
    Sort,
    Select,
    Values,
    Distinct,
    Sum,
    Mean,
    Max,
    Min,
    Count,
    First,
    One,
    Time,
    Date,
    Dt,
    Aggregate,
}

impl Operator {
    /// The name the operator is called by.
    pub fn name(self) -> &'static str {
        match self {
            Operator::And => "and",
            Operator::Or => "or",
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::In => "in",
            Operator::Out => "out",
            Operator::Like => "like",
            Operator::Contains => "contains",
            Operator::Excludes => "excludes",
            Operator::Limit => "limit",
            Operator::Sort => "sort",
            Operator::Select => "select",
            Operator::Values => "values",
            Operator::Distinct => "distinct",
            Operator::Sum => "sum",
            Operator::Mean => "mean",
            Operator::Max => "max",
            Operator::Min => "min",
            Operator::Count => "count",
            Operator::First => "first",
            Operator::One => "one",
            Operator::Time => "time",
            Operator::Date => "date",
            Operator::Dt => "dt",
            Operator::Aggregate => "aggregate",
        }
    }

    /// Look an operator up by name.
    pub fn from_name(name: &str) -> Option<Operator> {
        enum_iterator::all::<Operator>().find(|operator| operator.name() == name)
    }
}

/// What applying an operator produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A condition rows must satisfy.
    Predicate(sql::ast::Expression),
    /// A value, for use as an argument of the enclosing call.
    Value(rql::Value),
    /// Only the state changed.
    Nothing,
}

/// Walk an expression from its root, returning the filter it describes.
pub fn walk(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    node: &rql::Node,
) -> Result<Option<sql::ast::Expression>, Error> {
    filtering::translate_term(env, state, table, Operator::And, node)
}

/// Apply a call to the operator it names.
pub fn apply(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    call: &rql::Call,
) -> Result<Applied, Error> {
    let operator =
        Operator::from_name(&call.name).ok_or_else(|| Error::UnknownOperator(call.name.clone()))?;
    let args = call.args.as_slice();

    match operator {
        Operator::And | Operator::Or => {
            filtering::translate_connective(env, state, table, operator, args)
        }
        Operator::Eq => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::Equals,
            args,
        ),
        Operator::Ne => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::NotEquals,
            args,
        ),
        Operator::Lt => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::LessThan,
            args,
        ),
        Operator::Le => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::LessThanOrEqualTo,
            args,
        ),
        Operator::Gt => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::GreaterThan,
            args,
        ),
        Operator::Ge => filtering::translate_comparison(
            env,
            state,
            table,
            operator,
            sql::ast::BinaryOperator::GreaterThanOrEqualTo,
            args,
        ),
        Operator::In | Operator::Out => {
            filtering::translate_membership(env, state, table, operator, args)
        }
        Operator::Like | Operator::Contains | Operator::Excludes => {
            filtering::translate_pattern(env, state, table, operator, args)
        }
        Operator::Sort => {
            sorting::translate_sort(env, state, table, args).map(|()| Applied::Nothing)
        }
        Operator::Limit => {
            fields::translate_limit(env, state, table, args).map(|()| Applied::Nothing)
        }
        Operator::First => {
            state.limit = Some(1);
            Ok(Applied::Nothing)
        }
        Operator::One => {
            state.one = true;
            Ok(Applied::Nothing)
        }
        Operator::Distinct => {
            state.distinct = true;
            Ok(Applied::Nothing)
        }
        Operator::Select => {
            fields::translate_select(env, state, table, args).map(|()| Applied::Nothing)
        }
        Operator::Values => {
            fields::translate_values(env, state, table, args).map(|()| Applied::Nothing)
        }
        Operator::Sum | Operator::Mean | Operator::Max | Operator::Min | Operator::Count => {
            aggregates::translate_scalar(env, state, table, operator, args)
                .map(|()| Applied::Nothing)
        }
        Operator::Aggregate => {
            aggregates::translate_aggregate(env, state, table, args).map(|()| Applied::Nothing)
        }
        Operator::Time | Operator::Date | Operator::Dt => {
            values::translate_temporal(env, state, table, operator, args).map(Applied::Value)
        }
    }
}

/// Check an operator got exactly `N` arguments.
pub(crate) fn expect_args<const N: usize>(
    operator: Operator,
    args: &[rql::Node],
) -> Result<&[rql::Node; N], Error> {
    args.try_into().map_err(|_| {
        Error::invalid_arguments(
            operator.name(),
            format!("expected {N} argument(s), found {}", args.len()),
        )
    })
}
