//! Handle the translation of literal values.

use chrono::{NaiveDate, NaiveTime};

use query_engine_rql::rql;
use query_engine_sql::sql;

use super::attributes::Attribute;
use super::operators::{self, Applied, Operator};
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// How dates and times are stored in text columns.
const DATE_FORMAT: &str = "%Y-%m-%d";
const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIME_FORMAT: &str = "%H:%M:%S%.f";

/// Convert an RQL value into a SQL value.
pub fn translate_value(value: &rql::Value) -> sql::ast::Value {
    match value {
        rql::Value::Null => sql::ast::Value::Null,
        rql::Value::Bool(b) => sql::ast::Value::Bool(*b),
        rql::Value::Integer(n) => sql::ast::Value::Int8(*n),
        rql::Value::Float(f) => sql::ast::Value::Float8(*f),
        rql::Value::Decimal(d) => sql::ast::Value::Numeric(d.to_string()),
        rql::Value::String(_)
        | rql::Value::Date(_)
        | rql::Value::DateTime(_)
        | rql::Value::Time(_) => sql::ast::Value::String(stringify(value)),
    }
}

/// The text form of a value, as `in`, `out` and the pattern operators compare it.
pub fn stringify(value: &rql::Value) -> String {
    match value {
        rql::Value::Null => "null".to_string(),
        rql::Value::Bool(b) => b.to_string(),
        rql::Value::Integer(n) => n.to_string(),
        rql::Value::Float(f) => format!("{f:?}"),
        rql::Value::Decimal(d) => d.to_string(),
        rql::Value::String(s) => s.clone(),
        rql::Value::Date(d) => d.format(DATE_FORMAT).to_string(),
        rql::Value::DateTime(dt) => dt.format(DATETIME_FORMAT).to_string(),
        rql::Value::Time(t) => t.format(TIME_FORMAT).to_string(),
    }
}

/// Resolve an argument to a value. Calls are applied and must produce one.
pub fn resolve_value(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    node: &rql::Node,
) -> Result<rql::Value, Error> {
    match node {
        rql::Node::Value(value) => Ok(value.clone()),
        rql::Node::Call(call) => match operators::apply(env, state, table, call)? {
            Applied::Value(value) => Ok(value),
            Applied::Predicate(_) | Applied::Nothing => Err(Error::invalid_arguments(
                operator.name(),
                format!("expected a value, found {node}"),
            )),
        },
        rql::Node::Tuple(_) | rql::Node::Signed(..) => Err(Error::invalid_arguments(
            operator.name(),
            format!("expected a value, found {node}"),
        )),
    }
}

/// Extract the SQL value of a JSON attribute so that it compares against
/// values of the given kind.
///
/// Strings and booleans compare as extracted, numbers are cast. Kinds
/// with no JSON counterpart are rejected in strict mode and otherwise
/// compared against the attribute as it is.
pub fn coerce_document(
    env: &Env,
    attribute: &Attribute,
    kind: rql::ValueKind,
) -> Result<sql::ast::Expression, Error> {
    let extracted = match &attribute.expression {
        path @ sql::ast::Expression::JsonPath { .. } => path.clone(),
        document => sql::ast::Expression::JsonPath {
            expression: Box::new(document.clone()),
            path: sql::ast::JsonPath { elements: vec![] },
            extract: sql::ast::JsonExtract::SqlValue,
        },
    };

    match kind {
        rql::ValueKind::Null | rql::ValueKind::Bool => Ok(extracted),
        rql::ValueKind::String => Ok(cast(extracted, "TEXT")),
        rql::ValueKind::Integer => Ok(cast(extracted, "INTEGER")),
        rql::ValueKind::Decimal => Ok(cast(extracted, "NUMERIC")),
        rql::ValueKind::Float => Ok(cast(extracted, "REAL")),
        rql::ValueKind::Date | rql::ValueKind::DateTime | rql::ValueKind::Time => {
            if env.defaults.strict_json_types {
                Err(Error::UncoercibleJsonValue(kind))
            } else {
                Ok(attribute.expression.clone())
            }
        }
    }
}

fn cast(expression: sql::ast::Expression, type_name: &str) -> sql::ast::Expression {
    sql::ast::Expression::Cast {
        expression: Box::new(expression),
        r#type: sql::ast::ScalarTypeName(type_name.to_string()),
    }
}

/// Build a time, date or datetime value from integer arguments:
/// `time(hour, minute, second)` with trailing parts optional,
/// `date(year, month, day)`, and `dt(year, month, day, hour, minute, second)`
/// with the time parts optional.
pub fn translate_temporal(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    operator: Operator,
    args: &[rql::Node],
) -> Result<rql::Value, Error> {
    let numbers = args
        .iter()
        .map(|arg| match resolve_value(env, state, table, operator, arg)? {
            rql::Value::Integer(n) => Ok(n),
            other => Err(Error::invalid_arguments(
                operator.name(),
                format!("expected an integer, found {other}"),
            )),
        })
        .collect::<Result<Vec<i64>, Error>>()?;

    let value = match (operator, numbers.as_slice()) {
        (Operator::Time, time) if time.len() <= 3 => time_of(time).map(rql::Value::Time),
        (Operator::Date, [year, month, day]) => {
            date_of(*year, *month, *day).map(rql::Value::Date)
        }
        (Operator::Dt, [year, month, day, time @ ..]) if time.len() <= 3 => {
            date_of(*year, *month, *day)
                .zip(time_of(time))
                .map(|(date, time)| rql::Value::DateTime(date.and_time(time)))
        }
        _ => {
            return Err(Error::invalid_arguments(
                operator.name(),
                format!("unexpected number of arguments: {}", numbers.len()),
            ))
        }
    };

    value.ok_or_else(|| Error::invalid_arguments(operator.name(), "arguments are out of range"))
}

fn date_of(year: i64, month: i64, day: i64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(
        year.try_into().ok()?,
        month.try_into().ok()?,
        day.try_into().ok()?,
    )
}

fn time_of(parts: &[i64]) -> Option<NaiveTime> {
    let part = |index: usize| u32::try_from(parts.get(index).copied().unwrap_or(0)).ok();
    NaiveTime::from_hms_opt(part(0)?, part(1)?, part(2)?)
}
