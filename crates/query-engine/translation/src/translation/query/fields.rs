//! Handle the operators that shape the rows returned: `limit`, `select` and `values`.

use query_engine_rql::rql;

use super::attributes;
use super::operators::{self, Operator};
use super::values;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// `limit(count)` or `limit(count, offset)`. The count is capped by the configured maximum.
pub fn translate_limit(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    args: &[rql::Node],
) -> Result<(), Error> {
    let numbers = args
        .iter()
        .map(
            |arg| match values::resolve_value(env, state, table, Operator::Limit, arg)? {
                rql::Value::Integer(n) => u32::try_from(n).map_err(|_| {
                    Error::invalid_arguments(
                        Operator::Limit.name(),
                        format!("expected a non-negative integer, found {n}"),
                    )
                }),
                other => Err(Error::invalid_arguments(
                    Operator::Limit.name(),
                    format!("expected an integer, found {other}"),
                )),
            },
        )
        .collect::<Result<Vec<u32>, Error>>()?;

    let (limit, offset) = match numbers.as_slice() {
        [limit] => (*limit, None),
        [limit, offset] => (*limit, Some(*offset)),
        _ => {
            return Err(Error::invalid_arguments(
                Operator::Limit.name(),
                format!("expected 1 or 2 argument(s), found {}", numbers.len()),
            ))
        }
    };

    state.limit = Some(match env.defaults.max_limit {
        Some(max_limit) => limit.min(max_limit),
        None => limit,
    });
    if offset.is_some() {
        state.offset = offset;
    }
    Ok(())
}

/// `select(path, ...)`: return only these attributes.
pub fn translate_select(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    args: &[rql::Node],
) -> Result<(), Error> {
    let columns = args
        .iter()
        .map(|path| attributes::resolve(env, state, table, path).map(|a| a.output_column()))
        .collect::<Result<Vec<_>, Error>>()?;
    state.select = Some(columns);
    Ok(())
}

/// `values(path)`: return a flat list of one attribute.
pub fn translate_values(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    args: &[rql::Node],
) -> Result<(), Error> {
    let [path] = operators::expect_args::<1>(Operator::Values, args)?;
    let attribute = attributes::resolve(env, state, table, path)?;
    state.values = Some(attribute.output_column());
    Ok(())
}
