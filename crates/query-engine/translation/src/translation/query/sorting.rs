//! Translate `sort()` to an ORDER BY clause.

use query_engine_rql::rql;
use query_engine_sql::sql;

use super::attributes;
use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// Order by each argument in turn. A `-` prefix sorts descending, `+` or no
/// prefix ascending. A later `sort()` replaces an earlier one.
pub fn translate_sort(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    args: &[rql::Node],
) -> Result<(), Error> {
    let elements = args
        .iter()
        .map(|arg| {
            let (direction, path) = match arg {
                rql::Node::Signed(rql::Sign::Minus, path) => {
                    (sql::ast::OrderByDirection::Desc, path.as_ref())
                }
                rql::Node::Signed(rql::Sign::Plus, path) => {
                    (sql::ast::OrderByDirection::Asc, path.as_ref())
                }
                path => (sql::ast::OrderByDirection::Asc, path),
            };
            let attribute = attributes::resolve(env, state, table, path)?;
            Ok(sql::ast::OrderByElement {
                target: attribute.expression,
                direction,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    state.order_by = Some(elements);
    Ok(())
}
