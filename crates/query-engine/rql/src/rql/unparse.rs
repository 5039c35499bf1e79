//! Serialize expression trees back to RQL text.

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};

use super::node::{Node, Sign, Value};
use super::values::{self, DATETIME_FORMAT, DATE_FORMAT, TIME_FORMAT};

/// Characters that would change the meaning of a word if written as is.
const RESERVED: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'\'')
    .add(b'(')
    .add(b')')
    .add(b'+')
    .add(b',')
    .add(b'=')
    .add(b'|');

/// Render a tree as RQL text that parses back to the same tree.
pub fn unparse(node: &Node) -> String {
    node.to_string()
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Call(call) => {
                write!(f, "{}(", call.name)?;
                write_list(f, &call.args)?;
                write!(f, ")")
            }
            Node::Tuple(items) => {
                write!(f, "(")?;
                write_list(f, items)?;
                write!(f, ")")
            }
            Node::Signed(sign, node) => write!(f, "{sign}{node}"),
            Node::Value(value) => write!(f, "{value}"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[Node]) -> fmt::Result {
    for (index, node) in nodes.iter().enumerate() {
        if index > 0 {
            write!(f, ",")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sign::Plus => write!(f, "+"),
            Sign::Minus => write!(f, "-"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Integer(value) => write!(f, "{value}"),
            // Debug keeps the fractional part, so `10.0` does not read back as an integer
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Decimal(value) => write!(f, "decimal:{value}"),
            Value::String(value) => write_string(f, value),
            Value::Date(value) => write!(f, "date:{}", value.format(DATE_FORMAT)),
            Value::DateTime(value) => write!(f, "datetime:{}", value.format(DATETIME_FORMAT)),
            Value::Time(value) => write!(f, "time:{}", value.format(TIME_FORMAT)),
        }
    }
}

fn write_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let mut encoded = utf8_percent_encode(value, RESERVED).to_string();
    // a leading '-' would read as a sort direction
    if encoded.starts_with('-') {
        encoded.replace_range(..1, "%2D");
    }
    if value.is_empty() || !values::reads_as_string(value) {
        write!(f, "string:{encoded}")
    } else {
        write!(f, "{encoded}")
    }
}
