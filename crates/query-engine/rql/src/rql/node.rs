//! Type definitions of a parsed RQL expression.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;

/// A single term of an RQL expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// An operator applied to arguments, e.g. `eq(name,Bob)`.
    Call(Call),
    /// A scalar leaf.
    Value(Value),
    /// A composite attribute path or a list of values, e.g. `(raw,tags)`.
    Tuple(Vec<Node>),
    /// A sort key written with an explicit direction, e.g. `-balance`.
    Signed(Sign, Box<Node>),
}

/// An operator node.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub args: Vec<Node>,
}

/// The direction prefix of a sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

/// A scalar leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

/// The runtime kind of a [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Bool,
    Integer,
    Float,
    Decimal,
    String,
    Date,
    DateTime,
    Time,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Bool,
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Decimal(_) => ValueKind::Decimal,
            Value::String(_) => ValueKind::String,
            Value::Date(_) => ValueKind::Date,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Time(_) => ValueKind::Time,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Null => "null",
            ValueKind::Bool => "boolean",
            ValueKind::Integer => "integer",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Date => "date",
            ValueKind::DateTime => "datetime",
            ValueKind::Time => "time",
        };
        write!(f, "{name}")
    }
}

impl Node {
    pub fn call(name: impl Into<String>, args: Vec<Node>) -> Node {
        Node::Call(Call {
            name: name.into(),
            args,
        })
    }

    pub fn string(value: impl Into<String>) -> Node {
        Node::Value(Value::String(value.into()))
    }

    pub fn integer(value: i64) -> Node {
        Node::Value(Value::Integer(value))
    }

    /// Find the first operator node with the given name, depth first.
    pub fn find(&self, name: &str) -> Option<&Call> {
        match self {
            Node::Call(call) if call.name == name => Some(call),
            Node::Call(Call { args: nodes, .. }) | Node::Tuple(nodes) => {
                nodes.iter().find_map(|node| node.find(name))
            }
            Node::Signed(_, node) => node.find(name),
            Node::Value(_) => None,
        }
    }

    /// Build a copy of this tree in which the first operator node named `name`
    /// (depth first) has its arguments replaced by `args`.
    ///
    /// Returns `None` when no such node exists. `self` is never modified.
    pub fn replace(&self, name: &str, args: &[Node]) -> Option<Node> {
        match self {
            Node::Call(call) if call.name == name => Some(Node::call(name, args.to_vec())),
            Node::Call(call) => replace_first(&call.args, name, args).map(|new_args| {
                Node::Call(Call {
                    name: call.name.clone(),
                    args: new_args,
                })
            }),
            Node::Tuple(items) => replace_first(items, name, args).map(Node::Tuple),
            Node::Signed(sign, node) => node
                .replace(name, args)
                .map(|replacement| Node::Signed(*sign, Box::new(replacement))),
            Node::Value(_) => None,
        }
    }
}

fn replace_first(nodes: &[Node], name: &str, args: &[Node]) -> Option<Vec<Node>> {
    nodes.iter().enumerate().find_map(|(index, node)| {
        node.replace(name, args).map(|replacement| {
            let mut nodes = nodes.to_vec();
            nodes[index] = replacement;
            nodes
        })
    })
}

/// Replace the arguments of the first `name` operator in `tree`.
///
/// When the tree has no such operator the new node is conjoined with the
/// whole tree under a fresh top-level `and`, which changes the meaning of
/// trees whose root is an `or`. Pagination links rely on this behaviour.
pub fn rewrite(tree: Option<&Node>, name: &str, args: Vec<Node>) -> Node {
    match tree {
        None => Node::call(name, args),
        Some(tree) => match tree.replace(name, &args) {
            Some(replaced) => replaced,
            None => Node::call("and", vec![Node::call(name, args), tree.clone()]),
        },
    }
}
