//! Resolve attribute paths to columns, columns of related tables, and paths into JSON documents.

use query_engine_metadata::metadata;
use query_engine_rql::rql;
use query_engine_sql::sql;
use query_engine_sql::sql::execution_plan::{OutputColumn, OutputType};

use crate::translation::error::Error;
use crate::translation::helpers::{Env, State, TableNameAndReference};

/// An attribute path resolved against the metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub expression: sql::ast::Expression,
    /// The name results label this attribute with.
    pub label: String,
    pub scalar_type: metadata::ScalarType,
}

impl Attribute {
    /// Whether the attribute is a JSON document or a path into one.
    pub fn is_document(&self) -> bool {
        self.scalar_type.is_document()
    }

    /// Select this attribute under its label. Documents are returned as JSON text.
    pub fn output_column(&self) -> OutputColumn {
        let expression = match &self.expression {
            sql::ast::Expression::JsonPath {
                expression, path, ..
            } => sql::ast::Expression::JsonPath {
                expression: expression.clone(),
                path: path.clone(),
                extract: sql::ast::JsonExtract::Json,
            },
            expression => expression.clone(),
        };
        let output_type = match self.scalar_type {
            metadata::ScalarType::Json => OutputType::Json,
            metadata::ScalarType::Boolean => OutputType::Boolean,
            _ => OutputType::Default,
        };
        OutputColumn {
            alias: sql::helpers::make_column_alias(self.label.clone()),
            expression,
            output_type,
        }
    }
}

/// Resolve an attribute path relative to a table.
///
/// A path is either a single name or a tuple of segments. Segments naming a
/// relationship join the related table, and the rest of the path resolves
/// against it. Segments following a JSON column form a path into the document.
pub fn resolve(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    path: &rql::Node,
) -> Result<Attribute, Error> {
    match path {
        rql::Node::Tuple(segments) => resolve_segments(env, state, table, path, segments),
        segment => resolve_column(env, table, segment),
    }
}

fn resolve_segments(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    path: &rql::Node,
    segments: &[rql::Node],
) -> Result<Attribute, Error> {
    match segments {
        [] => Err(Error::InvalidAttribute(path.to_string())),
        [single] => resolve(env, state, table, single),
        [first, rest @ ..] => {
            let name = segment_name(first)?;
            let info = env.lookup_table(&table.name)?;

            if let Some(relationship) = info.lookup_relationship(name) {
                let related = join_relationship(env, state, table, name, relationship)?;
                return resolve_segments(env, state, &related, path, rest);
            }

            match info.lookup_column(name) {
                Some(column) if column.r#type.is_document() => {
                    json_path(table.column(&column.name), rest)
                }
                Some(_) => Err(Error::InvalidNestedAttribute(name.to_string())),
                None => Err(Error::InvalidAttribute(name.to_string())),
            }
        }
    }
}

/// Resolve a single name to a column of the table.
fn resolve_column(
    env: &Env,
    table: &TableNameAndReference,
    segment: &rql::Node,
) -> Result<Attribute, Error> {
    let name = segment_name(segment)?;
    let column = env
        .lookup_table(&table.name)?
        .lookup_column(name)
        .ok_or_else(|| Error::InvalidAttribute(name.to_string()))?;

    Ok(Attribute {
        expression: table.column(&column.name),
        label: name.to_string(),
        scalar_type: column.r#type,
    })
}

/// Queue a join to the table a relationship leads to, and return it.
fn join_relationship(
    env: &Env,
    state: &mut State,
    table: &TableNameAndReference,
    relationship_name: &str,
    relationship: &metadata::RelationshipInfo,
) -> Result<TableNameAndReference, Error> {
    let target_info = env.lookup_table(&relationship.target_table)?;
    let related = table.through(relationship_name, &relationship.target_table);

    let on = sql::helpers::conjunction(relationship.column_mapping.iter().map(
        |(source_column, target_column)| sql::ast::Expression::BinaryOperation {
            left: Box::new(table.column(source_column)),
            operator: sql::ast::BinaryOperator::Equals,
            right: Box::new(related.column(target_column)),
        },
    ))
    .unwrap_or_else(sql::helpers::true_expr);

    state.insert_join(sql::ast::LeftOuterJoin {
        table: sql::ast::TableReference::DBTable {
            table: sql::ast::TableName(target_info.table_name.clone()),
        },
        alias: related.alias.clone(),
        on,
    });

    Ok(related)
}

/// A path into a JSON column. Keys are names, indexes are integers.
/// The attribute is labelled with the last segment.
fn json_path(column: sql::ast::Expression, segments: &[rql::Node]) -> Result<Attribute, Error> {
    let elements = segments
        .iter()
        .map(|segment| match segment {
            rql::Node::Value(rql::Value::String(key)) => {
                Ok(sql::ast::JsonPathElement::Key(key.clone()))
            }
            rql::Node::Value(rql::Value::Integer(index)) => {
                Ok(sql::ast::JsonPathElement::Index(*index))
            }
            other => Err(Error::InvalidAttribute(other.to_string())),
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let label = match elements.last() {
        Some(sql::ast::JsonPathElement::Key(key)) => key.clone(),
        Some(sql::ast::JsonPathElement::Index(index)) => index.to_string(),
        None => String::new(),
    };

    Ok(Attribute {
        expression: sql::ast::Expression::JsonPath {
            expression: Box::new(column),
            path: sql::ast::JsonPath { elements },
            extract: sql::ast::JsonExtract::SqlValue,
        },
        label,
        scalar_type: metadata::ScalarType::Json,
    })
}

fn segment_name(segment: &rql::Node) -> Result<&str, Error> {
    match segment {
        rql::Node::Value(rql::Value::String(name)) => Ok(name),
        other => Err(Error::InvalidAttribute(other.to_string())),
    }
}
