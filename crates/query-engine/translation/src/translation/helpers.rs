//! Helpers for processing an RQL expression and building SQL.

use indexmap::IndexMap;

use query_engine_metadata::metadata;
use query_engine_sql::sql;
use rql_configuration::QueryDefaults;

use super::error::Error;

/// Static information from the query and metadata.
pub struct Env<'a> {
    metadata: &'a metadata::Metadata,
    pub defaults: &'a QueryDefaults,
}

/// For a table in the query, We'd like to track what is its reference in the query
/// (the name we can use to address it, an alias we generate), and what is its name in the
/// metadata (so we can get its information such as which columns are available for that table).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableNameAndReference {
    /// Table name for column lookup
    pub name: String,
    /// Table alias to query from
    pub alias: sql::ast::TableAlias,
}

impl TableNameAndReference {
    /// The root table of a query is addressed by its own name.
    pub fn root(name: &str) -> TableNameAndReference {
        TableNameAndReference {
            name: name.to_string(),
            alias: sql::helpers::make_table_alias(name.to_string()),
        }
    }

    /// A table reached through a relationship is aliased by the path that reached it.
    pub fn through(&self, relationship_name: &str, target_table: &str) -> TableNameAndReference {
        TableNameAndReference {
            name: target_table.to_string(),
            alias: sql::helpers::make_table_alias(format!(
                "{}.{}",
                self.alias.name, relationship_name
            )),
        }
    }

    pub fn reference(&self) -> sql::ast::TableReference {
        sql::ast::TableReference::AliasedTable(self.alias.clone())
    }

    /// A column of this table.
    pub fn column(&self, name: &str) -> sql::ast::Expression {
        sql::ast::Expression::ColumnReference(sql::ast::ColumnReference::TableColumn {
            table: self.reference(),
            name: sql::ast::ColumnName(name.to_string()),
        })
    }
}

impl<'a> Env<'a> {
    /// Create a new Env by supplying the metadata and query defaults.
    pub fn new(metadata: &'a metadata::Metadata, defaults: &'a QueryDefaults) -> Env<'a> {
        Env { metadata, defaults }
    }

    /// Lookup a table's information in the metadata.
    pub fn lookup_table(&self, table_name: &str) -> Result<&'a metadata::TableInfo, Error> {
        self.metadata
            .lookup_table(table_name)
            .ok_or_else(|| Error::CollectionNotFound(table_name.to_string()))
    }
}

/// Everything a walk over an RQL expression has accumulated so far.
///
/// Operators record their clauses here. The filter itself is the value the
/// walk returns for the root node.
#[derive(Debug, Default)]
pub struct State {
    joins: IndexMap<String, sql::ast::LeftOuterJoin>,
    pub where_: Option<sql::ast::Expression>,
    pub order_by: Option<Vec<sql::ast::OrderByElement>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub distinct: bool,
    pub one: bool,
    pub group_by: Option<Vec<sql::ast::Expression>>,
    pub select: Option<Vec<sql::execution_plan::OutputColumn>>,
    pub values: Option<sql::execution_plan::OutputColumn>,
    pub scalar: Option<sql::execution_plan::ScalarAggregate>,
}

impl State {
    /// Build a new state.
    pub fn new() -> State {
        State::default()
    }

    /// Queue a join to a related table. Joins are keyed by alias, so a
    /// relationship used several times is only joined once.
    pub fn insert_join(&mut self, join: sql::ast::LeftOuterJoin) {
        self.joins.entry(join.alias.name.clone()).or_insert(join);
    }

    /// The queued joins, in the order they were first needed.
    pub fn joins(&self) -> impl Iterator<Item = &sql::ast::LeftOuterJoin> {
        self.joins.values()
    }
}
