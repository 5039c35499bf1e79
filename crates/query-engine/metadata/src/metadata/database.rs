//! Metadata information regarding the database and tracked information.

use std::collections::BTreeMap;
use std::fmt;

use enum_iterator::Sequence;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The scalar types supported by the Engine.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Sequence,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Boolean,
    Integer,
    Real,
    Numeric,
    Text,
    Date,
    Time,
    Timestamp,
    Json,
    Any,
}

impl ScalarType {
    /// Map a column's declared SQLite type to a scalar type.
    ///
    /// SQLite accepts arbitrary type names, so this follows its affinity rules
    /// loosely, checking for the more specific names first.
    pub fn from_declared_type(declared: &str) -> ScalarType {
        let declared = declared.to_uppercase();
        let has = |fragment: &str| declared.contains(fragment);

        if has("BOOL") {
            ScalarType::Boolean
        } else if has("INT") {
            ScalarType::Integer
        } else if has("JSON") {
            ScalarType::Json
        } else if has("CHAR") || has("TEXT") || has("CLOB") {
            ScalarType::Text
        } else if has("REAL") || has("FLOA") || has("DOUB") {
            ScalarType::Real
        } else if has("DATETIME") || has("TIMESTAMP") {
            ScalarType::Timestamp
        } else if has("DATE") {
            ScalarType::Date
        } else if has("TIME") {
            ScalarType::Time
        } else if has("NUMERIC") || has("DECIMAL") {
            ScalarType::Numeric
        } else {
            ScalarType::Any
        }
    }

    /// The type name used when declaring a column of this type.
    pub fn declared_type(&self) -> &'static str {
        match self {
            ScalarType::Boolean => "BOOLEAN",
            ScalarType::Integer => "INTEGER",
            ScalarType::Real => "REAL",
            ScalarType::Numeric => "NUMERIC",
            ScalarType::Text => "TEXT",
            ScalarType::Date => "DATE",
            ScalarType::Time => "TIME",
            ScalarType::Timestamp => "TIMESTAMP",
            ScalarType::Json => "JSON",
            ScalarType::Any => "",
        }
    }

    /// Columns of this type hold a nested document addressable by key or index.
    pub fn is_document(&self) -> bool {
        matches!(self, ScalarType::Json)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", format!("{self:?}").to_lowercase())
    }
}

/// Mapping from a "table" name to its information.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TablesInfo(pub BTreeMap<String, TableInfo>);

impl TablesInfo {
    pub fn empty() -> Self {
        TablesInfo(BTreeMap::new())
    }
}

/// Information about a database table (or any other kind of relation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableInfo {
    pub table_name: String,
    pub columns: BTreeMap<String, ColumnInfo>,
    #[serde(default)]
    pub relationships: BTreeMap<String, RelationshipInfo>,
}

impl TableInfo {
    /// Lookup a column in a table.
    pub fn lookup_column(&self, column_name: &str) -> Option<&ColumnInfo> {
        self.columns.get(column_name)
    }

    /// Lookup a relationship from this table.
    pub fn lookup_relationship(&self, relationship_name: &str) -> Option<&RelationshipInfo> {
        self.relationships.get(relationship_name)
    }
}

/// Can this column contain null values
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

/// Information about a database column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnInfo {
    pub name: String,
    pub r#type: ScalarType,
    #[serde(default)]
    pub nullable: Nullable,
}

/// A navigable association from one table to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipInfo {
    pub target_table: String,
    /// Source column to target column pairs, all of which must match.
    pub column_mapping: BTreeMap<String, String>,
}
