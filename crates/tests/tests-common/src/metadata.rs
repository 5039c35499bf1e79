//! Metadata describing the fixture database.

use std::collections::BTreeMap;

use query_engine_metadata::metadata::{
    ColumnInfo, Metadata, Nullable, RelationshipInfo, ScalarType, TableInfo, TablesInfo,
};

fn table(
    name: &str,
    columns: &[(&str, ScalarType)],
    relationships: &[(&str, &str, &str, &str)],
) -> (String, TableInfo) {
    let columns = columns
        .iter()
        .map(|(column, scalar_type)| {
            (
                (*column).to_string(),
                ColumnInfo {
                    name: (*column).to_string(),
                    r#type: *scalar_type,
                    nullable: Nullable::Nullable,
                },
            )
        })
        .collect();
    let relationships = relationships
        .iter()
        .map(|(relationship, target_table, source_column, target_column)| {
            (
                (*relationship).to_string(),
                RelationshipInfo {
                    target_table: (*target_table).to_string(),
                    column_mapping: BTreeMap::from([(
                        (*source_column).to_string(),
                        (*target_column).to_string(),
                    )]),
                },
            )
        })
        .collect();

    (
        name.to_string(),
        TableInfo {
            table_name: name.to_string(),
            columns,
            relationships,
        },
    )
}

/// The tables of the fixture with their columns and relationships.
///
/// A foreign key gives a relationship named after the table it points to,
/// and one back from that table named after the referencing table plus `s`.
pub fn metadata() -> Metadata {
    Metadata {
        tables: TablesInfo(BTreeMap::from([
            table(
                "user",
                &[
                    ("user_id", ScalarType::Integer),
                    ("guid", ScalarType::Text),
                    ("name", ScalarType::Text),
                    ("email", ScalarType::Text),
                    ("gender", ScalarType::Text),
                    ("birthdate", ScalarType::Date),
                    ("registered", ScalarType::Timestamp),
                    ("is_active", ScalarType::Boolean),
                    ("city", ScalarType::Text),
                    ("state", ScalarType::Text),
                    ("balance", ScalarType::Real),
                    ("raw", ScalarType::Json),
                    ("misc", ScalarType::Json),
                ],
                &[("blogs", "blog", "user_id", "user_id")],
            ),
            table(
                "blog",
                &[
                    ("id", ScalarType::Integer),
                    ("title", ScalarType::Text),
                    ("user_id", ScalarType::Integer),
                ],
                &[
                    ("user", "user", "user_id", "user_id"),
                    ("posts", "post", "id", "blog_id"),
                ],
            ),
            table(
                "post",
                &[
                    ("id", ScalarType::Integer),
                    ("title", ScalarType::Text),
                    ("blog_id", ScalarType::Integer),
                ],
                &[("blog", "blog", "blog_id", "id")],
            ),
        ])),
    }
}
