//! The configuration file format, and the introspection that fills it in.

use std::collections::BTreeMap;
use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sqlx::{Connection, SqliteConnection};
use tokio::fs;
use tracing::{info_span, Instrument};

use query_engine_metadata::metadata::{self, TablesInfo};

use crate::environment::Environment;
use crate::error::{ParseConfigurationError, WriteParsedConfigurationError};
use crate::values::{ConnectionUri, PoolSettings, QueryDefaults, Secret};

const CURRENT_VERSION: u32 = 1;
pub const CONFIGURATION_FILENAME: &str = "configuration.json";
pub const CONFIGURATION_JSONSCHEMA_FILENAME: &str = "schema.json";
pub const DEFAULT_CONNECTION_URI_VARIABLE: &str = "RQL_DATABASE_URL";

const TABLES_QUERY: &str = r"
    SELECT name FROM sqlite_master
    WHERE type IN ('table', 'view') AND name NOT LIKE 'sqlite\_%' ESCAPE '\'
    ORDER BY name";
const COLUMNS_QUERY: &str = r#"SELECT name, type, "notnull" FROM pragma_table_info(?1) ORDER BY cid"#;
const PRIMARY_KEY_QUERY: &str = "SELECT name FROM pragma_table_info(?1) WHERE pk > 0 ORDER BY pk";
const FOREIGN_KEYS_QUERY: &str =
    r#"SELECT id, "table", "from", "to" FROM pragma_foreign_key_list(?1) ORDER BY id, seq"#;

/// Initial configuration, just enough to connect to a database and elaborate a full
/// 'Configuration'.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParsedConfiguration {
    /// Which version of the configuration format are we using
    pub version: u32,
    /// URI of the SQLite database
    pub connection_uri: ConnectionUri,
    #[serde(skip_serializing_if = "PoolSettings::is_default")]
    #[serde(default)]
    pub pool_settings: PoolSettings,
    #[serde(skip_serializing_if = "QueryDefaults::is_default")]
    #[serde(default)]
    pub query_defaults: QueryDefaults,
    #[serde(default)]
    pub metadata: metadata::Metadata,
}

impl ParsedConfiguration {
    pub fn initial() -> Self {
        ParsedConfiguration::empty()
    }

    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            connection_uri: ConnectionUri(Secret::FromEnvironment {
                variable: DEFAULT_CONNECTION_URI_VARIABLE.into(),
            }),
            pool_settings: PoolSettings::default(),
            query_defaults: QueryDefaults::default(),
            metadata: metadata::Metadata::default(),
        }
    }
}

/// Construct the deployment configuration by introspecting the database.
///
/// Everything but the metadata is kept from `args`.
pub async fn configure(
    args: &ParsedConfiguration,
    environment: impl Environment,
) -> anyhow::Result<ParsedConfiguration> {
    let connection_uri = match &args.connection_uri {
        ConnectionUri(Secret::Plain(value)) => value.clone(),
        ConnectionUri(Secret::FromEnvironment { variable }) => environment.read(variable)?,
    };

    let tables = async {
        let mut connection = SqliteConnection::connect(&connection_uri).await?;
        let tables = introspect(&mut connection).await?;
        connection.close().await?;
        Ok::<_, anyhow::Error>(tables)
    }
    .instrument(info_span!("Introspect database"))
    .await?;

    tracing::info!(tables = tables.0.len(), "Introspected database");

    Ok(ParsedConfiguration {
        version: CURRENT_VERSION,
        connection_uri: args.connection_uri.clone(),
        pool_settings: args.pool_settings.clone(),
        query_defaults: args.query_defaults.clone(),
        metadata: metadata::Metadata { tables },
    })
}

/// Read every table with its columns, and turn foreign keys into relationships.
async fn introspect(connection: &mut SqliteConnection) -> anyhow::Result<TablesInfo> {
    let table_names: Vec<String> = sqlx::query_scalar(TABLES_QUERY)
        .fetch_all(&mut *connection)
        .await?;

    let mut tables = BTreeMap::new();
    for table_name in &table_names {
        let columns: Vec<(String, String, i64)> = sqlx::query_as(COLUMNS_QUERY)
            .bind(table_name)
            .fetch_all(&mut *connection)
            .await?;
        let columns = columns
            .into_iter()
            .map(|(name, declared_type, not_null)| {
                let column = metadata::ColumnInfo {
                    name: name.clone(),
                    r#type: metadata::ScalarType::from_declared_type(&declared_type),
                    nullable: if not_null != 0 {
                        metadata::Nullable::NonNullable
                    } else {
                        metadata::Nullable::Nullable
                    },
                };
                (name, column)
            })
            .collect();

        tables.insert(
            table_name.clone(),
            metadata::TableInfo {
                table_name: table_name.clone(),
                columns,
                relationships: BTreeMap::new(),
            },
        );
    }

    for table_name in &table_names {
        for foreign_key in foreign_keys(connection, table_name).await? {
            add_relationships(&mut tables, table_name, foreign_key);
        }
    }

    Ok(TablesInfo(tables))
}

/// A foreign key of a table: the table it references, and pairs of
/// referencing and referenced columns.
struct ForeignKey {
    target_table: String,
    column_mapping: BTreeMap<String, String>,
}

async fn foreign_keys(
    connection: &mut SqliteConnection,
    table_name: &str,
) -> anyhow::Result<Vec<ForeignKey>> {
    let rows: Vec<(i64, String, String, Option<String>)> = sqlx::query_as(FOREIGN_KEYS_QUERY)
        .bind(table_name)
        .fetch_all(&mut *connection)
        .await?;

    let mut grouped: BTreeMap<i64, (String, Vec<(String, Option<String>)>)> = BTreeMap::new();
    for (id, target_table, from, to) in rows {
        grouped
            .entry(id)
            .or_insert_with(|| (target_table, vec![]))
            .1
            .push((from, to));
    }

    let mut foreign_keys = vec![];
    for (target_table, pairs) in grouped.into_values() {
        // A key declared without target columns references the primary key.
        let primary_key: Vec<String> = if pairs.iter().any(|(_, to)| to.is_none()) {
            sqlx::query_scalar(PRIMARY_KEY_QUERY)
                .bind(&target_table)
                .fetch_all(&mut *connection)
                .await?
        } else {
            vec![]
        };

        let column_mapping = pairs
            .into_iter()
            .enumerate()
            .filter_map(|(position, (from, to))| {
                to.or_else(|| primary_key.get(position).cloned())
                    .map(|to| (from, to))
            })
            .collect();

        foreign_keys.push(ForeignKey {
            target_table,
            column_mapping,
        });
    }
    Ok(foreign_keys)
}

/// Add the relationship a foreign key defines in each direction.
///
/// From the referencing table it is named after the referenced table. From
/// the referenced table it is named after the referencing table plus `s`.
fn add_relationships(
    tables: &mut BTreeMap<String, metadata::TableInfo>,
    source_table: &str,
    foreign_key: ForeignKey,
) {
    if !tables.contains_key(&foreign_key.target_table) {
        tracing::warn!(
            table = source_table,
            target = %foreign_key.target_table,
            "Ignoring foreign key to a missing table"
        );
        return;
    }

    let reverse_mapping = foreign_key
        .column_mapping
        .iter()
        .map(|(from, to)| (to.clone(), from.clone()))
        .collect();

    insert_relationship(
        tables,
        source_table,
        foreign_key.target_table.clone(),
        metadata::RelationshipInfo {
            target_table: foreign_key.target_table.clone(),
            column_mapping: foreign_key.column_mapping,
        },
    );
    insert_relationship(
        tables,
        &foreign_key.target_table,
        format!("{source_table}s"),
        metadata::RelationshipInfo {
            target_table: source_table.to_string(),
            column_mapping: reverse_mapping,
        },
    );
}

fn insert_relationship(
    tables: &mut BTreeMap<String, metadata::TableInfo>,
    table_name: &str,
    relationship_name: String,
    relationship: metadata::RelationshipInfo,
) {
    let Some(table) = tables.get_mut(table_name) else {
        return;
    };
    if table.relationships.contains_key(&relationship_name) {
        tracing::warn!(
            table = table_name,
            relationship = %relationship_name,
            "Keeping the first of several relationships with the same name"
        );
        return;
    }
    table.relationships.insert(relationship_name, relationship);
}

/// Parse the configuration format from a directory.
pub async fn parse_configuration(
    configuration_dir: impl AsRef<Path>,
) -> Result<ParsedConfiguration, ParseConfigurationError> {
    let configuration_file = configuration_dir.as_ref().join(CONFIGURATION_FILENAME);

    let configuration_file_contents =
        fs::read_to_string(&configuration_file)
            .await
            .map_err(|err| {
                ParseConfigurationError::IoErrorButStringified(format!(
                    "{}: {}",
                    &configuration_file.display(),
                    err
                ))
            })?;

    let parsed_config: ParsedConfiguration = serde_json::from_str(&configuration_file_contents)
        .map_err(|error| ParseConfigurationError::ParseError {
            file_path: configuration_file.clone(),
            line: error.line(),
            column: error.column(),
            message: error.to_string(),
        })?;

    if parsed_config.version != CURRENT_VERSION {
        return Err(ParseConfigurationError::UnsupportedVersion {
            found: parsed_config.version,
            expected: CURRENT_VERSION,
        });
    }

    Ok(parsed_config)
}

/// Write the parsed configuration into a directory on disk, next to its JSON schema.
pub async fn write_parsed_configuration(
    parsed_config: ParsedConfiguration,
    out_dir: impl AsRef<Path>,
) -> Result<(), WriteParsedConfigurationError> {
    let configuration_file = out_dir.as_ref().to_owned().join(CONFIGURATION_FILENAME);
    fs::create_dir_all(out_dir.as_ref()).await?;

    // create the configuration file
    fs::write(
        configuration_file,
        serde_json::to_string_pretty(&parsed_config)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    // create the jsonschema file
    let configuration_jsonschema_file_path = out_dir
        .as_ref()
        .to_owned()
        .join(CONFIGURATION_JSONSCHEMA_FILENAME);

    let output = schemars::schema_for!(ParsedConfiguration);
    fs::write(
        &configuration_jsonschema_file_path,
        serde_json::to_string_pretty(&output)
            .map_err(|e| WriteParsedConfigurationError::IoError(e.into()))?
            + "\n",
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_configuration_serializes_compactly() {
        assert_eq!(
            serde_json::to_value(ParsedConfiguration::initial()).unwrap(),
            serde_json::json!({
                "version": 1,
                "connectionUri": {"variable": "RQL_DATABASE_URL"},
                "metadata": {"tables": {}}
            })
        );
    }

    #[test]
    fn missing_sections_take_their_defaults() {
        let parsed: ParsedConfiguration = serde_json::from_value(serde_json::json!({
            "version": 1,
            "connectionUri": "sqlite::memory:",
            "queryDefaults": {"maxLimit": 100}
        }))
        .unwrap();

        assert_eq!(parsed.pool_settings, PoolSettings::default());
        assert_eq!(parsed.query_defaults.max_limit, Some(100));
        assert_eq!(parsed.query_defaults.default_limit, None);
        assert!(!parsed.query_defaults.strict_json_types);
        assert_eq!(parsed.metadata, metadata::Metadata::empty());
    }
}
