//! The configuration used to serve queries.

use query_engine_metadata::metadata;

use crate::values::{PoolSettings, QueryDefaults};

/// Everything needed to connect to the database and translate queries against it.
///
/// Values of this type are produced from a `ParsedConfiguration` by
/// `make_runtime_configuration`, which resolves secrets. The file format can
/// then change without touching the code that serves queries.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub metadata: metadata::Metadata,
    pub pool_settings: PoolSettings,
    pub connection_uri: String,
    pub query_defaults: QueryDefaults,
}
