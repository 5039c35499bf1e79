//! Convert a parsed configuration into the one used at runtime.

use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, Secret};
use crate::version1::ParsedConfiguration;

/// Resolve the secrets of a parsed configuration and check its query defaults.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = match parsed_config.connection_uri {
        ConnectionUri(Secret::Plain(uri)) => uri,
        ConnectionUri(Secret::FromEnvironment { variable }) => environment.read(&variable)?,
    };

    let query_defaults = parsed_config.query_defaults;
    if let (Some(default_limit), Some(max_limit)) =
        (query_defaults.default_limit, query_defaults.max_limit)
    {
        if default_limit > max_limit {
            return Err(MakeRuntimeConfigurationError::DefaultLimitAboveMaximum {
                default_limit,
                max_limit,
            });
        }
    }

    Ok(Configuration {
        metadata: parsed_config.metadata,
        pool_settings: parsed_config.pool_settings,
        connection_uri,
        query_defaults,
    })
}
