//! Errors that can be thrown when processing configuration.

use std::path::PathBuf;

use crate::environment;

/// The errors that can be thrown when reading the configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {}:{line}:{column}: {message}", .file_path.display())]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("unsupported configuration version {found}, expected {expected}")]
    UnsupportedVersion { found: u32, expected: u32 },
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing the configuration directory.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The errors that can be thrown when resolving the configuration for use at runtime.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("cannot resolve the connection URI: {0}")]
    MissingEnvironmentVariable(#[from] environment::Error),
    #[error("defaultLimit {default_limit} exceeds maxLimit {max_limit}")]
    DefaultLimitAboveMaximum { default_limit: u32, max_limit: u32 },
}
