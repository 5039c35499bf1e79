//! Errors for translation.

use query_engine_rql::rql;

/// A type for translation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    Syntax(rql::SyntaxError),
    UnsupportedEntityCount(usize),
    CollectionNotFound(String),
    UnknownOperator(String),
    InvalidAttribute(String),
    InvalidNestedAttribute(String),
    InvalidArguments { operator: String, message: String },
    UncoercibleJsonValue(rql::ValueKind),
    UntypedJsonAggregate(String),
}

impl From<rql::SyntaxError> for Error {
    fn from(error: rql::SyntaxError) -> Self {
        Error::Syntax(error)
    }
}

impl Error {
    pub(crate) fn invalid_arguments(operator: &str, message: impl Into<String>) -> Self {
        Error::InvalidArguments {
            operator: operator.to_string(),
            message: message.into(),
        }
    }
}

/// Display errors.
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::Syntax(error) => write!(f, "RQL Syntax error: {error}"),
            Error::UnsupportedEntityCount(_) => write!(f, "Select must have only one entity"),
            Error::CollectionNotFound(collection_name) => {
                write!(f, "Collection '{collection_name}' not found.")
            }
            Error::UnknownOperator(name) => write!(f, "Invalid query function: {name}"),
            Error::InvalidAttribute(name) => write!(f, "Invalid query attribute: {name}"),
            Error::InvalidNestedAttribute(name) => {
                write!(f, "Invalid nested query attribute: {name}")
            }
            Error::InvalidArguments { operator, message } => {
                write!(f, "Invalid arguments for {operator}(): {message}")
            }
            Error::UncoercibleJsonValue(kind) => write!(
                f,
                "Cannot cast to type {kind} for comparison with JSON column"
            ),
            Error::UntypedJsonAggregate(function) => write!(
                f,
                "Cannot compute {function}() over a JSON column without a known type"
            ),
        }
    }
}

impl std::error::Error for Error {}
