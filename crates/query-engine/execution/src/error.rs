//! Errors for query execution.

/// Errors raised while running a query.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Query(#[from] QueryError),
    #[error("Database error: {0}")]
    DB(#[from] sqlx::Error),
}

/// A query ran, but its result does not fit what was asked for.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("No result found for one()")]
    NoResultFound,
    #[error("Multiple results found for one()")]
    MultipleResultsFound,
    #[error("Pagination requires a limit value")]
    PaginationWithoutLimit,
}
