//! Query execution against an SQLite database.

pub mod error;
pub mod metrics;
pub mod query;
pub mod rows;
