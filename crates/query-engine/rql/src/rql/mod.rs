//! The RQL resource query language: expression trees, parsing and serializing.

pub mod error;
pub mod lexer;
pub mod node;
pub mod parser;
pub mod unparse;
pub mod values;

pub use error::SyntaxError;
pub use node::{rewrite, Call, Node, Sign, Value, ValueKind};
pub use parser::parse;
pub use unparse::unparse;
