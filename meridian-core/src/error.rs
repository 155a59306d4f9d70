//! Error types for meridian-core

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// Row construction with the wrong number of bindings for its schema
    #[error("row arity mismatch: schema has {expected} slots, got {actual}")]
    RowArity {
        /// Number of variables in the schema
        expected: usize,
        /// Number of bindings supplied
        actual: usize,
    },

    /// Schema contains the same variable twice
    #[error("duplicate variable in schema: {0}")]
    DuplicateVariable(String),

    /// Variable identifier not present in the registry
    #[error("unknown variable id: {0}")]
    UnknownVariable(u32),

    /// Lexical form cannot be read as the requested value type
    #[error("cannot read literal '{lexical}' as {target}")]
    LiteralValue {
        /// The literal's lexical form
        lexical: String,
        /// The value type requested
        target: &'static str,
    },
}
