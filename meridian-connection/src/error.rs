//! Error types for the member-connection boundary

use thiserror::Error;

/// Result type alias using our ConnectionError
pub type Result<T> = std::result::Result<T, ConnectionError>;

/// Errors raised by member connections
///
/// The federation core never exposes these raw: preparation failures are
/// absorbed (the member degrades to an empty contributor), and everything
/// later is wrapped into the federation error kind with this as the cause.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Member cannot be reached at all
    #[error("member unreachable: {0}")]
    Unreachable(String),

    /// Member cannot evaluate the requested query shape
    #[error("request not supported by member: {0}")]
    Unsupported(String),

    /// A variable binding was rejected by the remote query
    #[error("invalid binding for {name}: {reason}")]
    InvalidBinding {
        /// Variable name as sent to the member
        name: String,
        /// Member-reported reason
        reason: String,
    },

    /// The dataset could not be applied to the remote query
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// Remote execution failed after the query was accepted
    #[error("execution failed: {0}")]
    Execution(String),

    /// The result stream failed mid-consumption
    #[error("result stream failed: {0}")]
    Stream(String),

    /// Wire-format error
    #[error("request encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
