//! Error types for federated evaluation

use meridian_connection::ConnectionError;
use thiserror::Error;

/// Result type alias using our EvaluationError
pub type Result<T> = std::result::Result<T, EvaluationError>;

/// Errors surfaced while evaluating a federated plan
///
/// This is the only error kind that crosses the cursor boundary. Raw member
/// errors appear solely as `source` causes; preparation-time member failures
/// never appear at all (the owned subtree degrades to an empty contributor
/// instead).
#[derive(Error, Debug)]
pub enum EvaluationError {
    /// A caller value could not be bound onto the remote query
    #[error("failed to bind {name} on member {member}")]
    Bind {
        /// Member endpoint
        member: String,
        /// Variable name as sent to the member
        name: String,
        /// Underlying connection failure
        #[source]
        source: ConnectionError,
    },

    /// The dataset could not be applied to the remote query
    #[error("failed to apply graph scope on member {member}")]
    Dataset {
        /// Member endpoint
        member: String,
        /// Underlying connection failure
        #[source]
        source: ConnectionError,
    },

    /// Remote execution failed after binding succeeded
    #[error("remote execution failed on member {member}")]
    Execute {
        /// Member endpoint
        member: String,
        /// Underlying connection failure
        #[source]
        source: ConnectionError,
    },

    /// The remote result stream failed mid-consumption
    #[error("result stream failed on member {member}")]
    Stream {
        /// Member endpoint
        member: String,
        /// Underlying connection failure
        #[source]
        source: ConnectionError,
    },

    /// A subtree with no owner reached the evaluator
    ///
    /// Ownership is assigned by the optimizer before evaluation; this layer
    /// performs no ownership inference.
    #[error("subtree has no owner assigned; the plan was not annotated")]
    NoOwner,

    /// Core data-model error (row construction, unknown variable)
    #[error(transparent)]
    Core(#[from] meridian_core::Error),
}
