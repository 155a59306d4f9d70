//! Member connection and prepared-query traits
//!
//! The evaluation side of the federation talks to members exclusively
//! through these three traits. The lifecycle is:
//!
//! 1. `MemberConnection::prepare(request)` - once per owned subtree, the
//!    handle is reused for every subsequent evaluation of that subtree
//! 2. On the handle, per evaluation: `clear_bindings`, `bind` the caller's
//!    values, `set_dataset`, `execute`
//! 3. Pull the returned `SolutionStream` until exhausted, or `close` it
//!    early
//!
//! # Reuse Contract
//!
//! A `PreparedQuery` is a single shared mutable resource: the caller
//! serializes step 2 per handle, but the returned stream is drained
//! *outside* that critical section. Implementations MUST therefore snapshot
//! bound values and the dataset no later than `execute()` returning - a
//! later `bind` on the same handle must never affect a stream that was
//! already returned. [`MemoryMember`](crate::MemoryMember) materializes its
//! solutions inside `execute` for exactly this reason.

use crate::error::Result;
use crate::request::QueryRequest;
use async_trait::async_trait;
use meridian_core::{Dataset, Term};
use std::sync::Arc;

/// One solution as a member reports it: variable name → term pairs
///
/// Names are the member-visible variable names from the request; mapping
/// back to compact ids is the caller's business.
pub type RemoteSolution = Vec<(Arc<str>, Term)>;

/// A query-capable connection to one federation member
#[async_trait]
pub trait MemberConnection: Send + Sync {
    /// Stable identifier for this member, used in logs and error context
    fn endpoint(&self) -> &str;

    /// Prepare a request for repeated execution
    ///
    /// Fails when the member is unreachable or cannot evaluate the request
    /// shape. The caller treats preparation failure as "this member
    /// contributes nothing", not as a query failure.
    async fn prepare(&self, request: &QueryRequest) -> Result<Box<dyn PreparedQuery>>;
}

/// A remote query handle carrying mutable binding state between executions
#[async_trait]
pub trait PreparedQuery: Send {
    /// Bind a value onto the query for the next execution
    fn bind(&mut self, name: &str, term: Term) -> Result<()>;

    /// Remove all bindings from a previous execution
    fn clear_bindings(&mut self);

    /// Restrict the graphs the next execution may read
    ///
    /// `None` lifts any previous restriction.
    fn set_dataset(&mut self, dataset: Option<&Dataset>) -> Result<()>;

    /// Execute with the current bindings and dataset
    ///
    /// Snapshot semantics: the returned stream reflects the handle state at
    /// this call; later mutations of the handle must not leak into it.
    async fn execute(&mut self) -> Result<Box<dyn SolutionStream>>;
}

impl std::fmt::Debug for dyn PreparedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedQuery").finish_non_exhaustive()
    }
}

/// A lazy, closeable stream of remote solutions
#[async_trait]
pub trait SolutionStream: Send {
    /// Pull the next solution
    ///
    /// `Ok(None)` signals exhaustion. After exhaustion or `close`, every
    /// call answers `Ok(None)`.
    async fn next(&mut self) -> Result<Option<RemoteSolution>>;

    /// Release remote resources held by this stream
    ///
    /// Idempotent; closing an exhausted stream is a no-op.
    fn close(&mut self);
}
