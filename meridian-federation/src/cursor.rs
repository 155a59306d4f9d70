//! Cursor trait and lifecycle discipline
//!
//! Every component in the federation core produces and consumes the same
//! lazy, pull-based, closeable sequence of rows. The discipline all cursor
//! variants share:
//!
//! - `next()` never yields a row after end-of-sequence or after `close()`
//! - on an unrecovered error during `next()`, a cursor closes the upstream
//!   cursors it owns *before* propagating, and marks itself terminal so a
//!   later `close()` is a safe no-op
//! - `close()` is idempotent and transitively closes owned upstreams
//!
//! A cursor chain is only as leak-safe as its weakest link: whichever
//! component holds an upstream cursor owns closing it.

use crate::error::Result;
use async_trait::async_trait;
use meridian_core::{Row, VarId};
use std::collections::VecDeque;
use std::sync::Arc;

/// A lazy, pull-based, closeable sequence of rows
#[async_trait]
pub trait Cursor: Send {
    /// Output schema - which variables rows from this cursor can bind
    ///
    /// Fixed at construction time.
    fn schema(&self) -> &[VarId];

    /// Pull the next row
    ///
    /// `Ok(None)` signals exhaustion; after exhaustion, failure, or
    /// `close`, every call answers `Ok(None)`.
    async fn next(&mut self) -> Result<Option<Row>>;

    /// Release this cursor and everything upstream of it
    fn close(&mut self);
}

impl std::fmt::Debug for dyn Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("schema", &self.schema())
            .finish_non_exhaustive()
    }
}

/// Boxed cursor for dynamic dispatch
pub type BoxedCursor = Box<dyn Cursor>;

/// Cursor lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// Not yet advanced
    Created,
    /// Producing rows
    Streaming,
    /// End-of-sequence reached; upstream resources already released
    Exhausted,
    /// Closed by the consumer
    Closed,
    /// A `next()` call failed; upstream resources already released
    Failed,
}

impl CursorState {
    /// Check if `next()` may still produce rows
    pub fn can_advance(&self) -> bool {
        matches!(self, CursorState::Created | CursorState::Streaming)
    }

    /// Check if upstream resources have already been released
    ///
    /// Terminal states release eagerly, so `close()` from one of them must
    /// not release again.
    pub fn is_terminal(&self) -> bool {
        !self.can_advance()
    }
}

/// A cursor with a schema but no rows
///
/// The degrade-gracefully result of an owned subtree whose member could not
/// be prepared: the subtree contributes nothing instead of failing the plan.
#[derive(Debug)]
pub struct EmptyCursor {
    schema: Arc<[VarId]>,
}

impl EmptyCursor {
    /// Create an empty cursor with the given schema
    pub fn new(schema: Arc<[VarId]>) -> Self {
        Self { schema }
    }
}

#[async_trait]
impl Cursor for EmptyCursor {
    fn schema(&self) -> &[VarId] {
        &self.schema
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        Ok(None)
    }

    fn close(&mut self) {}
}

/// A cursor over rows already in memory
///
/// The passthrough variant: seeds nested evaluations and backs tests.
#[derive(Debug)]
pub struct RowsCursor {
    schema: Arc<[VarId]>,
    rows: VecDeque<Row>,
    state: CursorState,
}

impl RowsCursor {
    /// Create a cursor over the given rows
    ///
    /// Every row must share `schema`.
    pub fn new(schema: Arc<[VarId]>, rows: Vec<Row>) -> Self {
        debug_assert!(rows.iter().all(|r| **r.schema() == *schema));
        Self {
            schema,
            rows: rows.into(),
            state: CursorState::Created,
        }
    }
}

#[async_trait]
impl Cursor for RowsCursor {
    fn schema(&self) -> &[VarId] {
        &self.schema
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.can_advance() {
            return Ok(None);
        }
        match self.rows.pop_front() {
            Some(row) => {
                self.state = CursorState::Streaming;
                Ok(Some(row))
            }
            None => {
                self.state = CursorState::Exhausted;
                Ok(None)
            }
        }
    }

    fn close(&mut self) {
        self.rows.clear();
        self.state = CursorState::Closed;
    }
}
