//! Filter-scoped evaluation cursor
//!
//! Re-applies a predicate over an upstream cursor, restricted to a declared
//! variable scope. The upstream may carry bindings the predicate's relation
//! never exposed (outer-scope variables passed through a merge); the scope
//! keeps the predicate evaluator from misreading them as part of its
//! relation.
//!
//! Standard three-valued filter semantics: a row passes only when the
//! predicate is defined-true under the scope. False, undefined, and
//! predicate type errors all drop the row - a type error is not an
//! evaluation failure.

use crate::cursor::{BoxedCursor, Cursor, CursorState};
use crate::error::Result;
use crate::expr::{evaluate, Expr, ScopedRow};
use async_trait::async_trait;
use meridian_core::{Row, VarId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Cursor applying a scoped predicate to an upstream cursor
pub struct FilterCursor {
    upstream: BoxedCursor,
    predicate: Expr,
    scope: Arc<BTreeSet<VarId>>,
    state: CursorState,
}

impl FilterCursor {
    /// Wrap an upstream cursor; this cursor owns closing it
    pub fn new(upstream: BoxedCursor, predicate: Expr, scope: Arc<BTreeSet<VarId>>) -> Self {
        Self {
            upstream,
            predicate,
            scope,
            state: CursorState::Created,
        }
    }
}

#[async_trait]
impl Cursor for FilterCursor {
    fn schema(&self) -> &[VarId] {
        self.upstream.schema()
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.can_advance() {
            return Ok(None);
        }
        loop {
            match self.upstream.next().await {
                Ok(Some(row)) => {
                    self.state = CursorState::Streaming;
                    match evaluate(&self.predicate, &ScopedRow::scoped(&row, &self.scope)) {
                        Ok(Some(true)) => return Ok(Some(row)),
                        Ok(Some(false)) | Ok(None) => {}
                        Err(type_error) => {
                            tracing::trace!(error = %type_error, "filter type error; dropping row");
                        }
                    }
                }
                Ok(None) => {
                    self.upstream.close();
                    self.state = CursorState::Exhausted;
                    return Ok(None);
                }
                Err(e) => {
                    self.upstream.close();
                    self.state = CursorState::Failed;
                    return Err(e);
                }
            }
        }
    }

    fn close(&mut self) {
        if self.state.can_advance() {
            self.upstream.close();
        }
        self.state = CursorState::Closed;
    }
}
