//! Binding merge cursor
//!
//! Splices a remote result stream back into the surrounding evaluation:
//! each emitted row is the remote solution plus every caller binding the
//! remote solution does not cover. Variables the caller had already
//! resolved outside the delegated subtree therefore survive on every row a
//! downstream operator sees.
//!
//! No conflict resolution is needed: a remote solution only binds variables
//! from the owning node's declared set, and caller values for those
//! variables were bound onto the remote query before execution, so the
//! member already honored them.

use crate::cursor::{Cursor, CursorState};
use crate::error::{EvaluationError, Result};
use async_trait::async_trait;
use meridian_connection::SolutionStream;
use meridian_core::{Binding, Row, VarId};
use std::collections::HashMap;
use std::sync::Arc;

/// Cursor merging caller bindings into a remote result stream
pub struct MergeCursor {
    stream: Box<dyn SolutionStream>,
    member: Arc<str>,
    schema: Arc<[VarId]>,
    /// Caller row widened to the output schema; template for every emitted row
    base: Vec<Binding>,
    /// Remote variable name → output schema slot, for the declared set only
    slot_by_name: HashMap<Arc<str>, usize>,
    state: CursorState,
}

impl MergeCursor {
    /// Create a merge cursor
    ///
    /// `schema` is the output schema (caller schema ∪ declared variables);
    /// `declared` maps the owning node's variables to their member-visible
    /// names.
    pub fn new(
        stream: Box<dyn SolutionStream>,
        caller: &Row,
        schema: Arc<[VarId]>,
        declared: &[(VarId, Arc<str>)],
        member: Arc<str>,
    ) -> Self {
        let base = schema
            .iter()
            .map(|var| caller.binding(*var).cloned().unwrap_or(Binding::Unbound))
            .collect();
        let slot_by_name = declared
            .iter()
            .filter_map(|(var, name)| {
                schema
                    .iter()
                    .position(|v| v == var)
                    .map(|slot| (name.clone(), slot))
            })
            .collect();
        Self {
            stream,
            member,
            schema,
            base,
            slot_by_name,
            state: CursorState::Created,
        }
    }
}

#[async_trait]
impl Cursor for MergeCursor {
    fn schema(&self) -> &[VarId] {
        &self.schema
    }

    async fn next(&mut self) -> Result<Option<Row>> {
        if !self.state.can_advance() {
            return Ok(None);
        }
        match self.stream.next().await {
            Ok(Some(solution)) => {
                self.state = CursorState::Streaming;
                let mut values = self.base.clone();
                for (name, term) in solution {
                    match self.slot_by_name.get(&name) {
                        Some(&slot) => values[slot] = Binding::Bound(term),
                        None => {
                            // Members must only return declared variables.
                            tracing::debug!(
                                member = %self.member,
                                variable = %name,
                                "ignoring undeclared variable in remote solution"
                            );
                        }
                    }
                }
                match Row::new(self.schema.clone(), values) {
                    Ok(row) => Ok(Some(row)),
                    Err(e) => {
                        self.stream.close();
                        self.state = CursorState::Failed;
                        Err(e.into())
                    }
                }
            }
            Ok(None) => {
                // Release the remote stream as soon as it is drained.
                self.stream.close();
                self.state = CursorState::Exhausted;
                Ok(None)
            }
            Err(source) => {
                self.stream.close();
                self.state = CursorState::Failed;
                Err(EvaluationError::Stream {
                    member: self.member.to_string(),
                    source,
                })
            }
        }
    }

    fn close(&mut self) {
        if self.state.can_advance() {
            self.stream.close();
        }
        self.state = CursorState::Closed;
    }
}
