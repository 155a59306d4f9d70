//! Owned subquery node
//!
//! The ownership wrapper around a delegated subtree: the optimizer decided
//! this subtree's data lives entirely on one member, so evaluation ships it
//! there and splices the streamed results back in through a merge cursor.
//!
//! # Handle Reuse
//!
//! The node creates its remote prepared-query handle lazily, on first
//! evaluation, and reuses it for every later evaluation - under nested-loop
//! joins the same node is re-evaluated once per outer row, and re-preparing
//! each time would defeat the point of preparation. The handle carries
//! mutable binding state between calls, so `bind` → `set_dataset` →
//! `execute` runs as one critical section under the per-node lock.
//!
//! The lock is released once `execute` returns the stream object, not once
//! the stream is drained: holding it for a whole stream's lifetime would
//! serialize consumers that only needed the handle for a moment. The cost
//! is that a later evaluation may rebind the handle while an earlier
//! stream is still open - the reuse contract on
//! [`PreparedQuery`](meridian_connection::PreparedQuery) requires
//! implementations to snapshot bound values at execute time for exactly
//! this reason.
//!
//! # Degraded Members
//!
//! A member that cannot be reached, or cannot evaluate the subtree, leaves
//! the node without a usable delegate. Evaluation then yields an empty
//! cursor instead of failing the plan: other federation strategies may
//! recover the same data through a non-owned path. The failure is cached so
//! an unreachable member is not re-dialed once per outer probe.

use crate::algebra::Algebra;
use crate::context::EvaluationContext;
use crate::cursor::{BoxedCursor, EmptyCursor};
use crate::error::{EvaluationError, Result};
use crate::merge::MergeCursor;
use crate::render::render;
use meridian_connection::{ConnectionError, MemberConnection, PreparedQuery};
use meridian_core::{Row, VarId, VarRegistry};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Lazily-created remote delegate of an owned node
enum PrepareState {
    /// No preparation attempted yet
    Pending,
    /// Prepared handle, reused by every evaluation
    Ready(Box<dyn PreparedQuery>),
    /// Preparation failed; the node contributes no solutions
    Unavailable,
}

/// An algebra subtree owned by one member
pub struct OwnedQuery {
    member: Arc<dyn MemberConnection>,
    endpoint: Arc<str>,
    subtree: Algebra,
    /// Declared variable set; fixed at construction, never recomputed
    variables: BTreeSet<VarId>,
    /// Declared variables with their member-visible names
    declared: Arc<[(VarId, Arc<str>)]>,
    state: Mutex<PrepareState>,
}

impl OwnedQuery {
    /// Wrap a subtree with its owning member
    ///
    /// Resolves the subtree's variable names eagerly so the declared set is
    /// a fixed property of the node.
    pub fn new(
        member: Arc<dyn MemberConnection>,
        subtree: Algebra,
        vars: &VarRegistry,
    ) -> Result<Self> {
        let variables = subtree.variables().clone();
        let declared = variables
            .iter()
            .map(|var| Ok((*var, vars.name(*var)?.clone())))
            .collect::<meridian_core::Result<Vec<_>>>()?;
        let endpoint = Arc::from(member.endpoint());
        Ok(Self {
            member,
            endpoint,
            subtree,
            variables,
            declared: declared.into(),
            state: Mutex::new(PrepareState::Pending),
        })
    }

    /// The member this subtree is owned by
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The declared variable set
    pub fn variables(&self) -> &BTreeSet<VarId> {
        &self.variables
    }

    /// The wrapped subtree
    pub fn subtree(&self) -> &Algebra {
        &self.subtree
    }

    /// Output schema for an evaluation: caller variables, then declared
    /// variables the caller does not carry
    fn output_schema(&self, caller: &Row) -> Arc<[VarId]> {
        caller
            .schema()
            .iter()
            .copied()
            .chain(
                self.variables
                    .iter()
                    .copied()
                    .filter(|var| !caller.schema().contains(var)),
            )
            .collect()
    }

    /// Render and prepare the subtree on the owning member
    async fn try_prepare(
        &self,
        ctx: &EvaluationContext<'_>,
    ) -> meridian_connection::Result<Box<dyn PreparedQuery>> {
        let request = render(&self.subtree, ctx.vars)
            .map_err(|e| ConnectionError::Unsupported(e.to_string()))?;
        self.member.prepare(&request).await
    }

    /// Evaluate the owned subtree for one caller row
    ///
    /// Returns a cursor whose rows carry the caller's bindings merged with
    /// the remote solutions. Preparation failure degrades to an empty
    /// cursor; binding and execution failures surface as errors.
    pub async fn evaluate(
        &self,
        ctx: &EvaluationContext<'_>,
        caller: &Row,
    ) -> Result<BoxedCursor> {
        let schema = self.output_schema(caller);

        let mut state = self.state.lock().await;
        if matches!(*state, PrepareState::Pending) {
            match self.try_prepare(ctx).await {
                Ok(handle) => *state = PrepareState::Ready(handle),
                Err(e) => {
                    tracing::warn!(
                        member = %self.endpoint,
                        error = %e,
                        "member preparation failed; owned subtree contributes no solutions"
                    );
                    *state = PrepareState::Unavailable;
                }
            }
        }
        let handle = match &mut *state {
            PrepareState::Ready(handle) => handle,
            _ => {
                tracing::debug!(member = %self.endpoint, "owned subtree has no usable delegate");
                return Ok(Box::new(EmptyCursor::new(schema)));
            }
        };

        // Critical section: the handle carries binding state between
        // evaluations, so bind → set_dataset → execute must not interleave
        // with a concurrent evaluation of this node.
        handle.clear_bindings();
        for (var, name) in self.declared.iter() {
            if let Some(term) = caller.get(*var) {
                handle
                    .bind(name, term.clone())
                    .map_err(|source| EvaluationError::Bind {
                        member: self.endpoint.to_string(),
                        name: name.to_string(),
                        source,
                    })?;
            }
        }
        handle
            .set_dataset(ctx.dataset)
            .map_err(|source| EvaluationError::Dataset {
                member: self.endpoint.to_string(),
                source,
            })?;
        let stream = handle
            .execute()
            .await
            .map_err(|source| EvaluationError::Execute {
                member: self.endpoint.to_string(),
                source,
            })?;
        drop(state); // the stream object exists; draining happens outside the lock

        Ok(Box::new(MergeCursor::new(
            stream,
            caller,
            schema,
            &self.declared,
            self.endpoint.clone(),
        )))
    }
}

impl std::fmt::Debug for OwnedQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OwnedQuery")
            .field("member", &self.endpoint)
            .field("variables", &self.variables)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Bgp, TermPattern, TriplePattern};
    use meridian_connection::{MemoryMember, QueryRequest};
    use meridian_core::{Binding, Term};

    struct UnreachableMember;

    #[async_trait::async_trait]
    impl MemberConnection for UnreachableMember {
        fn endpoint(&self) -> &str {
            "mem://down"
        }

        async fn prepare(
            &self,
            _: &QueryRequest,
        ) -> meridian_connection::Result<Box<dyn PreparedQuery>> {
            Err(ConnectionError::Unreachable("connection refused".to_string()))
        }
    }

    fn knows_subtree(vars: &mut VarRegistry) -> Algebra {
        let s = vars.get_or_insert("?s");
        let o = vars.get_or_insert("?o");
        Algebra::Bgp(Bgp::new(vec![TriplePattern::new(
            TermPattern::Var(s),
            TermPattern::Term(Term::iri("http://ex.org/knows")),
            TermPattern::Var(o),
        )]))
    }

    #[tokio::test]
    async fn test_declared_set_is_fixed() {
        let mut vars = VarRegistry::new();
        let subtree = knows_subtree(&mut vars);
        let member = Arc::new(MemoryMember::new("mem://people"));
        let node = OwnedQuery::new(member, subtree, &vars).unwrap();
        let expected: BTreeSet<VarId> = [vars.get("?s").unwrap(), vars.get("?o").unwrap()]
            .into_iter()
            .collect();
        assert_eq!(*node.variables(), expected);

        // Evaluations with different caller rows leave the set untouched.
        let ctx = EvaluationContext::new(&vars);
        let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
        while cursor.next().await.unwrap().is_some() {}
        assert_eq!(*node.variables(), expected);
    }

    #[tokio::test]
    async fn test_unreachable_member_degrades_to_empty() {
        let mut vars = VarRegistry::new();
        let subtree = knows_subtree(&mut vars);
        let node = OwnedQuery::new(Arc::new(UnreachableMember), subtree, &vars).unwrap();
        let ctx = EvaluationContext::new(&vars);
        let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
        assert!(cursor.next().await.unwrap().is_none());
        // Second evaluation hits the cached failure, same degraded result.
        let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
        assert!(cursor.next().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_caller_binding_seeds_remote_query() {
        let mut vars = VarRegistry::new();
        let subtree = knows_subtree(&mut vars);
        let s = vars.get("?s").unwrap();
        let o = vars.get("?o").unwrap();

        let member = MemoryMember::new("mem://people");
        member.insert(
            Term::iri("http://ex.org/alice"),
            Term::iri("http://ex.org/knows"),
            Term::iri("http://ex.org/bob"),
        );
        member.insert(
            Term::iri("http://ex.org/bob"),
            Term::iri("http://ex.org/knows"),
            Term::iri("http://ex.org/carol"),
        );

        let node = OwnedQuery::new(Arc::new(member), subtree, &vars).unwrap();
        let ctx = EvaluationContext::new(&vars);

        let caller_schema: Arc<[VarId]> = [s].into_iter().collect();
        let caller = Row::new(
            caller_schema,
            vec![Binding::Bound(Term::iri("http://ex.org/bob"))],
        )
        .unwrap();

        let mut cursor = node.evaluate(&ctx, &caller).await.unwrap();
        let row = cursor.next().await.unwrap().unwrap();
        assert_eq!(row.get(s), Some(&Term::iri("http://ex.org/bob")));
        assert_eq!(row.get(o), Some(&Term::iri("http://ex.org/carol")));
        assert!(cursor.next().await.unwrap().is_none());
    }
}
