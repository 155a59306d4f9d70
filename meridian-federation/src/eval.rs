//! Evaluation strategy over annotated trees
//!
//! Walks the optimizer's output and turns it into a cursor chain: owned
//! nodes delegate to their member, filter nodes wrap their child in a
//! scoped filter cursor. This layer performs no ownership inference - a
//! bare graph pattern reaching the evaluator means the plan was never
//! annotated, which is a caller error, not something to paper over.

use crate::algebra::Algebra;
use crate::context::EvaluationContext;
use crate::cursor::BoxedCursor;
use crate::error::{EvaluationError, Result};
use crate::filter::FilterCursor;
use meridian_core::Row;
use std::future::Future;
use std::pin::Pin;

/// Evaluate an annotated subtree for one input row
///
/// The returned cursor's rows carry the input row's bindings merged with
/// whatever the subtree produced; downstream operators consume it like any
/// other cursor.
pub fn evaluate<'a>(
    algebra: &'a Algebra,
    ctx: &'a EvaluationContext<'a>,
    input: &'a Row,
) -> Pin<Box<dyn Future<Output = Result<BoxedCursor>> + Send + 'a>> {
    Box::pin(async move {
        match algebra {
            Algebra::Owned(node) => node.evaluate(ctx, input).await,
            Algebra::Filter(filter) => {
                let upstream = evaluate(filter.inner(), ctx, input).await?;
                Ok(Box::new(FilterCursor::new(
                    upstream,
                    filter.predicate().clone(),
                    filter.scope().clone(),
                )) as BoxedCursor)
            }
            Algebra::Bgp(_) => Err(EvaluationError::NoOwner),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::{Bgp, TermPattern, TriplePattern};
    use meridian_core::{Term, VarRegistry};

    #[tokio::test]
    async fn test_unowned_subtree_is_rejected() {
        let mut vars = VarRegistry::new();
        let s = vars.get_or_insert("?s");
        let bgp = Algebra::Bgp(Bgp::new(vec![TriplePattern::new(
            TermPattern::Var(s),
            TermPattern::Term(Term::iri("http://ex.org/p")),
            TermPattern::Term(Term::integer(1)),
        )]));
        let ctx = EvaluationContext::new(&vars);
        let input = Row::empty();
        let result = evaluate(&bgp, &ctx, &input).await;
        assert!(matches!(result, Err(EvaluationError::NoOwner)));
    }
}
