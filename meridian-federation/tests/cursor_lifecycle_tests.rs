//! Resource-safety tests: remote streams are released on every path a
//! cursor chain can take - exhaustion, early close, transitive close, and
//! failure.

mod support;

use meridian_connection::MemberConnection;
use meridian_core::{Row, Term, VarRegistry};
use meridian_federation::{
    evaluate, Algebra, Bgp, EvaluationContext, EvaluationError, Expr, FilterNode, OwnedQuery,
    TermPattern, TriplePattern,
};
use std::sync::Arc;
use support::{people_member, FailureMode, RecordingMember};

fn knows_node(
    vars: &mut VarRegistry,
    member: Arc<RecordingMember>,
) -> OwnedQuery {
    let s = vars.get_or_insert("?s");
    let o = vars.get_or_insert("?o");
    let subtree = Algebra::Bgp(Bgp::new(vec![TriplePattern::new(
        TermPattern::Var(s),
        TermPattern::Term(Term::iri("http://ex.org/knows")),
        TermPattern::Var(o),
    )]));
    OwnedQuery::new(member as Arc<dyn MemberConnection>, subtree, vars).unwrap()
}

/// Draining a merge cursor to exhaustion releases the remote stream
/// without an explicit close.
#[tokio::test]
async fn test_exhaustion_releases_stream() {
    let mut vars = VarRegistry::new();
    let member = Arc::new(RecordingMember::new(people_member()));
    let node = knows_node(&mut vars, Arc::clone(&member));

    let ctx = EvaluationContext::new(&vars);
    let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
    while cursor.next().await.unwrap().is_some() {}
    assert_eq!(member.open_streams(), 0);
}

/// Closing before exhaustion releases the remote stream immediately.
#[tokio::test]
async fn test_early_close_releases_stream() {
    let mut vars = VarRegistry::new();
    let member = Arc::new(RecordingMember::new(people_member()));
    let node = knows_node(&mut vars, Arc::clone(&member));

    let ctx = EvaluationContext::new(&vars);
    let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
    // Consume one of the two rows, then abandon the rest.
    assert!(cursor.next().await.unwrap().is_some());
    assert_eq!(member.open_streams(), 1);
    cursor.close();
    assert_eq!(member.open_streams(), 0);
    // Closed cursors stay silent, and closing again is a no-op.
    assert!(cursor.next().await.unwrap().is_none());
    cursor.close();
    assert_eq!(member.open_streams(), 0);
}

/// Closing the outermost cursor of a chain closes every intermediate
/// cursor down to the remote stream.
#[tokio::test]
async fn test_close_propagates_through_chain() {
    let mut vars = VarRegistry::new();
    let s = vars.get_or_insert("?s");
    let o = vars.get_or_insert("?o");
    let member = Arc::new(RecordingMember::new(people_member()));

    let subtree = Algebra::Bgp(Bgp::new(vec![TriplePattern::new(
        TermPattern::Var(s),
        TermPattern::Term(Term::iri("http://ex.org/knows")),
        TermPattern::Var(o),
    )]));
    let owned = Algebra::Owned(Arc::new(
        OwnedQuery::new(
            Arc::clone(&member) as Arc<dyn MemberConnection>,
            subtree,
            &vars,
        )
        .unwrap(),
    ));
    // A filter that passes everything, stacked on the merge cursor.
    let plan = Algebra::Filter(FilterNode::new(owned, Expr::Bound(s)));

    let ctx = EvaluationContext::new(&vars);
    let input = Row::empty();
    let mut cursor = evaluate(&plan, &ctx, &input).await.unwrap();
    assert!(cursor.next().await.unwrap().is_some());
    assert_eq!(member.open_streams(), 1);
    cursor.close();
    assert_eq!(member.open_streams(), 0);
    cursor.close();
}

/// A remote execution failure surfaces as an evaluation error and does not
/// leak a stream; the handle itself stays usable for later evaluations.
#[tokio::test]
async fn test_execute_failure_surfaces_and_recovers() {
    let mut vars = VarRegistry::new();
    let member = Arc::new(RecordingMember::new(people_member()));
    let node = knows_node(&mut vars, Arc::clone(&member));
    let ctx = EvaluationContext::new(&vars);

    member.set_mode(FailureMode::FailExecute);
    let err = node.evaluate(&ctx, &Row::empty()).await.unwrap_err();
    assert!(matches!(err, EvaluationError::Execute { .. }));
    assert_eq!(member.open_streams(), 0);

    // The failure was not cached: once the member recovers, the same
    // prepared handle serves the next evaluation.
    member.set_mode(FailureMode::None);
    let mut cursor = node.evaluate(&ctx, &Row::empty()).await.unwrap();
    let mut count = 0;
    while cursor.next().await.unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 2);
    assert_eq!(member.prepare_count(), 1);
}

/// Errors are wrapped in the federation error kind with the raw connection
/// failure as the cause, not surfaced as member exception types.
#[tokio::test]
async fn test_errors_carry_cause_chain() {
    let mut vars = VarRegistry::new();
    let member = Arc::new(RecordingMember::new(people_member()));
    let node = knows_node(&mut vars, Arc::clone(&member));
    let ctx = EvaluationContext::new(&vars);

    member.set_mode(FailureMode::FailExecute);
    let err = node.evaluate(&ctx, &Row::empty()).await.unwrap_err();
    let source = std::error::Error::source(&err).expect("cause chain");
    assert!(source.to_string().contains("injected"));
}
