//! Algebra nodes for annotated plans
//!
//! The optimizer hands this layer a tree whose delegable subtrees are
//! already wrapped in owned nodes. Only the shapes the federation core
//! itself evaluates live here: basic graph patterns (the delegable leaves),
//! filters, and the owned wrapper. Join, union, and projection operators
//! belong to the surrounding engine.
//!
//! # Variable Sets
//!
//! Every node computes the set of variables it can bind once, at
//! construction, and caches it. Evaluation never recomputes a variable set -
//! in particular, an owned node's declared set is a fixed property
//! independent of any evaluation's input bindings.

use crate::expr::Expr;
use crate::owned::OwnedQuery;
use meridian_core::{Term, VarId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// A subject/predicate/object position in a pattern
#[derive(Clone, Debug, PartialEq)]
pub enum TermPattern {
    /// A variable
    Var(VarId),
    /// A concrete term
    Term(Term),
}

impl TermPattern {
    /// Get the variable, if this position is one
    pub fn as_var(&self) -> Option<VarId> {
        match self {
            TermPattern::Var(var) => Some(*var),
            TermPattern::Term(_) => None,
        }
    }
}

/// One triple pattern
#[derive(Clone, Debug, PartialEq)]
pub struct TriplePattern {
    /// Subject position
    pub subject: TermPattern,
    /// Predicate position
    pub predicate: TermPattern,
    /// Object position
    pub object: TermPattern,
}

impl TriplePattern {
    /// Create a triple pattern
    pub fn new(subject: TermPattern, predicate: TermPattern, object: TermPattern) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Iterate over the variables this pattern mentions
    pub fn variables(&self) -> impl Iterator<Item = VarId> + '_ {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(TermPattern::as_var)
    }
}

/// A basic graph pattern: a conjunction of triple patterns
#[derive(Clone, Debug)]
pub struct Bgp {
    patterns: Vec<TriplePattern>,
    variables: BTreeSet<VarId>,
}

impl Bgp {
    /// Create a basic graph pattern, caching its variable set
    pub fn new(patterns: Vec<TriplePattern>) -> Self {
        let variables = patterns
            .iter()
            .flat_map(TriplePattern::variables)
            .collect();
        Self {
            patterns,
            variables,
        }
    }

    /// The triple patterns
    pub fn patterns(&self) -> &[TriplePattern] {
        &self.patterns
    }

    /// The variables this pattern can bind
    pub fn variables(&self) -> &BTreeSet<VarId> {
        &self.variables
    }
}

/// A filter node: a predicate over its child's solutions
///
/// The filter's scope - the variables the predicate may see - is the
/// child's variable set, captured at construction. Embedding the node in a
/// plan that carries extra bindings does not widen the scope.
#[derive(Clone, Debug)]
pub struct FilterNode {
    inner: Box<Algebra>,
    predicate: Expr,
    scope: Arc<BTreeSet<VarId>>,
}

impl FilterNode {
    /// Wrap a child in a filter
    pub fn new(inner: Algebra, predicate: Expr) -> Self {
        let scope = Arc::new(inner.variables().clone());
        Self {
            inner: Box::new(inner),
            predicate,
            scope,
        }
    }

    /// The child node
    pub fn inner(&self) -> &Algebra {
        &self.inner
    }

    /// The predicate
    pub fn predicate(&self) -> &Expr {
        &self.predicate
    }

    /// The declared variable scope the predicate is evaluated under
    pub fn scope(&self) -> &Arc<BTreeSet<VarId>> {
        &self.scope
    }
}

/// An annotated algebra node
#[derive(Clone, Debug)]
pub enum Algebra {
    /// A basic graph pattern, not yet assigned to a member
    Bgp(Bgp),
    /// A filter over a child node
    Filter(FilterNode),
    /// A subtree owned by one member
    Owned(Arc<OwnedQuery>),
}

impl Algebra {
    /// The variables this node can bind (cached per node)
    pub fn variables(&self) -> &BTreeSet<VarId> {
        match self {
            Algebra::Bgp(bgp) => bgp.variables(),
            Algebra::Filter(filter) => filter.inner().variables(),
            Algebra::Owned(owned) => owned.variables(),
        }
    }
}
