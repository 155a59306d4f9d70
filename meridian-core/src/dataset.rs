//! Graph scope for federated queries
//!
//! A `Dataset` restricts which graphs a query may read: a set of default
//! graphs (unioned for ordinary patterns) and a set of named graphs. The
//! evaluation context carries an optional dataset down every evaluation
//! call; an owned subquery applies it to the remote query handle before
//! executing, so the member enforces the same scope the caller sees locally.
//!
//! Graph identifiers are IRI strings (`Arc<str>`), never member-local ids -
//! a graph name must mean the same thing on every member it reaches.

use std::sync::Arc;

/// The set of graphs a query is restricted to read
///
/// Construct with `Dataset::new()` and add graphs with `with_default_graph`
/// and `with_named_graph`. An absent dataset (`Option::None` at the call
/// site) means "no restriction"; an *empty* dataset means "read nothing".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    default_graphs: Vec<Arc<str>>,
    named_graphs: Vec<Arc<str>>,
}

impl Dataset {
    /// Create a new empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a default graph
    pub fn with_default_graph(mut self, iri: impl Into<Arc<str>>) -> Self {
        self.default_graphs.push(iri.into());
        self
    }

    /// Add a named graph
    pub fn with_named_graph(mut self, iri: impl Into<Arc<str>>) -> Self {
        self.named_graphs.push(iri.into());
        self
    }

    /// The default graphs, unioned for ordinary patterns
    pub fn default_graphs(&self) -> &[Arc<str>] {
        &self.default_graphs
    }

    /// The named graphs
    pub fn named_graphs(&self) -> &[Arc<str>] {
        &self.named_graphs
    }

    /// Check if a graph is one of the default graphs
    pub fn has_default_graph(&self, iri: &str) -> bool {
        self.default_graphs.iter().any(|g| g.as_ref() == iri)
    }

    /// Check if a graph is one of the named graphs
    pub fn has_named_graph(&self, iri: &str) -> bool {
        self.named_graphs.iter().any(|g| g.as_ref() == iri)
    }

    /// Check if the dataset lists no graphs at all
    pub fn is_empty(&self) -> bool {
        self.default_graphs.is_empty() && self.named_graphs.is_empty()
    }
}
