//! Wire request types
//!
//! The request format a member understands: a conjunction of triple patterns
//! with variables referenced by *name*. The federation core's render step
//! produces these from its algebra; members interpret them however they
//! like (translate to SPARQL, match in memory, ...).
//!
//! The types are serde-serializable so transport implementations can ship
//! them as JSON without a hand-written codec.

use meridian_core::Term;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A subject/predicate/object position: a named variable or a concrete term
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TermOrVar {
    /// A variable, by name
    Var(String),
    /// A concrete term
    Term(Term),
}

impl TermOrVar {
    /// Get the variable name, if this position is a variable
    pub fn as_var(&self) -> Option<&str> {
        match self {
            TermOrVar::Var(name) => Some(name),
            TermOrVar::Term(_) => None,
        }
    }
}

/// One triple pattern of a request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternRequest {
    /// Subject position
    pub subject: TermOrVar,
    /// Predicate position
    pub predicate: TermOrVar,
    /// Object position
    pub object: TermOrVar,
}

impl PatternRequest {
    /// Iterate over the variable names this pattern mentions
    pub fn variables(&self) -> impl Iterator<Item = &str> {
        [&self.subject, &self.predicate, &self.object]
            .into_iter()
            .filter_map(|p| p.as_var())
    }
}

/// A prepared-query request: the conjunction of patterns to evaluate
///
/// Every solution a member returns binds only variables that appear in
/// `patterns`; pre-bound variables are seeded through
/// [`PreparedQuery::bind`](crate::PreparedQuery::bind) before execution,
/// not encoded into the request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Triple patterns, evaluated as a conjunction
    pub patterns: Vec<PatternRequest>,
}

impl QueryRequest {
    /// Create a request from patterns
    pub fn new(patterns: Vec<PatternRequest>) -> Self {
        Self { patterns }
    }

    /// All distinct variable names in the request, in first-seen order
    pub fn variables(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for pattern in &self.patterns {
            for name in pattern.variables() {
                if !seen.contains(&name) {
                    seen.push(name);
                }
            }
        }
        seen
    }
}

impl fmt::Display for QueryRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "request[{} patterns]", self.patterns.len())
    }
}
