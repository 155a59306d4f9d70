//! Evaluation context
//!
//! Read-only state threaded through every evaluation call: the variable
//! registry (for name↔id mapping at the member boundary) and the optional
//! graph scope. The context borrows - it is rebuilt per query, not stored.

use meridian_core::{Dataset, VarRegistry};

/// Per-query evaluation context
#[derive(Clone, Copy, Debug)]
pub struct EvaluationContext<'a> {
    /// Variable registry, frozen after planning
    pub vars: &'a VarRegistry,
    /// Graph scope restriction, if any
    pub dataset: Option<&'a Dataset>,
}

impl<'a> EvaluationContext<'a> {
    /// Create a context with no graph scope restriction
    pub fn new(vars: &'a VarRegistry) -> Self {
        Self {
            vars,
            dataset: None,
        }
    }

    /// Restrict the context to a dataset
    pub fn with_dataset(mut self, dataset: &'a Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }
}
