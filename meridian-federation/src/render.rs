//! Render algebra subtrees into wire requests
//!
//! The serializer boundary: converts an owned subtree plus the variable
//! registry into the [`QueryRequest`] form members understand. Members speak
//! variable *names*, so rendering is where compact ids turn back into
//! names.
//!
//! Only basic graph patterns are renderable. An owner wrapped around any
//! other shape fails to render, which the owned node treats like a member
//! that cannot evaluate the subtree: the node degrades to an empty
//! contributor instead of failing the plan.

use crate::algebra::{Algebra, TermPattern, TriplePattern};
use meridian_connection::{PatternRequest, QueryRequest, TermOrVar};
use meridian_core::VarRegistry;
use thiserror::Error;

/// Errors turning a subtree into a wire request
#[derive(Error, Debug)]
pub enum RenderError {
    /// The subtree shape has no wire representation
    #[error("subtree shape not renderable: {0}")]
    Unsupported(&'static str),

    /// A pattern variable is missing from the registry
    #[error(transparent)]
    UnknownVariable(#[from] meridian_core::Error),
}

/// Render an algebra subtree into the request format members understand
pub fn render(algebra: &Algebra, vars: &VarRegistry) -> Result<QueryRequest, RenderError> {
    match algebra {
        Algebra::Bgp(bgp) => {
            let patterns = bgp
                .patterns()
                .iter()
                .map(|p| render_pattern(p, vars))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(QueryRequest::new(patterns))
        }
        Algebra::Filter(_) => Err(RenderError::Unsupported(
            "filters are re-applied locally, not shipped",
        )),
        Algebra::Owned(_) => Err(RenderError::Unsupported(
            "nested ownership annotations",
        )),
    }
}

fn render_pattern(
    pattern: &TriplePattern,
    vars: &VarRegistry,
) -> Result<PatternRequest, RenderError> {
    Ok(PatternRequest {
        subject: render_position(&pattern.subject, vars)?,
        predicate: render_position(&pattern.predicate, vars)?,
        object: render_position(&pattern.object, vars)?,
    })
}

fn render_position(
    position: &TermPattern,
    vars: &VarRegistry,
) -> Result<TermOrVar, RenderError> {
    match position {
        TermPattern::Var(var) => Ok(TermOrVar::Var(vars.name(*var)?.to_string())),
        TermPattern::Term(term) => Ok(TermOrVar::Term(term.clone())),
    }
}
