//! Solution rows
//!
//! A `Row` is one solution flowing through a cursor: a fixed schema of
//! variables plus one binding per schema slot. Rows are immutable once a
//! cursor step produced them; combining rows always builds a new one.
//!
//! # Schema Contract
//!
//! - `schema()` lists the variables this row can bind, fixed at construction
//! - schemas contain no duplicate VarIds
//! - a variable absent from the schema is indistinguishable from an unbound
//!   one for callers: `get` answers `None` for both

use crate::error::{Error, Result};
use crate::term::Term;
use crate::var_registry::VarId;
use std::sync::Arc;

/// A binding slot in a row
#[derive(Clone, Debug, PartialEq)]
pub enum Binding {
    /// Variable is not bound in this solution
    Unbound,
    /// Variable is bound to a term
    Bound(Term),
}

impl Binding {
    /// Get the bound term, if any
    pub fn term(&self) -> Option<&Term> {
        match self {
            Binding::Bound(term) => Some(term),
            Binding::Unbound => None,
        }
    }

    /// Check if this slot is bound
    pub fn is_bound(&self) -> bool {
        matches!(self, Binding::Bound(_))
    }
}

/// One immutable solution: schema + bindings
///
/// Cloning is cheap (two `Arc` bumps), so cursors hand rows around by value.
#[derive(Clone, Debug, PartialEq)]
pub struct Row {
    schema: Arc<[VarId]>,
    values: Arc<[Binding]>,
}

impl Row {
    /// Create a row from a schema and one binding per slot
    ///
    /// Fails if the arity does not match or the schema repeats a variable.
    pub fn new(schema: Arc<[VarId]>, values: Vec<Binding>) -> Result<Self> {
        if values.len() != schema.len() {
            return Err(Error::RowArity {
                expected: schema.len(),
                actual: values.len(),
            });
        }
        for (i, var) in schema.iter().enumerate() {
            if schema[..i].contains(var) {
                return Err(Error::DuplicateVariable(format!("{var:?}")));
            }
        }
        Ok(Self {
            schema,
            values: values.into(),
        })
    }

    /// Create a row with every slot unbound
    pub fn unbound(schema: Arc<[VarId]>) -> Self {
        let values = vec![Binding::Unbound; schema.len()];
        Self {
            schema,
            values: values.into(),
        }
    }

    /// The empty row: no variables, no bindings
    pub fn empty() -> Self {
        Self {
            schema: Arc::from(Vec::new()),
            values: Arc::from(Vec::new()),
        }
    }

    /// The variables this row can bind
    pub fn schema(&self) -> &Arc<[VarId]> {
        &self.schema
    }

    /// Get the term bound to a variable
    ///
    /// `None` if the variable is unbound or not in the schema.
    pub fn get(&self, var: VarId) -> Option<&Term> {
        let slot = self.schema.iter().position(|v| *v == var)?;
        self.values[slot].term()
    }

    /// Get the binding slot for a variable, if it is in the schema
    pub fn binding(&self, var: VarId) -> Option<&Binding> {
        let slot = self.schema.iter().position(|v| *v == var)?;
        Some(&self.values[slot])
    }

    /// Check if a variable is bound in this row
    pub fn is_bound(&self, var: VarId) -> bool {
        self.get(var).is_some()
    }

    /// Iterate over (variable, term) pairs for the bound slots
    pub fn bound_vars(&self) -> impl Iterator<Item = (VarId, &Term)> {
        self.schema
            .iter()
            .zip(self.values.iter())
            .filter_map(|(var, binding)| binding.term().map(|t| (*var, t)))
    }

    /// Check join compatibility: the rows agree on every shared bound variable
    pub fn compatible_with(&self, other: &Row) -> bool {
        self.bound_vars()
            .all(|(var, term)| match other.get(var) {
                Some(other_term) => term == other_term,
                None => true,
            })
    }
}
