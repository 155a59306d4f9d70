//! # Meridian Core
//!
//! Shared types for the meridian federation layer.
//!
//! This crate provides:
//! - `Term`: the RDF value model (IRI, blank node, literal)
//! - `VarId` / `VarRegistry`: compact variable identifiers interned per query
//! - `Row`: one immutable solution (schema + bindings)
//! - `Dataset`: the graph scope a query is restricted to read
//!
//! ## Design Principles
//!
//! 1. **Cheap to clone**: terms and rows are `Arc`-backed; cloning a row in a
//!    cursor step is a pointer bump, not a deep copy
//! 2. **Immutable solutions**: a `Row` never changes after a cursor produced
//!    it, so rows can be shared freely across evaluation threads
//! 3. **No runtime dependency**: this crate is synchronous data-model code;
//!    async lives in the connection and federation crates

pub mod dataset;
pub mod error;
pub mod row;
pub mod term;
pub mod var_registry;
pub mod vocab;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use row::{Binding, Row};
pub use term::Term;
pub use var_registry::{VarId, VarRegistry};
