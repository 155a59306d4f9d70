//! # Meridian Connection
//!
//! The member-connection boundary of the federation layer.
//!
//! A federation member is an independent repository reachable through a
//! query-capable connection. This crate defines the contract the federation
//! core evaluates against:
//!
//! - [`MemberConnection`]: prepares a [`QueryRequest`] into a reusable
//!   [`PreparedQuery`] handle
//! - [`PreparedQuery`]: carries mutable binding/dataset state between
//!   executions of the same remote query
//! - [`SolutionStream`]: the raw, closeable stream of remote solutions
//!
//! Transport, authentication, and wire encoding live behind
//! `MemberConnection` implementations and are of no concern here.
//! [`MemoryMember`] is the in-process implementation, used by tests and
//! embedders the same way a remote member would be.

pub mod config;
pub mod connection;
pub mod error;
pub mod memory;
pub mod request;

pub use config::MemberConfig;
pub use connection::{MemberConnection, PreparedQuery, RemoteSolution, SolutionStream};
pub use error::{ConnectionError, Result};
pub use memory::{MemoryMember, Triple};
pub use request::{PatternRequest, QueryRequest, TermOrVar};
