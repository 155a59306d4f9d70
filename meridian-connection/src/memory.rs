//! In-memory federation member
//!
//! `MemoryMember` is a complete `MemberConnection` over an in-process triple
//! store. It fills the role an embedded repository plays in a deployment and
//! is the reference implementation of the reuse contract: solutions are
//! materialized inside `execute`, so a stream is immune to later `bind`
//! calls on the same handle.
//!
//! # Graph Model
//!
//! Triples live in a base graph plus any number of named graphs. Without a
//! dataset, a query reads the whole store (base + all named graphs). With a
//! dataset, it reads exactly the union of the graphs listed as default
//! graphs; the base graph has no IRI and is therefore out of reach of any
//! dataset-restricted query.

use crate::config::MemberConfig;
use crate::connection::{MemberConnection, PreparedQuery, RemoteSolution, SolutionStream};
use crate::error::{ConnectionError, Result};
use crate::request::{PatternRequest, QueryRequest, TermOrVar};
use async_trait::async_trait;
use meridian_core::{Dataset, Term};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, RwLock};

/// One triple of a member's store
#[derive(Clone, Debug, PartialEq)]
pub struct Triple {
    /// Subject term
    pub subject: Term,
    /// Predicate term
    pub predicate: Term,
    /// Object term
    pub object: Term,
}

impl Triple {
    /// Create a triple
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

#[derive(Debug, Default)]
struct Store {
    base: Vec<Triple>,
    named: HashMap<Arc<str>, Vec<Triple>>,
}

impl Store {
    /// Collect the triples visible under the given graph scope
    fn scope(&self, dataset: Option<&Dataset>) -> Vec<Triple> {
        match dataset {
            None => {
                let mut all = self.base.clone();
                for triples in self.named.values() {
                    all.extend(triples.iter().cloned());
                }
                all
            }
            Some(ds) => {
                let mut scoped = Vec::new();
                for iri in ds.default_graphs() {
                    if let Some(triples) = self.named.get(iri) {
                        scoped.extend(triples.iter().cloned());
                    }
                }
                scoped
            }
        }
    }
}

/// In-memory member connection
#[derive(Debug)]
pub struct MemoryMember {
    config: MemberConfig,
    store: Arc<RwLock<Store>>,
}

impl MemoryMember {
    /// Create an empty member identified by `endpoint`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_config(MemberConfig::new(endpoint))
    }

    /// Create an empty member from a config
    pub fn with_config(config: MemberConfig) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(Store::default())),
        }
    }

    /// Insert a triple into the base graph
    pub fn insert(&self, subject: Term, predicate: Term, object: Term) {
        let mut store = self.store.write().expect("member store poisoned");
        store.base.push(Triple::new(subject, predicate, object));
    }

    /// Insert a triple into a named graph
    pub fn insert_named(
        &self,
        graph: impl Into<Arc<str>>,
        subject: Term,
        predicate: Term,
        object: Term,
    ) {
        let mut store = self.store.write().expect("member store poisoned");
        store
            .named
            .entry(graph.into())
            .or_default()
            .push(Triple::new(subject, predicate, object));
    }

    /// Number of triples across all graphs
    pub fn len(&self) -> usize {
        let store = self.store.read().expect("member store poisoned");
        store.base.len() + store.named.values().map(Vec::len).sum::<usize>()
    }

    /// Check if the member holds no triples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl MemberConnection for MemoryMember {
    fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    async fn prepare(&self, request: &QueryRequest) -> Result<Box<dyn PreparedQuery>> {
        if request.patterns.is_empty() {
            return Err(ConnectionError::Unsupported(
                "empty pattern conjunction".to_string(),
            ));
        }
        let known: Vec<String> = request.variables().iter().map(|v| v.to_string()).collect();
        tracing::trace!(
            endpoint = %self.config.endpoint,
            patterns = request.patterns.len(),
            "prepared in-memory query"
        );
        Ok(Box::new(MemoryPreparedQuery {
            request: request.clone(),
            known_variables: known,
            store: Arc::clone(&self.store),
            bindings: HashMap::new(),
            dataset: None,
        }))
    }
}

/// Prepared query over a memory member
struct MemoryPreparedQuery {
    request: QueryRequest,
    known_variables: Vec<String>,
    store: Arc<RwLock<Store>>,
    bindings: HashMap<Arc<str>, Term>,
    dataset: Option<Dataset>,
}

#[async_trait]
impl PreparedQuery for MemoryPreparedQuery {
    fn bind(&mut self, name: &str, term: Term) -> Result<()> {
        if !self.known_variables.iter().any(|v| v == name) {
            return Err(ConnectionError::InvalidBinding {
                name: name.to_string(),
                reason: "variable does not occur in the prepared request".to_string(),
            });
        }
        self.bindings.insert(Arc::from(name), term);
        Ok(())
    }

    fn clear_bindings(&mut self) {
        self.bindings.clear();
    }

    fn set_dataset(&mut self, dataset: Option<&Dataset>) -> Result<()> {
        self.dataset = dataset.cloned();
        Ok(())
    }

    async fn execute(&mut self) -> Result<Box<dyn SolutionStream>> {
        // Materializing here is what makes the handle safe to rebind while
        // an earlier stream is still being drained.
        let scope = {
            let store = self.store.read().expect("member store poisoned");
            store.scope(self.dataset.as_ref())
        };
        let mut solutions = Vec::new();
        match_patterns(
            &scope,
            &self.request.patterns,
            self.bindings.clone(),
            &mut solutions,
        );
        tracing::trace!(solutions = solutions.len(), "executed in-memory query");
        Ok(Box::new(MemorySolutionStream {
            solutions: solutions.into_iter().map(to_remote_solution).collect(),
            closed: false,
        }))
    }
}

fn to_remote_solution(bindings: HashMap<Arc<str>, Term>) -> RemoteSolution {
    let mut pairs: Vec<(Arc<str>, Term)> = bindings.into_iter().collect();
    pairs.sort_by(|(a, _), (b, _)| a.cmp(b));
    pairs
}

/// Recursive conjunction matcher over the scoped triples
fn match_patterns(
    scope: &[Triple],
    patterns: &[PatternRequest],
    bindings: HashMap<Arc<str>, Term>,
    out: &mut Vec<HashMap<Arc<str>, Term>>,
) {
    let Some((first, rest)) = patterns.split_first() else {
        out.push(bindings);
        return;
    };
    for triple in scope {
        let mut extended = bindings.clone();
        if unify(&first.subject, &triple.subject, &mut extended)
            && unify(&first.predicate, &triple.predicate, &mut extended)
            && unify(&first.object, &triple.object, &mut extended)
        {
            match_patterns(scope, rest, extended, out);
        }
    }
}

/// Match one pattern position against a triple position, extending bindings
fn unify(position: &TermOrVar, actual: &Term, bindings: &mut HashMap<Arc<str>, Term>) -> bool {
    match position {
        TermOrVar::Term(expected) => expected == actual,
        TermOrVar::Var(name) => match bindings.get(name.as_str()) {
            Some(bound) => bound == actual,
            None => {
                bindings.insert(Arc::from(name.as_str()), actual.clone());
                true
            }
        },
    }
}

/// Materialized stream over a memory member's solutions
struct MemorySolutionStream {
    solutions: VecDeque<RemoteSolution>,
    closed: bool,
}

#[async_trait]
impl SolutionStream for MemorySolutionStream {
    async fn next(&mut self) -> Result<Option<RemoteSolution>> {
        if self.closed {
            return Ok(None);
        }
        Ok(self.solutions.pop_front())
    }

    fn close(&mut self) {
        self.closed = true;
        self.solutions.clear();
    }
}
