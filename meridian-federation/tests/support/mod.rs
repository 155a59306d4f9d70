//! Shared test support: a recording member connection.
//!
//! `RecordingMember` delegates storage and matching to a `MemoryMember` but
//! records every call crossing the member boundary, so tests can assert on
//! the protocol the federation core actually drove: preparation counts,
//! critical-section serialization, and stream release.

// Each test binary compiles this module; not every binary uses every helper.
#![allow(dead_code)]

use async_trait::async_trait;
use meridian_connection::{
    ConnectionError, MemberConnection, MemoryMember, PreparedQuery, QueryRequest, RemoteSolution,
    SolutionStream,
};
use meridian_core::{Dataset, Term};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// One observed call on the member boundary.
#[derive(Clone, Debug, PartialEq)]
pub enum MemberEvent {
    Prepare,
    ClearBindings,
    Bind(String, Term),
    SetDataset(bool),
    Execute,
    StreamClosed,
}

pub type EventLog = Arc<Mutex<Vec<MemberEvent>>>;

/// Injected failure behavior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FailureMode {
    None,
    Unreachable,
    FailExecute,
}

pub struct RecordingMember {
    inner: Arc<MemoryMember>,
    events: EventLog,
    prepare_count: Arc<AtomicUsize>,
    open_streams: Arc<AtomicUsize>,
    mode: Arc<Mutex<FailureMode>>,
}

impl RecordingMember {
    pub fn new(inner: MemoryMember) -> Self {
        Self {
            inner: Arc::new(inner),
            events: Arc::new(Mutex::new(Vec::new())),
            prepare_count: Arc::new(AtomicUsize::new(0)),
            open_streams: Arc::new(AtomicUsize::new(0)),
            mode: Arc::new(Mutex::new(FailureMode::None)),
        }
    }

    pub fn unreachable(inner: MemoryMember) -> Self {
        let member = Self::new(inner);
        member.set_mode(FailureMode::Unreachable);
        member
    }

    pub fn set_mode(&self, mode: FailureMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn events(&self) -> Vec<MemberEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn prepare_count(&self) -> usize {
        self.prepare_count.load(Ordering::SeqCst)
    }

    pub fn open_streams(&self) -> usize {
        self.open_streams.load(Ordering::SeqCst)
    }

    fn record(&self, event: MemberEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl MemberConnection for RecordingMember {
    fn endpoint(&self) -> &str {
        self.inner.endpoint()
    }

    async fn prepare(
        &self,
        request: &QueryRequest,
    ) -> meridian_connection::Result<Box<dyn PreparedQuery>> {
        self.record(MemberEvent::Prepare);
        self.prepare_count.fetch_add(1, Ordering::SeqCst);
        if *self.mode.lock().unwrap() == FailureMode::Unreachable {
            return Err(ConnectionError::Unreachable("injected".to_string()));
        }
        let handle = self.inner.prepare(request).await?;
        Ok(Box::new(RecordingPreparedQuery {
            inner: handle,
            events: Arc::clone(&self.events),
            open_streams: Arc::clone(&self.open_streams),
            mode: Arc::clone(&self.mode),
        }))
    }
}

struct RecordingPreparedQuery {
    inner: Box<dyn PreparedQuery>,
    events: EventLog,
    open_streams: Arc<AtomicUsize>,
    mode: Arc<Mutex<FailureMode>>,
}

#[async_trait]
impl PreparedQuery for RecordingPreparedQuery {
    fn bind(&mut self, name: &str, term: Term) -> meridian_connection::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(MemberEvent::Bind(name.to_string(), term.clone()));
        self.inner.bind(name, term)
    }

    fn clear_bindings(&mut self) {
        self.events.lock().unwrap().push(MemberEvent::ClearBindings);
        self.inner.clear_bindings();
    }

    fn set_dataset(&mut self, dataset: Option<&Dataset>) -> meridian_connection::Result<()> {
        self.events
            .lock()
            .unwrap()
            .push(MemberEvent::SetDataset(dataset.is_some()));
        self.inner.set_dataset(dataset)
    }

    async fn execute(&mut self) -> meridian_connection::Result<Box<dyn SolutionStream>> {
        // Give the scheduler a chance to interleave tasks here; only the
        // node's critical section keeps the event windows contiguous.
        tokio::task::yield_now().await;
        self.events.lock().unwrap().push(MemberEvent::Execute);
        if *self.mode.lock().unwrap() == FailureMode::FailExecute {
            return Err(ConnectionError::Execution("injected".to_string()));
        }
        let stream = self.inner.execute().await?;
        self.open_streams.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingStream {
            inner: stream,
            events: Arc::clone(&self.events),
            open_streams: Arc::clone(&self.open_streams),
            released: false,
        }))
    }
}

struct RecordingStream {
    inner: Box<dyn SolutionStream>,
    events: EventLog,
    open_streams: Arc<AtomicUsize>,
    released: bool,
}

#[async_trait]
impl SolutionStream for RecordingStream {
    async fn next(&mut self) -> meridian_connection::Result<Option<RemoteSolution>> {
        self.inner.next().await
    }

    fn close(&mut self) {
        if !self.released {
            self.released = true;
            self.open_streams.fetch_sub(1, Ordering::SeqCst);
            self.events.lock().unwrap().push(MemberEvent::StreamClosed);
        }
        self.inner.close();
    }
}

/// Assert the event log is a sequence of complete, non-interleaved
/// critical-section windows: each `ClearBindings` runs through its
/// `Execute` with no other window starting in between. `Prepare` and
/// `StreamClosed` may appear anywhere - streams are drained and released
/// outside the lock.
pub fn assert_serialized(events: &[MemberEvent]) {
    let mut in_window = false;
    for event in events {
        match event {
            MemberEvent::ClearBindings => {
                assert!(!in_window, "window started inside another window: {events:?}");
                in_window = true;
            }
            MemberEvent::Bind(..) | MemberEvent::SetDataset(_) => {
                assert!(in_window, "handle mutated outside a window: {events:?}");
            }
            MemberEvent::Execute => {
                assert!(in_window, "execute outside a window: {events:?}");
                in_window = false;
            }
            MemberEvent::Prepare | MemberEvent::StreamClosed => {}
        }
    }
    assert!(!in_window, "unterminated window: {events:?}");
}

/// A member with the two-hop `knows` fixture used across tests.
pub fn people_member() -> MemoryMember {
    let member = MemoryMember::new("mem://people");
    member.insert(
        Term::iri("http://ex.org/alice"),
        Term::iri("http://ex.org/knows"),
        Term::iri("http://ex.org/bob"),
    );
    member.insert(
        Term::iri("http://ex.org/bob"),
        Term::iri("http://ex.org/knows"),
        Term::iri("http://ex.org/carol"),
    );
    member
}
