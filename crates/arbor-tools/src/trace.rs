use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arbor_core::{NodeId, Status};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What happened to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TraceKind {
    Initialized,
    Deinitialized,
    Executed(Status),
    /// A selector switched to the child at this index.
    Selected(usize),
    /// The root reported a terminal status and the runner applied its completion policy.
    Completed(Status),
}

impl TraceKind {
    pub fn tag(self) -> &'static str {
        match self {
            TraceKind::Initialized => "bt.init",
            TraceKind::Deinitialized => "bt.deinit",
            TraceKind::Executed(_) => "bt.exec",
            TraceKind::Selected(_) => "bt.select",
            TraceKind::Completed(_) => "bt.complete",
        }
    }
}

/// One node lifecycle event, plain data so it can be recorded during simulation and rendered
/// later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceEvent {
    pub tick: u64,
    pub node: NodeId,
    pub kind: TraceKind,
}

impl TraceEvent {
    pub fn new(tick: u64, node: NodeId, kind: TraceKind) -> Self {
        Self { tick, node, kind }
    }

    pub fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

/// Receiver of trace events. Sinks travel with their runner, so they must be `Send`.
pub trait TraceSink: Send {
    fn emit(&mut self, event: TraceEvent);
}

#[derive(Debug, Default)]
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn emit(&mut self, _event: TraceEvent) {}
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TraceLog {
    pub events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn push(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn tags(&self) -> Vec<&'static str> {
        self.events.iter().map(TraceEvent::tag).collect()
    }

    /// Events concerning `node`, in emission order.
    pub fn for_node(&self, node: NodeId) -> impl Iterator<Item = &TraceEvent> + '_ {
        self.events.iter().filter(move |event| event.node == node)
    }
}

impl TraceSink for TraceLog {
    fn emit(&mut self, event: TraceEvent) {
        self.push(event);
    }
}

/// A log shared between the runner that writes it and the tool that reads it.
#[derive(Debug, Default, Clone)]
pub struct SharedTraceSink(Arc<Mutex<TraceLog>>);

impl SharedTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock(&self) -> MutexGuard<'_, TraceLog> {
        // A panicking writer leaves a consistent log behind; keep reading it.
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn take(&self) -> TraceLog {
        std::mem::take(&mut *self.lock())
    }
}

impl TraceSink for SharedTraceSink {
    fn emit(&mut self, event: TraceEvent) {
        self.lock().push(event);
    }
}
