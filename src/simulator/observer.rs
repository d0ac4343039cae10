// Step observation (spec.md §4.10)

use crate::ast::Role;
use crate::cfsm::Action;

/// One executed step, as reported to observers and accumulated into the trace.
#[derive(Debug, Clone)]
pub struct TraceEntry {
    pub step: usize,
    pub role: Role,
    pub action: Action,
}

/// Receives each step as the simulator executes it. Grounded in the
/// teacher's middleware pattern (`Trace`/`Metrics` wrapping a handler) —
/// generalized here to a plain callback trait since the simulator is
/// synchronous, not an async effect pipeline.
pub trait Observer {
    fn on_step(&mut self, entry: &TraceEntry);
}

/// An observer that does nothing, for simulators run without instrumentation.
#[derive(Debug, Default)]
pub struct NoOpObserver;

impl Observer for NoOpObserver {
    fn on_step(&mut self, _entry: &TraceEntry) {}
}

/// An observer that records every step it sees, for tests and CLI reporting.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    pub entries: Vec<TraceEntry>,
}

impl Observer for RecordingObserver {
    fn on_step(&mut self, entry: &TraceEntry) {
        self.entries.push(entry.clone());
    }
}
