//! Pipeline and simulator configuration (spec.md §6.4).
//!
//! Builder-style structs with explicit defaults; nothing here is read from
//! the environment — the CLI (spec.md §6.2) is the only place flags get
//! turned into one of these.

use std::time::Duration;

use crate::simulator::Scheduler;

/// Governs the parse → CFG → project → verify stages, before any
/// simulation is involved.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Reject the protocol outright on any fatal finding (always true in
    /// practice; kept explicit so a caller can see the guarantee at the
    /// call site rather than assume it).
    pub fail_on_fatal: bool,
    /// Also fail on findings that are merely advisory (spec.md §4.6 warnings).
    pub warnings_as_errors: bool,
    /// Upper bound on `rec`-nesting depth while building the CFG, guarding
    /// against pathological or generated input.
    pub max_recursion_depth: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig { fail_on_fatal: true, warnings_as_errors: false, max_recursion_depth: 256 }
    }
}

impl PipelineConfig {
    pub fn warnings_as_errors(mut self, yes: bool) -> Self {
        self.warnings_as_errors = yes;
        self
    }

    pub fn max_recursion_depth(mut self, depth: usize) -> Self {
        self.max_recursion_depth = depth;
        self
    }
}

/// Governs one [`crate::simulator::Simulator`] run.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    pub scheduler: Scheduler,
    pub max_steps: usize,
    pub timeout: Option<Duration>,
    /// `Some(n)` bounds every channel to `n` pending messages
    /// (spec.md §4.8 "optional bounded mode"); `None` is unbounded.
    pub channel_capacity: Option<usize>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        SimulatorConfig {
            scheduler: Scheduler::round_robin(),
            max_steps: 10_000,
            timeout: None,
            channel_capacity: None,
        }
    }
}

impl SimulatorConfig {
    pub fn with_scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }
}
