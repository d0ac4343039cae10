//! Distributed FIFO-channel simulation (spec.md §4.10, component C10).
//!
//! Runs every role's [`crate::executor::Executor`] cooperatively in one
//! thread over a shared [`Transport`], stepped by a [`Scheduler`] — grounded
//! in the `other_examples` protocol-scheduler pattern (a pool of per-role
//! state machines advanced by a scheduling policy) but rebuilt around this
//! crate's own CFSM/executor types rather than that file's ad hoc states.

pub mod observer;
pub mod scheduler;

pub use observer::{NoOpObserver, Observer, RecordingObserver, TraceEntry};
pub use scheduler::Scheduler;

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::ast::Role;
use crate::cfsm::Cfsm;
use crate::executor::{Executor, ExecutorError};
use crate::transport::Transport;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SimulationError {
    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("manual scheduler requires an explicit role and transition choice")]
    ManualChoiceRequired,

    #[error("role `{0}` is not part of this simulation")]
    UnknownRole(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationState {
    Running,
    Completed,
    /// No role has an enabled transition but at least one is incomplete.
    Deadlocked,
}

/// Runs a whole protocol instance: every declared role's executor, the
/// shared transport between them, and the scheduling/trace bookkeeping
/// around a `step`/`run` loop.
pub struct Simulator {
    executors: HashMap<Role, Executor>,
    transport: Transport,
    scheduler: Scheduler,
    trace: Vec<TraceEntry>,
    step_count: usize,
    deadline: Option<Instant>,
    cfsms_by_role: HashMap<Role, HashMap<(String, Role), Cfsm>>,
    protocol_name: String,
}

impl Simulator {
    pub fn new(
        protocol_name: impl Into<String>,
        roles: &[Role],
        cfsms: HashMap<(String, Role), Cfsm>,
        scheduler: Scheduler,
    ) -> Result<Self, SimulationError> {
        let protocol_name = protocol_name.into();
        let mut executors = HashMap::new();
        let mut cfsms_by_role = HashMap::new();
        for role in roles {
            executors.insert(role.clone(), Executor::new(role.clone(), protocol_name.clone(), cfsms.clone())?);
            cfsms_by_role.insert(role.clone(), cfsms.clone());
        }
        Ok(Simulator {
            executors,
            transport: Transport::new(),
            scheduler,
            trace: Vec::new(),
            step_count: 0,
            deadline: None,
            cfsms_by_role,
            protocol_name,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Some(Instant::now() + timeout);
        self
    }

    pub fn get_state(&self) -> SimulationState {
        if self.executors.values().all(Executor::is_complete) && self.transport.is_empty() {
            return SimulationState::Completed;
        }
        let any_enabled = self
            .executors
            .values()
            .any(|e| !e.is_complete() && !e.enabled(&self.transport).is_empty());
        if any_enabled {
            SimulationState::Running
        } else {
            SimulationState::Deadlocked
        }
    }

    pub fn get_traces(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Resets every executor and the transport to a fresh run of the same
    /// protocol, keeping the scheduler's own state (so round-robin/fair
    /// ordering carries over, matching a re-run with the same policy).
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        let mut executors = HashMap::new();
        for (role, cfsms) in &self.cfsms_by_role {
            executors.insert(
                role.clone(),
                Executor::new(role.clone(), self.protocol_name.clone(), cfsms.clone())?,
            );
        }
        self.executors = executors;
        self.transport = Transport::new();
        self.trace.clear();
        self.step_count = 0;
        Ok(())
    }

    fn enabled_roles(&self) -> Vec<Role> {
        let mut roles: Vec<Role> = self
            .executors
            .iter()
            .filter(|(_, e)| !e.is_complete() && !e.enabled(&self.transport).is_empty())
            .map(|(r, _)| r.clone())
            .collect();
        roles.sort();
        roles
    }

    /// Advances the simulation by one step, letting the scheduler choose
    /// which enabled role acts and, among that role's own enabled
    /// transitions (the internal-choice branches of a `choice at <self>`),
    /// which one to take — per the scheduler's own policy (spec.md §4.9
    /// step 3: first/random/manual), not always the first.
    pub fn step(&mut self, observer: &mut dyn Observer) -> Result<SimulationState, SimulationError> {
        let enabled_roles = self.enabled_roles();
        let Some(role) = self.scheduler.pick(self.step_count, &enabled_roles) else {
            if matches!(self.scheduler, Scheduler::Manual) && !enabled_roles.is_empty() {
                return Err(SimulationError::ManualChoiceRequired);
            }
            return Ok(self.get_state());
        };
        let transitions = {
            let executor = self.executors.get(&role).expect("scheduler only picks enabled roles");
            executor.enabled(&self.transport)
        };
        let picked = self.scheduler.pick_transition(transitions.len());
        let choice = transitions.get(picked).expect("role was reported enabled").index;
        self.step_role(&role, choice, observer)?;
        Ok(self.get_state())
    }

    /// Executes a specific `(role, transition index)` — the path manual
    /// scheduling and interactive drivers use.
    pub fn step_role(
        &mut self,
        role: &Role,
        transition_index: usize,
        observer: &mut dyn Observer,
    ) -> Result<(), SimulationError> {
        let executor = self.executors.get_mut(role).ok_or_else(|| SimulationError::UnknownRole(role.clone()))?;
        let executed = executor.execute(&mut self.transport, transition_index)?;
        let entry = TraceEntry { step: self.step_count, role: role.clone(), action: executed.action };
        observer.on_step(&entry);
        self.trace.push(entry);
        self.step_count += 1;
        Ok(())
    }

    /// Runs until completion, deadlock, `max_steps`, or (if set) the
    /// configured wall-clock deadline — whichever comes first.
    pub fn run(&mut self, max_steps: usize, observer: &mut dyn Observer) -> Result<SimulationState, SimulationError> {
        for _ in 0..max_steps {
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    break;
                }
            }
            let state = self.step(observer)?;
            if state != SimulationState::Running {
                return Ok(state);
            }
        }
        Ok(self.get_state())
    }
}
