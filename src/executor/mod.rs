//! Per-role single-step execution (spec.md §4.9, component C9).
//!
//! One [`Executor`] drives one role through its (already tau-reduced) CFSM,
//! pushing and popping a call stack across `do`-invoked sub-protocols and
//! exchanging envelopes through a shared [`crate::transport::Transport`].

use petgraph::graph::NodeIndex;
use thiserror::Error;

use crate::ast::Role;
use crate::cfsm::{Action, Cfsm};
use crate::transport::{Transport, TransportError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("role `{role}` has no pending message from `{peer}` to receive")]
    MessageNotReady { role: Role, peer: Role },

    #[error("role `{role}` has already completed its protocol")]
    AlreadyCompleted { role: Role },

    #[error("no CFSM registered for role `{role}` in protocol `{protocol_name}`")]
    UnknownCallee { protocol_name: String, role: Role },

    #[error("transition index {index} is out of range for role `{role}`'s current state")]
    InvalidChoice { role: Role, index: usize },

    #[error("role `{role}` expected label `{expected}` from `{peer}` but the channel head is `{actual}`")]
    UnexpectedLabel { role: Role, peer: Role, expected: String, actual: String },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One transition a role could take right now.
#[derive(Debug, Clone)]
pub struct EnabledTransition {
    pub index: usize,
    pub action: Action,
    pub target: NodeIndex,
}

/// One resolved step: the action performed and whether it unwound any
/// completed `do` call frames afterward.
#[derive(Debug, Clone)]
pub struct ExecutedStep {
    pub action: Action,
    pub frames_returned: usize,
}

struct Frame {
    protocol_name: String,
    role: Role,
    resume_state: NodeIndex,
}

/// Drives one role through its CFSM(s), across `do`-invocation boundaries.
///
/// `cfsms` must contain, for every `(protocol_name, role)` this role's
/// protocol (transitively, through `do`) might invoke, that role's
/// tau-reduced projection (spec.md §4.7) — the simulator assembles this map
/// once up front from [`crate::projector::project_all`] over every protocol
/// in the registry.
pub struct Executor {
    role: Role,
    protocol_name: String,
    state: NodeIndex,
    stack: Vec<Frame>,
    cfsms: std::collections::HashMap<(String, Role), Cfsm>,
}

impl Executor {
    pub fn new(
        role: Role,
        protocol_name: impl Into<String>,
        cfsms: std::collections::HashMap<(String, Role), Cfsm>,
    ) -> Result<Self, ExecutorError> {
        let protocol_name = protocol_name.into();
        let state = cfsms
            .get(&(protocol_name.clone(), role.clone()))
            .map(|c| c.initial)
            .ok_or_else(|| ExecutorError::UnknownCallee { protocol_name: protocol_name.clone(), role: role.clone() })?;
        Ok(Executor { role, protocol_name, state, stack: Vec::new(), cfsms })
    }

    fn cfsm(&self) -> &Cfsm {
        &self.cfsms[&(self.protocol_name.clone(), self.role.clone())]
    }

    pub fn role(&self) -> &Role {
        &self.role
    }

    pub fn is_complete(&self) -> bool {
        self.stack.is_empty() && self.cfsm().is_terminal(self.state)
    }

    /// Every transition out of the current state, tagged with whether a
    /// receive has a message ready on `transport`. A receive is enabled iff
    /// the head of its `(peer, role)` channel carries a message whose label
    /// matches the transition's own (spec.md §4.9 step 2) — at an external
    /// choice state, several receive transitions can share that channel, and
    /// only the one whose label matches the queued message is enabled.
    pub fn enabled(&self, transport: &Transport) -> Vec<EnabledTransition> {
        self.cfsm()
            .transitions_from(self.state)
            .into_iter()
            .enumerate()
            .filter_map(|(index, (action, target))| match action {
                Action::Receive { peer, message } => match transport.peek(peer, &self.role) {
                    Some(envelope) if envelope.message.label == message.label => {
                        Some(EnabledTransition { index, action: action.clone(), target })
                    }
                    _ => None,
                },
                _ => Some(EnabledTransition { index, action: action.clone(), target }),
            })
            .collect()
    }

    /// Executes the transition at `index` among this state's *full*
    /// transition list (as returned by `transitions_from`, not `enabled`'s
    /// filtered indices) — callers pick from `enabled()` and pass its
    /// `index` field straight through.
    pub fn execute(&mut self, transport: &mut Transport, index: usize) -> Result<ExecutedStep, ExecutorError> {
        if self.is_complete() {
            return Err(ExecutorError::AlreadyCompleted { role: self.role.clone() });
        }

        let transitions = self.cfsm().transitions_from(self.state);
        let (action, target) = transitions
            .get(index)
            .map(|(a, t)| ((*a).clone(), *t))
            .ok_or_else(|| ExecutorError::InvalidChoice { role: self.role.clone(), index })?;

        match &action {
            Action::Send { peers, message } => {
                transport.send_multicast(&self.role, peers, message.clone())?;
                self.state = target;
            }
            Action::Receive { peer, message } => {
                match transport.peek(peer, &self.role) {
                    Some(envelope) if envelope.message.label == message.label => {}
                    Some(envelope) => {
                        return Err(ExecutorError::UnexpectedLabel {
                            role: self.role.clone(),
                            peer: peer.clone(),
                            expected: message.label.clone(),
                            actual: envelope.message.label.clone(),
                        });
                    }
                    None => {
                        return Err(ExecutorError::MessageNotReady { role: self.role.clone(), peer: peer.clone() });
                    }
                }
                let envelope = transport
                    .receive(peer, &self.role)
                    .expect("label checked against the channel head above");
                debug_assert_eq!(&envelope.sender, peer);
                debug_assert_eq!(&envelope.message.label, &message.label);
                self.state = target;
            }
            Action::Call { protocol_name, as_role } => {
                self.stack.push(Frame {
                    protocol_name: self.protocol_name.clone(),
                    role: self.role.clone(),
                    resume_state: target,
                });
                let callee_initial = self
                    .cfsms
                    .get(&(protocol_name.clone(), as_role.clone()))
                    .map(|c| c.initial)
                    .ok_or_else(|| ExecutorError::UnknownCallee {
                        protocol_name: protocol_name.clone(),
                        role: as_role.clone(),
                    })?;
                self.protocol_name = protocol_name.clone();
                self.role = as_role.clone();
                self.state = callee_initial;
            }
            Action::Tau => {
                self.state = target;
            }
        }

        let frames_returned = self.unwind_completed_calls();
        Ok(ExecutedStep { action, frames_returned })
    }

    fn unwind_completed_calls(&mut self) -> usize {
        let mut returned = 0;
        while !self.stack.is_empty() && self.cfsm().is_terminal(self.state) {
            let frame = self.stack.pop().expect("loop guard checked non-empty");
            self.protocol_name = frame.protocol_name;
            self.role = frame.role;
            self.state = frame.resume_state;
            returned += 1;
        }
        returned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::MessageSignature;

    fn linear_cfsm(role: &str, peer: &str, action: Action) -> Cfsm {
        let mut cfsm = Cfsm::new(Role::new(role), "P");
        let term = cfsm.add_state();
        cfsm.add_transition(cfsm.initial, term, action);
        cfsm.terminals = vec![term];
        let _ = peer;
        cfsm
    }

    #[test]
    fn executes_a_send_and_completes() {
        let a = Role::new("A");
        let action = Action::Send { peers: vec![Role::new("B")], message: MessageSignature::new("X", Vec::new()) };
        let mut cfsms = std::collections::HashMap::new();
        cfsms.insert(("P".to_string(), a.clone()), linear_cfsm("A", "B", action));

        let mut executor = Executor::new(a, "P", cfsms).unwrap();
        let mut transport = Transport::new();
        let enabled = executor.enabled(&transport);
        assert_eq!(enabled.len(), 1);
        executor.execute(&mut transport, enabled[0].index).unwrap();
        assert!(executor.is_complete());
        assert!(transport.has_message(&Role::new("A"), &Role::new("B")));
    }

    #[test]
    fn receive_is_disabled_until_message_arrives() {
        let b = Role::new("B");
        let action = Action::Receive { peer: Role::new("A"), message: MessageSignature::new("X", Vec::new()) };
        let mut cfsms = std::collections::HashMap::new();
        cfsms.insert(("P".to_string(), b.clone()), linear_cfsm("B", "A", action));

        let executor = Executor::new(b, "P", cfsms).unwrap();
        let mut transport = Transport::new();
        assert!(executor.enabled(&transport).is_empty());

        transport.send(&Role::new("A"), &Role::new("B"), MessageSignature::new("X", Vec::new())).unwrap();
        assert_eq!(executor.enabled(&transport).len(), 1);
    }

    #[test]
    fn external_choice_only_enables_the_transition_matching_the_queued_label() {
        let coordinator = Role::new("Coordinator");
        let participant = Role::new("Participant");

        let mut cfsm = Cfsm::new(participant.clone(), "2PC");
        let commit_state = cfsm.add_state();
        let abort_state = cfsm.add_state();
        cfsm.add_transition(
            cfsm.initial,
            commit_state,
            Action::Receive { peer: coordinator.clone(), message: MessageSignature::new("Commit", Vec::new()) },
        );
        cfsm.add_transition(
            cfsm.initial,
            abort_state,
            Action::Receive { peer: coordinator.clone(), message: MessageSignature::new("Abort", Vec::new()) },
        );
        cfsm.terminals = vec![commit_state, abort_state];

        let mut cfsms = std::collections::HashMap::new();
        cfsms.insert(("2PC".to_string(), participant.clone()), cfsm);

        let mut executor = Executor::new(participant, "2PC", cfsms).unwrap();
        let mut transport = Transport::new();
        transport.send(&coordinator, &Role::new("Participant"), MessageSignature::new("Abort", Vec::new())).unwrap();

        let enabled = executor.enabled(&transport);
        assert_eq!(enabled.len(), 1);
        let step = executor.execute(&mut transport, enabled[0].index).unwrap();
        match step.action {
            Action::Receive { message, .. } => assert_eq!(message.label, "Abort"),
            other => panic!("expected a receive, got {other:?}"),
        }
    }
}
