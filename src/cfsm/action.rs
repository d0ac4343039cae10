// The CFSM action alphabet (spec.md §3 "Action")

use std::fmt;

use crate::ast::{MessageSignature, Role};

/// A single observable (or silent) step of one role's local protocol.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// `role ! {peers} : label` — sending `message` to every role in
    /// `peers` as one action. A point-to-point send is the `peers.len() ==
    /// 1` case; fan-out across the per-pair channels is the transport's
    /// concern, not this action's (spec.md §4.4.1, §9 "Multicast modeling").
    Send { peers: Vec<Role>, message: MessageSignature },
    /// `role ? peer : label` — receiving `message` from `peer`.
    Receive { peer: Role, message: MessageSignature },
    /// An internal, unobservable step (branch/merge/fork/join bookkeeping),
    /// eliminated by the context reducer (spec.md §4.7) before a CFSM is
    /// handed to the verifier or the simulator.
    Tau,
    /// Entering a `do`-invoked sub-protocol as role `as_role`.
    Call { protocol_name: String, as_role: Role },
}

impl Action {
    pub fn is_tau(&self) -> bool {
        matches!(self, Action::Tau)
    }

    /// The dual peer(s) of a send/receive action: `Send{peers,m}` performed
    /// by `r` matches `Receive{peer: r, m}` performed by each role in
    /// `peers` (spec.md §3 "Duality").
    pub fn dual_peers(&self) -> Vec<&Role> {
        match self {
            Action::Send { peers, .. } => peers.iter().collect(),
            Action::Receive { peer, .. } => vec![peer],
            Action::Tau | Action::Call { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Send { peers, message } => {
                let peers = peers.iter().map(Role::to_string).collect::<Vec<_>>().join(",");
                write!(f, "!{{{peers}}}:{message}")
            }
            Action::Receive { peer, message } => write!(f, "?{peer}:{message}"),
            Action::Tau => write!(f, "tau"),
            Action::Call { protocol_name, as_role } => write!(f, "call {protocol_name}({as_role})"),
        }
    }
}
