//! Persisted CFSM JSON layout (spec.md §6.3).
//!
//! A bridge type rather than `#[derive(Serialize)]` on [`Cfsm`] itself:
//! petgraph's `NodeIndex` has no stable external representation, so states
//! are renumbered `0..n` on the way out and rebuilt as plain indices on the
//! way in.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ast::{MessageSignature, PayloadType, Role};
use crate::cfsm::{Action, Cfsm, CfsmGraph};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedCfsm {
    pub role: String,
    pub protocol_name: String,
    pub states: Vec<u32>,
    pub transitions: Vec<PersistedTransition>,
    pub initial_state: u32,
    pub terminal_states: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedTransition {
    pub from: u32,
    pub to: u32,
    pub action: PersistedAction,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PersistedAction {
    Send { peers: Vec<String>, label: String, payload: Vec<PersistedPayloadType> },
    Receive { peer: String, label: String, payload: Vec<PersistedPayloadType> },
    Tau,
    Call { protocol_name: String, as_role: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedPayloadType {
    pub name: String,
    #[serde(default)]
    pub args: Vec<PersistedPayloadType>,
}

impl From<&PayloadType> for PersistedPayloadType {
    fn from(p: &PayloadType) -> Self {
        PersistedPayloadType { name: p.name.clone(), args: p.args.iter().map(Into::into).collect() }
    }
}

impl From<&PersistedPayloadType> for PayloadType {
    fn from(p: &PersistedPayloadType) -> Self {
        PayloadType { name: p.name.clone(), args: p.args.iter().map(Into::into).collect() }
    }
}

pub fn to_persisted(cfsm: &Cfsm) -> PersistedCfsm {
    let mut index_of = HashMap::new();
    let mut states = Vec::new();
    for (i, node) in cfsm.graph.node_indices().enumerate() {
        index_of.insert(node, i as u32);
        states.push(i as u32);
    }

    let transitions = cfsm
        .graph
        .edge_indices()
        .map(|e| {
            let (from, to) = cfsm.graph.edge_endpoints(e).expect("edge index is valid");
            let action = persisted_action(&cfsm.graph[e]);
            PersistedTransition { from: index_of[&from], to: index_of[&to], action }
        })
        .collect();

    PersistedCfsm {
        role: cfsm.role.to_string(),
        protocol_name: cfsm.protocol_name.clone(),
        states,
        transitions,
        initial_state: index_of[&cfsm.initial],
        terminal_states: cfsm.terminals.iter().map(|t| index_of[t]).collect(),
    }
}

fn persisted_action(action: &Action) -> PersistedAction {
    match action {
        Action::Send { peers, message } => PersistedAction::Send {
            peers: peers.iter().map(Role::to_string).collect(),
            label: message.label.clone(),
            payload: message.payload.iter().map(Into::into).collect(),
        },
        Action::Receive { peer, message } => PersistedAction::Receive {
            peer: peer.to_string(),
            label: message.label.clone(),
            payload: message.payload.iter().map(Into::into).collect(),
        },
        Action::Tau => PersistedAction::Tau,
        Action::Call { protocol_name, as_role } => {
            PersistedAction::Call { protocol_name: protocol_name.clone(), as_role: as_role.to_string() }
        }
    }
}

pub fn from_persisted(persisted: &PersistedCfsm) -> Cfsm {
    let mut graph = CfsmGraph::new();
    let mut index_of = HashMap::new();
    for &state in &persisted.states {
        index_of.insert(state, graph.add_node(()));
    }

    for transition in &persisted.transitions {
        let from = index_of[&transition.from];
        let to = index_of[&transition.to];
        let action = match &transition.action {
            PersistedAction::Send { peers, label, payload } => Action::Send {
                peers: peers.iter().map(|p| Role::new(p.clone())).collect(),
                message: MessageSignature::new(label.clone(), payload.iter().map(Into::into).collect()),
            },
            PersistedAction::Receive { peer, label, payload } => Action::Receive {
                peer: Role::new(peer.clone()),
                message: MessageSignature::new(label.clone(), payload.iter().map(Into::into).collect()),
            },
            PersistedAction::Tau => Action::Tau,
            PersistedAction::Call { protocol_name, as_role } => {
                Action::Call { protocol_name: protocol_name.clone(), as_role: Role::new(as_role.clone()) }
            }
        };
        graph.add_edge(from, to, action);
    }

    Cfsm {
        role: Role::new(persisted.role.clone()),
        protocol_name: persisted.protocol_name.clone(),
        initial: index_of[&persisted.initial_state],
        terminals: persisted.terminal_states.iter().map(|t| index_of[t]).collect(),
        graph,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_simple_cfsm() {
        let mut cfsm = Cfsm::new(Role::new("A"), "P");
        let term = cfsm.add_state();
        cfsm.add_transition(
            cfsm.initial,
            term,
            Action::Send { peers: vec![Role::new("B")], message: MessageSignature::new("X", Vec::new()) },
        );
        cfsm.terminals = vec![term];

        let persisted = to_persisted(&cfsm);
        let json = serde_json::to_string(&persisted).unwrap();
        let back: PersistedCfsm = serde_json::from_str(&json).unwrap();
        let rebuilt = from_persisted(&back);

        assert_eq!(rebuilt.state_count(), cfsm.state_count());
        assert_eq!(rebuilt.transition_count(), cfsm.transition_count());
    }
}
