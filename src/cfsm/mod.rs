//! Per-role CFSM: a pure labelled transition system (spec.md §3, §4.4).
//!
//! Produced by [`crate::projector::project`], consumed by
//! [`crate::analysis`], [`crate::verifier`], and [`crate::executor`].

pub mod action;

pub use action::Action;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::ast::Role;

pub type CfsmGraph = DiGraph<(), Action>;

/// One role's projected local protocol.
#[derive(Debug, Clone)]
pub struct Cfsm {
    pub role: Role,
    pub protocol_name: String,
    pub graph: CfsmGraph,
    pub initial: NodeIndex,
    pub terminals: Vec<NodeIndex>,
}

impl Cfsm {
    pub fn new(role: Role, protocol_name: impl Into<String>) -> Self {
        let mut graph = CfsmGraph::new();
        let initial = graph.add_node(());
        Cfsm { role, protocol_name: protocol_name.into(), graph, initial, terminals: Vec::new() }
    }

    pub fn add_state(&mut self) -> NodeIndex {
        self.graph.add_node(())
    }

    pub fn add_transition(&mut self, from: NodeIndex, to: NodeIndex, action: Action) {
        self.graph.add_edge(from, to, action);
    }

    pub fn is_terminal(&self, state: NodeIndex) -> bool {
        self.terminals.contains(&state)
    }

    /// Outgoing transitions from `state`, as `(action, target)` pairs.
    pub fn transitions_from(&self, state: NodeIndex) -> Vec<(&Action, NodeIndex)> {
        self.graph
            .edges(state)
            .map(|edge| (edge.weight(), edge.target()))
            .collect()
    }

    pub fn state_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn transition_count(&self) -> usize {
        self.graph.edge_count()
    }
}
