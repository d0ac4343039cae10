//! Pure LTS-analysis queries over a CFSM (spec.md §4.5, component C5).
//!
//! Every function here is a read-only query, free of side effects, so the
//! verifier and the executor can share them without coupling to each
//! other's state.

use std::collections::{HashMap, HashSet};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::cfsm::{Action, Cfsm};

/// States with more than one outgoing *observable* (non-`τ`) transition
/// (spec.md §4.5 restricts branching/merge counts to `a ≠ τ`).
pub fn branching_states(cfsm: &Cfsm) -> Vec<NodeIndex> {
    cfsm.graph
        .node_indices()
        .filter(|&n| cfsm.graph.edges(n).filter(|e| !matches!(e.weight(), Action::Tau)).count() > 1)
        .collect()
}

/// States with more than one incoming observable (non-`τ`) transition.
pub fn merge_states(cfsm: &Cfsm) -> Vec<NodeIndex> {
    cfsm.graph
        .node_indices()
        .filter(|&n| {
            cfsm.graph
                .edges_directed(n, petgraph::Direction::Incoming)
                .filter(|e| !matches!(e.weight(), Action::Tau))
                .count()
                > 1
        })
        .collect()
}

/// True if the CFSM's transition graph contains a cycle.
pub fn has_cycles(cfsm: &Cfsm) -> bool {
    petgraph::algo::is_cyclic_directed(&cfsm.graph)
}

/// Edges that close a cycle back to an already-visited ancestor in a DFS
/// from the initial state (used to locate `continue` loops, spec.md §4.3).
pub fn back_edges(cfsm: &Cfsm) -> Vec<(NodeIndex, NodeIndex)> {
    let mut visiting = HashSet::new();
    let mut visited = HashSet::new();
    let mut edges = Vec::new();
    dfs_back_edges(cfsm, cfsm.initial, &mut visiting, &mut visited, &mut edges);
    edges
}

fn dfs_back_edges(
    cfsm: &Cfsm,
    node: NodeIndex,
    visiting: &mut HashSet<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
    edges: &mut Vec<(NodeIndex, NodeIndex)>,
) {
    visiting.insert(node);
    for edge in cfsm.graph.edges(node) {
        let target = edge.target();
        if visiting.contains(&target) {
            edges.push((node, target));
        } else if !visited.contains(&target) {
            dfs_back_edges(cfsm, target, visiting, visited, edges);
        }
    }
    visiting.remove(&node);
    visited.insert(node);
}

/// True if some path from `from` reaches a terminal state.
pub fn can_reach_terminal(cfsm: &Cfsm, from: NodeIndex) -> bool {
    let mut seen = HashSet::new();
    let mut stack = vec![from];
    while let Some(node) = stack.pop() {
        if cfsm.is_terminal(node) {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        for edge in cfsm.graph.edges(node) {
            stack.push(edge.target());
        }
    }
    false
}

/// True if, at every branching state, outgoing actions carry pairwise
/// distinct message labels (spec.md §4.6 "Choice determinism").
pub fn choice_deterministic(cfsm: &Cfsm) -> bool {
    for state in cfsm.graph.node_indices() {
        let mut labels = HashSet::new();
        for edge in cfsm.graph.edges(state) {
            let label = match edge.weight() {
                Action::Send { message, .. } | Action::Receive { message, .. } => {
                    Some(message.label.clone())
                }
                Action::Tau | Action::Call { .. } => None,
            };
            if let Some(label) = label {
                if !labels.insert(label) {
                    return false;
                }
            }
        }
    }
    true
}

/// All finite traces up to `max_len` actions from the initial state,
/// rendered as `Display` strings of each action taken. Bounded because a
/// CFSM may be cyclic.
pub fn traces(cfsm: &Cfsm, max_len: usize) -> Vec<Vec<String>> {
    let mut out = Vec::new();
    let mut path = Vec::new();
    collect_traces(cfsm, cfsm.initial, max_len, &mut path, &mut out);
    out
}

fn collect_traces(
    cfsm: &Cfsm,
    node: NodeIndex,
    remaining: usize,
    path: &mut Vec<String>,
    out: &mut Vec<Vec<String>>,
) {
    if cfsm.is_terminal(node) || remaining == 0 {
        out.push(path.clone());
        if remaining == 0 {
            return;
        }
    }
    for edge in cfsm.graph.edges(node) {
        path.push(edge.weight().to_string());
        collect_traces(cfsm, edge.target(), remaining - 1, path, out);
        path.pop();
    }
}

/// Counts of each action kind across the whole CFSM (sends, receives, taus, calls).
pub fn count_actions(cfsm: &Cfsm) -> HashMap<&'static str, usize> {
    let mut counts = HashMap::new();
    for edge in cfsm.graph.edge_references() {
        let key = match edge.weight() {
            Action::Send { .. } => "send",
            Action::Receive { .. } => "receive",
            Action::Tau => "tau",
            Action::Call { .. } => "call",
        };
        *counts.entry(key).or_insert(0) += 1;
    }
    counts
}

/// Distinct message labels observable on this CFSM's transitions.
pub fn message_labels(cfsm: &Cfsm) -> HashSet<String> {
    cfsm.graph
        .edge_weights()
        .filter_map(|a| match a {
            Action::Send { message, .. } | Action::Receive { message, .. } => {
                Some(message.label.clone())
            }
            Action::Tau | Action::Call { .. } => None,
        })
        .collect()
}
