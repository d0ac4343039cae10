//! Context reducer: eager tau closure over a projected CFSM (spec.md §4.7,
//! component C7).
//!
//! A projection (spec.md §4.4) leaves one `Tau` transition per structural
//! CFG node the role does not act on. This pass collapses runs of `Tau`
//! transitions so the verifier and the executor only ever see a role's own
//! sends, receives, and calls — deterministic and terminating because the
//! CFG (and so the CFSM) has finitely many states.

use std::collections::{HashSet, VecDeque};

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;

use crate::cfsm::{Action, Cfsm, CfsmGraph};

/// Returns a new CFSM with every maximal run of `Tau` transitions collapsed:
/// an edge `u --tau*--> v --a--> w` (for observable `a`) becomes a direct
/// `u --a--> w`, and a state is terminal in the result if any state reachable
/// from it purely by `Tau` was terminal in the input.
pub fn reduce(cfsm: &Cfsm) -> Cfsm {
    let tau_closure = |start: NodeIndex| -> HashSet<NodeIndex> {
        let mut closure = HashSet::new();
        let mut queue = VecDeque::from([start]);
        closure.insert(start);
        while let Some(node) = queue.pop_front() {
            for edge in cfsm.graph.edges(node) {
                if edge.weight().is_tau() && closure.insert(edge.target()) {
                    queue.push_back(edge.target());
                }
            }
        }
        closure
    };

    let mut graph = CfsmGraph::new();
    let mut state_of = std::collections::HashMap::new();
    for node in cfsm.graph.node_indices() {
        state_of.insert(node, graph.add_node(()));
    }

    for node in cfsm.graph.node_indices() {
        let reachable = tau_closure(node);
        for &closed in &reachable {
            for edge in cfsm.graph.edges(closed) {
                if !edge.weight().is_tau() {
                    graph.add_edge(state_of[&node], state_of[&edge.target()], edge.weight().clone());
                }
            }
        }
    }

    let initial = state_of[&cfsm.initial];
    let mut terminals: Vec<NodeIndex> = Vec::new();
    for node in cfsm.graph.node_indices() {
        let reachable = tau_closure(node);
        if reachable.iter().any(|n| cfsm.is_terminal(*n)) {
            terminals.push(state_of[&node]);
        }
    }
    terminals.sort_by_key(|n| n.index());
    terminals.dedup();

    Cfsm { role: cfsm.role.clone(), protocol_name: cfsm.protocol_name.clone(), graph, initial, terminals }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{MessageSignature, Role};

    #[test]
    fn collapses_tau_runs_between_observable_actions() {
        let mut cfsm = Cfsm::new(Role::new("A"), "P");
        let s1 = cfsm.add_state();
        let s2 = cfsm.add_state();
        let s3 = cfsm.add_state();
        cfsm.add_transition(cfsm.initial, s1, Action::Tau);
        cfsm.add_transition(
            s1,
            s2,
            Action::Send { peers: vec![Role::new("B")], message: MessageSignature::new("X", Vec::new()) },
        );
        cfsm.add_transition(s2, s3, Action::Tau);
        cfsm.terminals = vec![s3];

        let reduced = reduce(&cfsm);
        assert_eq!(reduced.transition_count(), 1);
        let (action, target) = reduced.transitions_from(reduced.initial)[0];
        assert!(matches!(action, Action::Send { .. }));
        assert!(reduced.is_terminal(target));
    }

    #[test]
    fn preserves_branching_after_tau() {
        let mut cfsm = Cfsm::new(Role::new("A"), "P");
        let s1 = cfsm.add_state();
        let s2 = cfsm.add_state();
        let s3 = cfsm.add_state();
        cfsm.add_transition(cfsm.initial, s1, Action::Tau);
        cfsm.add_transition(
            s1,
            s2,
            Action::Send { peers: vec![Role::new("B")], message: MessageSignature::new("X", Vec::new()) },
        );
        cfsm.add_transition(
            s1,
            s3,
            Action::Send { peers: vec![Role::new("B")], message: MessageSignature::new("Y", Vec::new()) },
        );
        cfsm.terminals = vec![s2, s3];

        let reduced = reduce(&cfsm);
        assert_eq!(reduced.transitions_from(reduced.initial).len(), 2);
    }
}
