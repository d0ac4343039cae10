//! Control-flow graph construction (spec.md §4.3, component C3).
//!
//! One CFG per global protocol, built once and shared as the input to every
//! per-role projection (spec.md §4.4).

pub mod builder;
pub mod graph;

pub use builder::{build, CfgError, ProtocolCfg};
pub use graph::{ActionKind, Cfg, EdgeKind, Node, NodeIndex, NodeKind};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{GlobalProtocol, Interaction, MessageSignature, Role, Span};

    fn msg(sender: &str, receiver: &str, label: &str) -> Interaction {
        Interaction::MessageTransfer {
            sender: Role::new(sender),
            receivers: vec![Role::new(receiver)],
            message: MessageSignature::new(label, Vec::new()),
            span: Span::synthetic(),
        }
    }

    fn protocol(body: Vec<Interaction>) -> GlobalProtocol {
        GlobalProtocol {
            name: "P".to_string(),
            roles: vec![Role::new("A"), Role::new("B")],
            parameters: Vec::new(),
            body,
            span: Span::synthetic(),
        }
    }

    #[test]
    fn empty_body_connects_initial_to_terminal() {
        let cfg = build(&protocol(Vec::new())).unwrap();
        assert_eq!(cfg.graph.edge_count(), 1);
        assert_eq!(cfg.graph.edges_connecting(cfg.initial, cfg.terminals[0]).count(), 1);
    }

    #[test]
    fn linear_body_chains_actions() {
        let cfg = build(&protocol(vec![msg("A", "B", "X"), msg("B", "A", "Y")])).unwrap();
        // initial -> X -> Y -> terminal
        assert_eq!(cfg.graph.node_count(), 4);
    }

    #[test]
    fn choice_creates_branch_and_merge() {
        let body = vec![Interaction::Choice {
            decider: Role::new("A"),
            branches: vec![vec![msg("A", "B", "Yes")], vec![msg("A", "B", "No")]],
            span: Span::synthetic(),
        }];
        let cfg = build(&protocol(body)).unwrap();
        let branch_nodes = cfg
            .graph
            .node_weights()
            .filter(|n| matches!(n.kind, NodeKind::Branch { .. }))
            .count();
        let merge_nodes =
            cfg.graph.node_weights().filter(|n| matches!(n.kind, NodeKind::Merge)).count();
        assert_eq!(branch_nodes, 1);
        assert_eq!(merge_nodes, 1);
    }

    #[test]
    fn continue_creates_back_edge_to_recursive_node() {
        let body = vec![Interaction::Recursion {
            label: "Loop".to_string(),
            body: vec![msg("A", "B", "Ping"), Interaction::Continue {
                label: "Loop".to_string(),
                span: Span::synthetic(),
            }],
            span: Span::synthetic(),
        }];
        let cfg = build(&protocol(body)).unwrap();
        let continue_edges =
            cfg.graph.edge_weights().filter(|e| matches!(e, EdgeKind::Continue)).count();
        assert_eq!(continue_edges, 1);
    }
}
