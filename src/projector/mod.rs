//! Per-role projection (spec.md §4.4, component C4).
//!
//! Grounded in the teacher's `compiler::projection` module: the same
//! structural idea (walk the shared control structure once per role,
//! keeping the role's own sends/receives and silencing everything else into
//! `Tau`) generalized from that module's choreography-specific
//! `ProjectionContext`/`LocalType` pair onto the CFG built in
//! [`crate::cfg`]. A multicast projects to a single `Send` action carrying
//! the whole receiver set (spec.md §4.4.1, §9 "Multicast modeling") — the
//! projector does not desugar it into sequential sends; fan-out across the
//! per-pair channels is [`crate::transport::Transport::send_multicast`]'s
//! concern, not this stage's.
//!
//! The result still contains `Tau` transitions for every structural node
//! (branch points, merges, forks, joins, recursion entries) the role does
//! not act on; [`crate::reducer`] performs the tau closure afterward
//! (spec.md §4.7) — kept as a separate pass, matching the projector/reducer
//! split of components C4 and C7.

pub mod error;

use std::collections::HashMap;

use petgraph::visit::EdgeRef;

pub use error::ProjectionError;

use crate::ast::{GlobalProtocol, Role};
use crate::cfg::{ActionKind, NodeIndex as CfgNodeIndex, NodeKind, ProtocolCfg};
use crate::cfsm::{Action, Cfsm, CfsmGraph};
use crate::registry::ProtocolRegistry;

/// Projects `protocol`'s CFG onto `role`'s local CFSM.
pub fn project(
    protocol: &GlobalProtocol,
    cfg: &ProtocolCfg,
    registry: &ProtocolRegistry,
    role: &Role,
) -> Result<Cfsm, ProjectionError> {
    if !protocol.declares_role(role) {
        return Err(ProjectionError::RoleNotInProtocol {
            protocol: protocol.name.clone(),
            role: role.to_string(),
        });
    }

    let mut graph = CfsmGraph::new();
    let mut state_of: HashMap<CfgNodeIndex, petgraph::graph::NodeIndex> = HashMap::new();
    for node_idx in cfg.graph.node_indices() {
        state_of.insert(node_idx, graph.add_node(()));
    }

    for edge in cfg.graph.edge_references() {
        let from_cfg = edge.source();
        let to_cfg = edge.target();
        let from_state = state_of[&from_cfg];
        let to_state = state_of[&to_cfg];
        let node = &cfg.graph[from_cfg];

        match &node.kind {
            NodeKind::Action(ActionKind::Message { sender, receivers, message }) => {
                if sender == role {
                    graph.add_edge(
                        from_state,
                        to_state,
                        Action::Send { peers: receivers.clone(), message: message.clone() },
                    );
                } else if receivers.contains(role) {
                    graph.add_edge(
                        from_state,
                        to_state,
                        Action::Receive { peer: sender.clone(), message: message.clone() },
                    );
                } else {
                    graph.add_edge(from_state, to_state, Action::Tau);
                }
            }
            NodeKind::Action(ActionKind::Call { protocol_name, role_args }) => {
                if let Some(pos) = role_args.iter().position(|r| r == role) {
                    let callee = registry.lookup(protocol_name).ok_or_else(|| {
                        ProjectionError::UnknownProtocol { protocol_name: protocol_name.clone() }
                    })?;
                    let as_role = callee.roles.get(pos).cloned().ok_or_else(|| {
                        ProjectionError::DoRoleMismatch {
                            protocol_name: protocol_name.clone(),
                            role: role.to_string(),
                        }
                    })?;
                    graph.add_edge(
                        from_state,
                        to_state,
                        Action::Call { protocol_name: protocol_name.clone(), as_role },
                    );
                } else {
                    graph.add_edge(from_state, to_state, Action::Tau);
                }
            }
            NodeKind::Initial
            | NodeKind::Terminal
            | NodeKind::Branch { .. }
            | NodeKind::Merge
            | NodeKind::Fork
            | NodeKind::Join
            | NodeKind::Recursive { .. } => {
                graph.add_edge(from_state, to_state, Action::Tau);
            }
        }
    }

    let initial = state_of[&cfg.initial];
    let terminals = cfg.terminals.iter().map(|t| state_of[t]).collect();

    Ok(Cfsm { role: role.clone(), protocol_name: protocol.name.clone(), graph, initial, terminals })
}

/// Projects all declared roles of `protocol` at once.
pub fn project_all(
    protocol: &GlobalProtocol,
    cfg: &ProtocolCfg,
    registry: &ProtocolRegistry,
) -> Result<Vec<Cfsm>, ProjectionError> {
    protocol.roles.iter().map(|role| project(protocol, cfg, registry, role)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Interaction, MessageSignature, Span};
    use crate::cfg;

    fn msg(sender: &str, receivers: &[&str], label: &str) -> Interaction {
        Interaction::MessageTransfer {
            sender: Role::new(sender),
            receivers: receivers.iter().map(|r| Role::new(*r)).collect(),
            message: MessageSignature::new(label, Vec::new()),
            span: Span::synthetic(),
        }
    }

    fn protocol(roles: &[&str], body: Vec<Interaction>) -> GlobalProtocol {
        GlobalProtocol {
            name: "P".to_string(),
            roles: roles.iter().map(|r| Role::new(*r)).collect(),
            parameters: Vec::new(),
            body,
            span: Span::synthetic(),
        }
    }

    #[test]
    fn sender_gets_send_receiver_gets_receive() {
        let protocol = protocol(&["A", "B"], vec![msg("A", &["B"], "Hello")]);
        let cfg = cfg::build(&protocol).unwrap();
        let registry = ProtocolRegistry::new();

        let a = project(&protocol, &cfg, &registry, &Role::new("A")).unwrap();
        let has_send = a.graph.edge_weights().any(|a| matches!(a, Action::Send { .. }));
        assert!(has_send);

        let b = project(&protocol, &cfg, &registry, &Role::new("B")).unwrap();
        let has_receive = b.graph.edge_weights().any(|a| matches!(a, Action::Receive { .. }));
        assert!(has_receive);
    }

    #[test]
    fn uninvolved_role_sees_tau() {
        let protocol = protocol(&["A", "B", "C"], vec![msg("A", &["B"], "Hello")]);
        let cfg = cfg::build(&protocol).unwrap();
        let registry = ProtocolRegistry::new();

        let c = project(&protocol, &cfg, &registry, &Role::new("C")).unwrap();
        assert!(c.graph.edge_weights().all(|a| a.is_tau()));
    }

    #[test]
    fn multicast_projects_to_one_send_with_full_receiver_set() {
        let protocol = protocol(&["A", "B", "C"], vec![msg("A", &["B", "C"], "Hello")]);
        let cfg = cfg::build(&protocol).unwrap();
        let registry = ProtocolRegistry::new();

        let a = project(&protocol, &cfg, &registry, &Role::new("A")).unwrap();
        let sends: Vec<_> = a.graph.edge_weights().filter(|a| matches!(a, Action::Send { .. })).collect();
        assert_eq!(sends.len(), 1);
        match &sends[0] {
            Action::Send { peers, .. } => {
                assert_eq!(peers, &[Role::new("B"), Role::new("C")]);
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn rejects_role_not_in_protocol() {
        let protocol = protocol(&["A", "B"], vec![msg("A", &["B"], "Hello")]);
        let cfg = cfg::build(&protocol).unwrap();
        let registry = ProtocolRegistry::new();

        let err = project(&protocol, &cfg, &registry, &Role::new("Z")).unwrap_err();
        assert!(matches!(err, ProjectionError::RoleNotInProtocol { .. }));
    }
}
