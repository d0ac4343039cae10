// AST -> CFG construction (spec.md §4.3, component C3)

use std::collections::HashMap;

use thiserror::Error;

use crate::ast::{GlobalProtocol, Interaction, Span};
use crate::cfg::graph::{ActionKind, Cfg, EdgeKind, Node, NodeIndex, NodeKind};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CfgError {
    #[error("`continue {label}` at {span} has no enclosing `rec {label}` in scope")]
    UnboundRecursionLabel { label: String, span: Span },
}

/// One protocol's control-flow graph: an `initial` node, at least one
/// `terminal` node, and the rest of the structure from spec.md §4.3's table.
pub struct ProtocolCfg {
    pub graph: Cfg,
    pub initial: NodeIndex,
    pub terminals: Vec<NodeIndex>,
}

/// The dangling end of a chain under construction: either still open for a
/// following statement to attach to (`Open`, the common case — possibly
/// several dangling exits after a `choice`/`par` merges back together), or
/// already dead-ended into a `continue` target (`Closed` — no statement may
/// follow it in the same block, enforced by the parser).
enum Tail {
    Open(Vec<NodeIndex>),
    Closed,
}

pub fn build(protocol: &GlobalProtocol) -> Result<ProtocolCfg, CfgError> {
    let mut graph = Cfg::new();
    let initial = graph.add_node(Node { kind: NodeKind::Initial, span: protocol.span });
    let terminal = graph.add_node(Node { kind: NodeKind::Terminal, span: protocol.span });

    let mut rec_labels = HashMap::new();
    let (entry, tail) = build_body(&protocol.body, &mut graph, &mut rec_labels)?;

    match entry {
        None => {
            // Open question (spec.md §9): an empty protocol body terminates
            // immediately.
            graph.add_edge(initial, terminal, EdgeKind::Next);
        }
        Some(entry) => {
            graph.add_edge(initial, entry, EdgeKind::Next);
            if let Tail::Open(exits) = tail {
                for exit in exits {
                    graph.add_edge(exit, terminal, EdgeKind::Next);
                }
            }
            // `Tail::Closed`: every path already dead-ends into a `continue`;
            // `terminal` is unreachable from this body. The verifier's
            // progress check (spec.md §4.6) reports that, not construction.
        }
    }

    Ok(ProtocolCfg { graph, initial, terminals: vec![terminal] })
}

/// Builds `body` in sequence, returning the entry point of its first
/// statement (`None` for an empty body) and the dangling tail to attach the
/// next statement (or the enclosing merge/join/terminal) to.
fn build_body(
    body: &[Interaction],
    graph: &mut Cfg,
    rec_labels: &mut HashMap<String, NodeIndex>,
) -> Result<(Option<NodeIndex>, Tail), CfgError> {
    let mut first_entry = None;
    let mut tail = Tail::Open(Vec::new());

    for stmt in body {
        let (entry, next_tail) = build_statement(stmt, graph, rec_labels)?;
        if first_entry.is_none() {
            first_entry = Some(entry);
        } else if let Tail::Open(exits) = &tail {
            let edge_kind =
                if matches!(stmt, Interaction::Continue { .. }) { EdgeKind::Continue } else { EdgeKind::Next };
            for &exit in exits {
                graph.add_edge(exit, entry, edge_kind);
            }
        }
        tail = next_tail;
    }

    Ok((first_entry, tail))
}

fn build_statement(
    stmt: &Interaction,
    graph: &mut Cfg,
    rec_labels: &mut HashMap<String, NodeIndex>,
) -> Result<(NodeIndex, Tail), CfgError> {
    match stmt {
        Interaction::MessageTransfer { sender, receivers, message, span } => {
            let node = graph.add_node(Node {
                kind: NodeKind::Action(ActionKind::Message {
                    sender: sender.clone(),
                    receivers: receivers.clone(),
                    message: message.clone(),
                }),
                span: *span,
            });
            Ok((node, Tail::Open(vec![node])))
        }

        Interaction::Do { protocol_name, role_args, span } => {
            let node = graph.add_node(Node {
                kind: NodeKind::Action(ActionKind::Call {
                    protocol_name: protocol_name.clone(),
                    role_args: role_args.clone(),
                }),
                span: *span,
            });
            Ok((node, Tail::Open(vec![node])))
        }

        Interaction::Choice { decider, branches, span } => {
            let branch_node =
                graph.add_node(Node { kind: NodeKind::Branch { decider: decider.clone() }, span: *span });
            let merge_node = graph.add_node(Node { kind: NodeKind::Merge, span: *span });

            for branch in branches {
                let (entry, tail) = build_body(branch, graph, rec_labels)?;
                let entry = entry.unwrap_or(merge_node);
                graph.add_edge(branch_node, entry, EdgeKind::Branch);
                if let Tail::Open(exits) = tail {
                    for exit in exits {
                        graph.add_edge(exit, merge_node, EdgeKind::ToMerge);
                    }
                }
            }

            Ok((branch_node, Tail::Open(vec![merge_node])))
        }

        Interaction::Parallel { branches, span } => {
            let fork_node = graph.add_node(Node { kind: NodeKind::Fork, span: *span });
            let join_node = graph.add_node(Node { kind: NodeKind::Join, span: *span });

            for branch in branches {
                let (entry, tail) = build_body(branch, graph, rec_labels)?;
                let entry = entry.unwrap_or(join_node);
                graph.add_edge(fork_node, entry, EdgeKind::ForkOut);
                if let Tail::Open(exits) = tail {
                    for exit in exits {
                        graph.add_edge(exit, join_node, EdgeKind::ToJoin);
                    }
                }
            }

            Ok((fork_node, Tail::Open(vec![join_node])))
        }

        Interaction::Recursion { label, body, span } => {
            let rec_node =
                graph.add_node(Node { kind: NodeKind::Recursive { label: label.clone() }, span: *span });
            rec_labels.insert(label.clone(), rec_node);
            let (entry, tail) = build_body(body, graph, rec_labels)?;
            rec_labels.remove(label);

            match entry {
                None => Ok((rec_node, Tail::Open(vec![rec_node]))),
                Some(entry) => {
                    graph.add_edge(rec_node, entry, EdgeKind::Next);
                    Ok((rec_node, tail))
                }
            }
        }

        Interaction::Continue { label, span } => {
            let target = rec_labels
                .get(label)
                .copied()
                .ok_or_else(|| CfgError::UnboundRecursionLabel { label: label.clone(), span: *span })?;
            Ok((target, Tail::Closed))
        }
    }
}
