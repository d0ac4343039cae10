// Global protocol declarations and interactions (spec.md §3)

use crate::ast::{MessageSignature, Role, Span};

/// A named global protocol declaration (spec.md §3 "Global protocol").
///
/// Identified by name in the module-level [`crate::registry::ProtocolRegistry`].
#[derive(Debug, Clone)]
pub struct GlobalProtocol {
    pub name: String,
    pub roles: Vec<Role>,
    /// Protocol parameters: accepted by the grammar but opaque to this
    /// toolchain — there is nothing in spec.md that assigns them semantics
    /// beyond being carried through declarations.
    pub parameters: Vec<String>,
    pub body: Vec<Interaction>,
    pub span: Span,
}

impl GlobalProtocol {
    /// Every role appearing in an interaction must appear in the
    /// declaration (spec.md §3 "Role" invariant).
    pub fn declares_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }
}

/// One global interaction (spec.md §3 "Global interaction (sum)").
///
/// Exactly one of the six forms below; callers must handle every variant
/// (spec.md §9: "Exhaustive handling at every traversal/visitor is a
/// non-negotiable implementation discipline; a default case is a red flag").
#[derive(Debug, Clone)]
pub enum Interaction {
    /// Point-to-point when `receivers.len() == 1`, multicast otherwise.
    /// Well-formedness requires `sender ∉ receivers` (checked by the
    /// verifier's self-communication rule, spec.md §4.6).
    MessageTransfer {
        sender: Role,
        receivers: Vec<Role>,
        message: MessageSignature,
        span: Span,
    },

    /// `decider` picks among `branches`; each branch's first observable
    /// action must be a send by `decider`, with distinct labels across
    /// branches (enforced by the verifier, not the parser).
    Choice {
        decider: Role,
        branches: Vec<Vec<Interaction>>,
        span: Span,
    },

    /// Concurrently-executing branches. Channels used by distinct branches
    /// must be pairwise disjoint (race freedom, spec.md §4.6).
    Parallel {
        branches: Vec<Vec<Interaction>>,
        span: Span,
    },

    /// `label` is bound in `body`; referenced by a nested [`Interaction::Continue`].
    Recursion {
        label: String,
        body: Vec<Interaction>,
        span: Span,
    },

    /// Jumps back to the enclosing [`Interaction::Recursion`] with matching
    /// `label`. No syntactic context may follow it within its branch — the
    /// parser rejects any statement after a `continue` in the same body.
    Continue { label: String, span: Span },

    /// Invokes another declared protocol; role arity must match and actual
    /// roles must be distinct and declared in the caller (checked by
    /// [`crate::registry::ProtocolRegistry::validate_do`]).
    Do {
        protocol_name: String,
        role_args: Vec<Role>,
        span: Span,
    },
}

impl Interaction {
    pub fn span(&self) -> Span {
        match self {
            Interaction::MessageTransfer { span, .. }
            | Interaction::Choice { span, .. }
            | Interaction::Parallel { span, .. }
            | Interaction::Recursion { span, .. }
            | Interaction::Continue { span, .. }
            | Interaction::Do { span, .. } => *span,
        }
    }

    /// All roles textually mentioned by this interaction and its nested
    /// bodies (used by the verifier's connectedness check, spec.md §4.6).
    pub fn mentioned_roles(&self, out: &mut Vec<Role>) {
        match self {
            Interaction::MessageTransfer { sender, receivers, .. } => {
                out.push(sender.clone());
                out.extend(receivers.iter().cloned());
            }
            Interaction::Choice { decider, branches, .. } => {
                out.push(decider.clone());
                for branch in branches {
                    for i in branch {
                        i.mentioned_roles(out);
                    }
                }
            }
            Interaction::Parallel { branches, .. } => {
                for branch in branches {
                    for i in branch {
                        i.mentioned_roles(out);
                    }
                }
            }
            Interaction::Recursion { body, .. } => {
                for i in body {
                    i.mentioned_roles(out);
                }
            }
            Interaction::Continue { .. } | Interaction::Do { .. } => {}
        }
    }
}

/// Mentioned roles across a whole interaction sequence.
pub fn sequence_mentions(body: &[Interaction], role: &Role) -> bool {
    let mut mentioned = Vec::new();
    for i in body {
        i.mentioned_roles(&mut mentioned);
    }
    mentioned.contains(role)
}
