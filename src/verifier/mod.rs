//! Well-formedness verification (spec.md §4.6, component C6).
//!
//! Runs the checks of spec.md §4.6's table against the AST, the shared CFG,
//! and each role's projected CFSM, and classifies each finding fatal or
//! advisory the way that table does.

pub mod report;

pub use report::{Check, Finding, Severity, VerificationReport};

use std::collections::HashSet;

use crate::analysis;
use crate::ast::{GlobalProtocol, Interaction, Role};
use crate::cfsm::Cfsm;
use crate::registry::ProtocolRegistry;

/// Runs every check against `protocol` and its already-projected `cfsms`.
pub fn verify(protocol: &GlobalProtocol, registry: &ProtocolRegistry, cfsms: &[Cfsm]) -> VerificationReport {
    let mut report = VerificationReport::default();

    check_self_communication(protocol, &mut report);
    check_connectedness(protocol, &mut report);
    check_choice_determinism(&protocol.body, &mut report);
    check_race_freedom(&protocol.body, &mut report);
    check_role_arity_and_scope(protocol, registry, &mut report);
    check_well_formed_recursion(&protocol.body, &mut report);
    check_progress(cfsms, &mut report);

    report
}

fn check_self_communication(protocol: &GlobalProtocol, report: &mut VerificationReport) {
    fn walk(body: &[Interaction], report: &mut VerificationReport) {
        for stmt in body {
            match stmt {
                Interaction::MessageTransfer { sender, receivers, span, .. } => {
                    if receivers.contains(sender) {
                        report.push(
                            Check::SelfCommunication,
                            Severity::Fatal,
                            format!("role `{sender}` sends to itself at {span}"),
                        );
                    }
                }
                Interaction::Choice { branches, .. } | Interaction::Parallel { branches, .. } => {
                    for branch in branches {
                        walk(branch, report);
                    }
                }
                Interaction::Recursion { body, .. } => walk(body, report),
                Interaction::Continue { .. } | Interaction::Do { .. } => {}
            }
        }
    }
    walk(&protocol.body, report);
}

fn check_connectedness(protocol: &GlobalProtocol, report: &mut VerificationReport) {
    let mut mentioned = Vec::new();
    for stmt in &protocol.body {
        stmt.mentioned_roles(&mut mentioned);
    }
    let mentioned: HashSet<&Role> = mentioned.iter().collect();
    for role in &protocol.roles {
        if !mentioned.contains(role) {
            report.push(
                Check::Connectedness,
                Severity::Warning,
                format!("role `{role}` is declared but never participates in protocol `{}`", protocol.name),
            );
        }
    }
}

/// Each choice branch's first observable action must be a send by the
/// decider, with distinct labels across sibling branches.
fn check_choice_determinism(body: &[Interaction], report: &mut VerificationReport) {
    for stmt in body {
        match stmt {
            Interaction::Choice { decider, branches, span } => {
                let mut labels = HashSet::new();
                for branch in branches {
                    match first_send_label(branch) {
                        Some((sender, Some(label))) if &sender == decider => {
                            if !labels.insert(label.clone()) {
                                report.push(
                                    Check::ChoiceDeterminism,
                                    Severity::Fatal,
                                    format!("duplicate label `{label}` among branches of choice at {span}"),
                                );
                            }
                        }
                        Some((sender, None)) if &sender == decider => {
                            // Leading action is a nested choice decided by the same
                            // role; label uniqueness is that nested choice's concern.
                        }
                        Some((sender, _)) => {
                            report.push(
                                Check::ChoiceDeterminism,
                                Severity::Fatal,
                                format!(
                                    "choice at {span} is decided by `{decider}` but a branch's first send is by `{sender}`"
                                ),
                            );
                        }
                        None => report.push(
                            Check::ChoiceDeterminism,
                            Severity::Fatal,
                            format!("a branch of choice at {span} has no leading send"),
                        ),
                    }
                    check_choice_determinism(branch, report);
                }
            }
            Interaction::Parallel { branches, .. } => {
                for branch in branches {
                    check_choice_determinism(branch, report);
                }
            }
            Interaction::Recursion { body, .. } => check_choice_determinism(body, report),
            Interaction::MessageTransfer { .. } | Interaction::Continue { .. } | Interaction::Do { .. } => {}
        }
    }
}

fn first_send_label(body: &[Interaction]) -> Option<(Role, Option<String>)> {
    body.first().and_then(|stmt| match stmt {
        Interaction::MessageTransfer { sender, message, .. } => {
            Some((sender.clone(), Some(message.label.clone())))
        }
        Interaction::Choice { decider, .. } => Some((decider.clone(), None)),
        _ => None,
    })
}

/// Channels used by sibling `par` branches must be pairwise disjoint.
fn check_race_freedom(body: &[Interaction], report: &mut VerificationReport) {
    for stmt in body {
        match stmt {
            Interaction::Parallel { branches, span } => {
                let channel_sets: Vec<HashSet<(Role, Role)>> =
                    branches.iter().map(|b| channels_used(b)).collect();
                for i in 0..channel_sets.len() {
                    for j in (i + 1)..channel_sets.len() {
                        if !channel_sets[i].is_disjoint(&channel_sets[j]) {
                            report.push(
                                Check::RaceFreedom,
                                Severity::Fatal,
                                format!("par branches at {span} share a channel"),
                            );
                        }
                    }
                }
                for branch in branches {
                    check_race_freedom(branch, report);
                }
            }
            Interaction::Choice { branches, .. } => {
                for branch in branches {
                    check_race_freedom(branch, report);
                }
            }
            Interaction::Recursion { body, .. } => check_race_freedom(body, report),
            Interaction::MessageTransfer { .. } | Interaction::Continue { .. } | Interaction::Do { .. } => {}
        }
    }
}

fn channels_used(body: &[Interaction]) -> HashSet<(Role, Role)> {
    let mut out = HashSet::new();
    fn walk(body: &[Interaction], out: &mut HashSet<(Role, Role)>) {
        for stmt in body {
            match stmt {
                Interaction::MessageTransfer { sender, receivers, .. } => {
                    for r in receivers {
                        out.insert((sender.clone(), r.clone()));
                    }
                }
                Interaction::Choice { branches, .. } | Interaction::Parallel { branches, .. } => {
                    for b in branches {
                        walk(b, out);
                    }
                }
                Interaction::Recursion { body, .. } => walk(body, out),
                Interaction::Continue { .. } | Interaction::Do { .. } => {}
            }
        }
    }
    walk(body, &mut out);
    out
}

fn check_role_arity_and_scope(protocol: &GlobalProtocol, registry: &ProtocolRegistry, report: &mut VerificationReport) {
    fn walk(body: &[Interaction], protocol: &GlobalProtocol, registry: &ProtocolRegistry, report: &mut VerificationReport) {
        for stmt in body {
            match stmt {
                Interaction::Do { protocol_name, role_args, span } => {
                    if let Err(e) = registry.validate_do(protocol, protocol_name, role_args) {
                        report.push(Check::RoleArityAndScope, Severity::Fatal, format!("{e} (at {span})"));
                    }
                }
                Interaction::Choice { branches, .. } | Interaction::Parallel { branches, .. } => {
                    for b in branches {
                        walk(b, protocol, registry, report);
                    }
                }
                Interaction::Recursion { body, .. } => walk(body, protocol, registry, report),
                Interaction::MessageTransfer { .. } | Interaction::Continue { .. } => {}
            }
        }
    }
    walk(&protocol.body, protocol, registry, report);
}

fn check_well_formed_recursion(body: &[Interaction], report: &mut VerificationReport) {
    for stmt in body {
        match stmt {
            Interaction::Recursion { label, body: rec_body, span } => {
                if unguarded_path_to(rec_body, label, false) {
                    report.push(
                        Check::WellFormedRecursion,
                        Severity::Warning,
                        format!("`rec {label}` at {span} has a recursion path with no observable action (zeno loop)"),
                    );
                }
                check_well_formed_recursion(rec_body, report);
            }
            Interaction::Choice { branches, .. } | Interaction::Parallel { branches, .. } => {
                for b in branches {
                    check_well_formed_recursion(b, report);
                }
            }
            Interaction::MessageTransfer { .. } | Interaction::Continue { .. } | Interaction::Do { .. } => {}
        }
    }
}

/// Whether some path through `body` reaches `continue label` without
/// passing through an observable action (a message transfer or `do`) first.
/// `guarded` carries whether an observable action has already occurred on
/// the path taken to reach `body` (e.g. before entering a `choice` branch).
fn unguarded_path_to(body: &[Interaction], label: &str, mut guarded: bool) -> bool {
    for stmt in body {
        match stmt {
            Interaction::MessageTransfer { .. } | Interaction::Do { .. } => {
                guarded = true;
            }
            Interaction::Continue { label: target, .. } => {
                return !guarded && target == label;
            }
            Interaction::Choice { branches, .. } | Interaction::Parallel { branches, .. } => {
                if branches.iter().any(|b| unguarded_path_to(b, label, guarded)) {
                    return true;
                }
            }
            Interaction::Recursion { body: inner_body, .. } => {
                if unguarded_path_to(inner_body, label, guarded) {
                    return true;
                }
            }
        }
    }
    false
}

fn check_progress(cfsms: &[Cfsm], report: &mut VerificationReport) {
    for cfsm in cfsms {
        if !analysis::can_reach_terminal(cfsm, cfsm.initial) {
            report.push(
                Check::Progress,
                Severity::Warning,
                format!("role `{}` has no path from its initial state to a terminal state", cfsm.role),
            );
        }
    }
}
