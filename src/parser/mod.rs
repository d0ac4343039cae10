//! Grammar-driven parser for the external protocol syntax (spec.md §6.1).
//!
//! Grounded in the teacher's `compiler::parser` seam (a placeholder in the
//! teacher, since it fed a proc-macro rather than free-standing source text)
//! generalized to a real text grammar via `pest`, matched to the `fsm` crate's
//! `subtype` binary for diagnostic rendering conventions.

pub mod error;

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser as PestParser;

use crate::ast::{GlobalProtocol, Interaction, MessageSignature, PayloadType, Role, Span};
pub use error::ParseError;

#[derive(PestParser)]
#[grammar = "parser/grammar.pest"]
struct ProtocolParser;

/// Parses protocol source text into every `global protocol` declaration it
/// contains, in declaration order. `local protocol` declarations are
/// accepted syntactically but dropped — they describe a CFSM, not a global
/// protocol, and nothing downstream consumes hand-written local protocols.
pub fn parse(source: &str) -> Result<Vec<GlobalProtocol>, ParseError> {
    let mut file = ProtocolParser::parse(Rule::file, source).map_err(|e| ParseError::Syntax {
        message: e.to_string(),
        span: Span::synthetic(),
    })?;

    let file_pair = file.next().expect("file rule always produces one pair");
    let mut protocols = Vec::new();
    let mut seen_names = std::collections::HashSet::new();

    for decl in file_pair.into_inner() {
        match decl.as_rule() {
            Rule::protocol_decl => {
                let inner = decl.into_inner().next().expect("protocol_decl has one child");
                match inner.as_rule() {
                    Rule::global_protocol => {
                        let protocol = build_global_protocol(inner)?;
                        if !seen_names.insert(protocol.name.clone()) {
                            return Err(ParseError::DuplicateProtocol { name: protocol.name });
                        }
                        protocols.push(protocol);
                    }
                    Rule::local_protocol => {
                        // Parsed for syntactic acceptance only; discarded.
                    }
                    _ => unreachable!("protocol_decl yields only global or local protocol"),
                }
            }
            Rule::EOI => {}
            other => unreachable!("unexpected top-level rule {other:?}"),
        }
    }

    Ok(protocols)
}

fn span_of(pair: &Pair<Rule>) -> Span {
    let span = pair.as_span();
    let (line, col) = span.start_pos().line_col();
    Span::new(span.start(), span.end(), line, col)
}

fn build_global_protocol(pair: Pair<Rule>) -> Result<GlobalProtocol, ParseError> {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();

    let name_pair = inner.next().expect("global_protocol has a name");
    let name = name_pair.as_str().to_string();

    let mut roles = Vec::new();
    let mut next = inner.next().expect("global_protocol has a body");
    if next.as_rule() == Rule::role_param_list {
        for role_param in next.clone().into_inner() {
            let ident = role_param.into_inner().next().expect("role_param has an ident");
            roles.push(Role::new(ident.as_str()));
        }
        next = inner.next().expect("global_protocol has a body after roles");
    }

    let mut rec_stack = Vec::new();
    let body = build_body(next, &mut rec_stack)?;

    let protocol = GlobalProtocol { name, roles, parameters: Vec::new(), body, span };
    check_declared_roles(&protocol)?;
    Ok(protocol)
}

fn check_declared_roles(protocol: &GlobalProtocol) -> Result<(), ParseError> {
    let mut mentioned = Vec::new();
    for i in &protocol.body {
        i.mentioned_roles(&mut mentioned);
    }
    for role in mentioned {
        if !protocol.declares_role(&role) {
            return Err(ParseError::UndeclaredRole {
                protocol: protocol.name.clone(),
                role: role.to_string(),
                span: protocol.span,
            });
        }
    }
    Ok(())
}

fn build_body(pair: Pair<Rule>, rec_stack: &mut Vec<String>) -> Result<Vec<Interaction>, ParseError> {
    let mut out = Vec::new();
    let mut seen_continue: Option<Span> = None;

    for stmt in pair.into_inner() {
        if let Some(_) = seen_continue {
            return Err(ParseError::UnreachableAfterContinue { span: span_of(&stmt) });
        }
        let interaction = build_statement(stmt, rec_stack)?;
        if let Interaction::Continue { .. } = &interaction {
            seen_continue = Some(interaction.span());
        }
        out.push(interaction);
    }

    Ok(out)
}

fn build_statement(pair: Pair<Rule>, rec_stack: &mut Vec<String>) -> Result<Interaction, ParseError> {
    let stmt = pair.into_inner().next().expect("statement has one child");
    match stmt.as_rule() {
        Rule::message_stmt => build_message(stmt),
        Rule::choice_stmt => build_choice(stmt, rec_stack),
        Rule::par_stmt => build_par(stmt, rec_stack),
        Rule::rec_stmt => build_rec(stmt, rec_stack),
        Rule::continue_stmt => build_continue(stmt, rec_stack),
        Rule::do_stmt => build_do(stmt),
        other => unreachable!("unexpected statement rule {other:?}"),
    }
}

fn build_message(pair: Pair<Rule>) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let form = pair.into_inner().next().expect("message_stmt has one child");
    match form.as_rule() {
        Rule::arrow_msg => build_arrow_msg(form, span),
        Rule::from_to_msg => build_from_to_msg(form, span),
        other => unreachable!("unexpected message_stmt rule {other:?}"),
    }
}

fn build_arrow_msg(pair: Pair<Rule>, span: Span) -> Result<Interaction, ParseError> {
    let mut idents = Vec::new();
    let mut label = None;
    let mut payload = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => idents.push(Role::new(part.as_str())),
            Rule::label => label = Some(part.as_str().to_string()),
            Rule::payload_list => payload = build_payload_list(part),
            other => unreachable!("unexpected arrow_msg part {other:?}"),
        }
    }

    let sender = idents.remove(0);
    let message = MessageSignature::new(label.expect("arrow_msg always has a label"), payload);
    Ok(Interaction::MessageTransfer { sender, receivers: idents, message, span })
}

fn build_from_to_msg(pair: Pair<Rule>, span: Span) -> Result<Interaction, ParseError> {
    let mut idents = Vec::new();
    let mut label = None;
    let mut payload = Vec::new();

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::ident => idents.push(Role::new(part.as_str())),
            Rule::label => label = Some(part.as_str().to_string()),
            Rule::payload_list => payload = build_payload_list(part),
            other => unreachable!("unexpected from_to_msg part {other:?}"),
        }
    }

    let sender = idents.remove(0);
    let message = MessageSignature::new(label.expect("from_to_msg always has a label"), payload);
    Ok(Interaction::MessageTransfer { sender, receivers: idents, message, span })
}

fn build_payload_list(pair: Pair<Rule>) -> Vec<PayloadType> {
    pair.into_inner().map(build_payload_type).collect()
}

fn build_payload_type(pair: Pair<Rule>) -> PayloadType {
    let mut inner = pair.into_inner();
    let name = inner.next().expect("payload_type has a name").as_str().to_string();
    let args = match inner.next() {
        Some(list) => build_payload_list(list),
        None => Vec::new(),
    };
    PayloadType { name, args }
}

fn build_choice(pair: Pair<Rule>, rec_stack: &mut Vec<String>) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let decider = Role::new(inner.next().expect("choice_stmt has a decider").as_str());

    let mut branches = Vec::new();
    for body_pair in inner {
        branches.push(build_body(body_pair, rec_stack)?);
    }

    Ok(Interaction::Choice { decider, branches, span })
}

fn build_par(pair: Pair<Rule>, rec_stack: &mut Vec<String>) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let mut branches = Vec::new();
    for body_pair in pair.into_inner() {
        branches.push(build_body(body_pair, rec_stack)?);
    }
    Ok(Interaction::Parallel { branches, span })
}

fn build_rec(pair: Pair<Rule>, rec_stack: &mut Vec<String>) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let mut inner = pair.into_inner();
    let label_pair = inner.next().expect("rec_stmt has a label");
    let label = label_pair.as_str().to_string();

    if rec_stack.contains(&label) {
        return Err(ParseError::ShadowedRecursionLabel { label, span });
    }

    rec_stack.push(label.clone());
    let body_pair = inner.next().expect("rec_stmt has a body");
    let body = build_body(body_pair, rec_stack)?;
    rec_stack.pop();

    Ok(Interaction::Recursion { label, body, span })
}

fn build_continue(pair: Pair<Rule>, rec_stack: &[String]) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let label_pair = pair.into_inner().next().expect("continue_stmt has a label");
    let label = label_pair.as_str().to_string();

    if !rec_stack.contains(&label) {
        return Err(ParseError::UnboundRecursionLabel { label, span });
    }

    Ok(Interaction::Continue { label, span })
}

fn build_do(pair: Pair<Rule>) -> Result<Interaction, ParseError> {
    let span = span_of(&pair);
    let mut idents = pair.into_inner();
    let protocol_name = idents.next().expect("do_stmt has a protocol name").as_str().to_string();
    let role_args = idents.map(|i| Role::new(i.as_str())).collect();
    Ok(Interaction::Do { protocol_name, role_args, span })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_message() {
        let src = "global protocol P(role A, role B) { A -> B: Hello(); }";
        let protocols = parse(src).unwrap();
        assert_eq!(protocols.len(), 1);
        assert_eq!(protocols[0].name, "P");
        assert_eq!(protocols[0].body.len(), 1);
        assert!(matches!(protocols[0].body[0], Interaction::MessageTransfer { .. }));
    }

    #[test]
    fn parses_from_to_syntax_and_payload_types() {
        let src = "global protocol P(role A, role B) { Hello(Pair<Int, Bool>) from A to B; }";
        let protocols = parse(src).unwrap();
        match &protocols[0].body[0] {
            Interaction::MessageTransfer { message, .. } => {
                assert_eq!(message.label, "Hello");
                assert_eq!(message.payload[0].name, "Pair");
                assert_eq!(message.payload[0].args.len(), 2);
            }
            _ => panic!("expected MessageTransfer"),
        }
    }

    #[test]
    fn parses_choice_and_rec_continue() {
        let src = "
            global protocol P(role A, role B) {
                rec Loop {
                    choice at A {
                        A -> B: More();
                        continue Loop;
                    } or {
                        A -> B: Done();
                    }
                }
            }
        ";
        let protocols = parse(src).unwrap();
        assert_eq!(protocols.len(), 1);
        assert!(matches!(protocols[0].body[0], Interaction::Recursion { .. }));
    }

    #[test]
    fn rejects_unbound_continue() {
        let src = "global protocol P(role A, role B) { continue Loop; }";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ParseError::UnboundRecursionLabel { .. }));
    }

    #[test]
    fn rejects_statement_after_continue() {
        let src = "
            global protocol P(role A, role B) {
                rec Loop {
                    continue Loop;
                    A -> B: Unreachable();
                }
            }
        ";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ParseError::UnreachableAfterContinue { .. }));
    }

    #[test]
    fn rejects_undeclared_role() {
        let src = "global protocol P(role A, role B) { A -> C: Hello(); }";
        let err = parse(src).unwrap_err();
        assert!(matches!(err, ParseError::UndeclaredRole { .. }));
    }

    #[test]
    fn parses_par_and_do() {
        let src = "
            global protocol Sub(role A, role B) { A -> B: X(); }
            global protocol P(role A, role B, role C) {
                par {
                    A -> B: X();
                } and {
                    A -> C: Y();
                }
                do Sub(A, B);
            }
        ";
        let protocols = parse(src).unwrap();
        let main = protocols.iter().find(|p| p.name == "P").unwrap();
        assert!(matches!(main.body[0], Interaction::Parallel { .. }));
        assert!(matches!(main.body[1], Interaction::Do { .. }));
    }
}
