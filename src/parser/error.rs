// Parse-time errors (spec.md §6.1, §7)

use thiserror::Error;

use crate::ast::Span;

/// Errors raised turning protocol source text into a [`crate::ast::GlobalProtocol`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("syntax error at {span}: {message}")]
    Syntax { message: String, span: Span },

    #[error("`continue {label}` at {span} has no enclosing `rec {label}`")]
    UnboundRecursionLabel { label: String, span: Span },

    #[error("`rec {label}` at {span} shadows an already-bound recursion label")]
    ShadowedRecursionLabel { label: String, span: Span },

    #[error("statement at {span} follows a `continue` in the same block")]
    UnreachableAfterContinue { span: Span },

    #[error("duplicate protocol declaration `{name}`")]
    DuplicateProtocol { name: String },

    #[error("role `{role}` used at {span} is not declared by protocol `{protocol}`")]
    UndeclaredRole { protocol: String, role: String, span: Span },
}
