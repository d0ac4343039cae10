//! Source locations attached to AST nodes.

use std::fmt;

/// A byte-range location in the original protocol source, used to render
/// `file:line:col` diagnostics (spec.md §7) and `codespan-reporting` labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Span { start, end, line, col }
    }

    /// A span with no useful location, for synthesized nodes.
    pub fn synthetic() -> Self {
        Span::default()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}
