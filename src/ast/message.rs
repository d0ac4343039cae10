// Message signatures (spec.md §3 "Message signature")

use std::fmt;

/// `(label, [payload_type…])` — a label unique among its choice siblings
/// (enforced by the verifier's choice-determinism check, spec.md §4.6) with
/// opaque payload type identifiers, possibly carrying type arguments
/// (`Pair<Int, Bool>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageSignature {
    pub label: String,
    pub payload: Vec<PayloadType>,
}

impl MessageSignature {
    pub fn new(label: impl Into<String>, payload: Vec<PayloadType>) -> Self {
        MessageSignature { label: label.into(), payload }
    }
}

impl fmt::Display for MessageSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)?;
        if !self.payload.is_empty() {
            write!(f, "(")?;
            for (i, p) in self.payload.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{p}")?;
            }
            write!(f, ")")?;
        }
        Ok(())
    }
}

/// An opaque payload type identifier, with optional type arguments
/// (`Pair<Int, Bool>`). The toolchain never inspects payload types beyond
/// identity — schema integration is explicitly out of scope (spec.md §1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PayloadType {
    pub name: String,
    pub args: Vec<PayloadType>,
}

impl PayloadType {
    pub fn simple(name: impl Into<String>) -> Self {
        PayloadType { name: name.into(), args: Vec::new() }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, a) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{a}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
