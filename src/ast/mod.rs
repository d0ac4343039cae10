//! Typed AST for global protocol declarations (spec.md §3, §4.1).
//!
//! This is the only hand-written surface in the pipeline; every later form
//! (CFG, CFSM) is derived from it. Interaction and action nodes are tagged
//! sum types, never class hierarchies (spec.md §9).

pub mod message;
pub mod protocol;
pub mod role;
pub mod span;

pub use message::{MessageSignature, PayloadType};
pub use protocol::{sequence_mentions, GlobalProtocol, Interaction};
pub use role::Role;
pub use span::Span;
