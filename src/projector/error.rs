// Projection-time errors (spec.md §4.4, §7)

use thiserror::Error;

use crate::registry::RegistryError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProjectionError {
    #[error("role `{role}` is not a participant of protocol `{protocol}`")]
    RoleNotInProtocol { protocol: String, role: String },

    #[error("`do {protocol_name}` invoked but `{protocol_name}` is not declared")]
    UnknownProtocol { protocol_name: String },

    #[error(
        "role `{role}` participates in `do {protocol_name}(...)` but has no corresponding formal role"
    )]
    DoRoleMismatch { protocol_name: String, role: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
