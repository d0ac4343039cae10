//! Protocol registry (spec.md §4.2, component C2).
//!
//! Associates protocol names with their declarations and validates `do`
//! invocations. Grounded in the teacher's choreography validation pattern
//! (`choreography::validate`, `ast/protocol.rs`'s `Protocol::validate`),
//! generalized from a single in-scope choreography to a module of named
//! protocols that can invoke each other.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::ast::{GlobalProtocol, Role};

/// Errors raised validating a `do` invocation (spec.md §4.2, §4.4.4, §7).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("protocol `{0}` is not declared")]
    UnknownProtocol(String),

    #[error("`do {protocol}` passes {actual} role(s), but `{protocol}` declares {formal}")]
    DoArity {
        protocol: String,
        formal: usize,
        actual: usize,
    },

    #[error("`do {protocol}` aliases role `{role}` to more than one formal parameter")]
    RoleAliasing { protocol: String, role: String },

    #[error("`do {protocol}` passes role `{role}`, which is not declared by the caller")]
    UndeclaredRole { protocol: String, role: String },
}

/// A validated formal→actual role mapping for one `do` invocation.
pub type RoleMap = HashMap<Role, Role>;

/// Associates protocol names with their declarations.
#[derive(Debug, Default)]
pub struct ProtocolRegistry {
    protocols: HashMap<String, GlobalProtocol>,
}

impl ProtocolRegistry {
    pub fn new() -> Self {
        ProtocolRegistry { protocols: HashMap::new() }
    }

    pub fn insert(&mut self, protocol: GlobalProtocol) {
        self.protocols.insert(protocol.name.clone(), protocol);
    }

    pub fn lookup(&self, name: &str) -> Option<&GlobalProtocol> {
        self.protocols.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.protocols.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlobalProtocol> {
        self.protocols.values()
    }

    /// Checks arity (actuals = formals), uniqueness (actuals pairwise
    /// distinct), and scope (actuals declared in `caller`), then returns the
    /// formal→actual role map (spec.md §4.2).
    pub fn validate_do(
        &self,
        caller: &GlobalProtocol,
        protocol_name: &str,
        role_args: &[Role],
    ) -> Result<RoleMap, RegistryError> {
        let callee = self
            .lookup(protocol_name)
            .ok_or_else(|| RegistryError::UnknownProtocol(protocol_name.to_string()))?;

        if callee.roles.len() != role_args.len() {
            return Err(RegistryError::DoArity {
                protocol: protocol_name.to_string(),
                formal: callee.roles.len(),
                actual: role_args.len(),
            });
        }

        let mut seen = HashSet::new();
        for role in role_args {
            if !seen.insert(role.clone()) {
                return Err(RegistryError::RoleAliasing {
                    protocol: protocol_name.to_string(),
                    role: role.to_string(),
                });
            }
            if !caller.declares_role(role) {
                return Err(RegistryError::UndeclaredRole {
                    protocol: protocol_name.to_string(),
                    role: role.to_string(),
                });
            }
        }

        Ok(callee
            .roles
            .iter()
            .cloned()
            .zip(role_args.iter().cloned())
            .collect())
    }
}
