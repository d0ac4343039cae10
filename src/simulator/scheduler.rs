// Scheduling strategies for picking which enabled role steps next (spec.md §4.10)

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ast::Role;

/// Chooses among currently-enabled roles each step.
#[derive(Debug, Clone)]
pub enum Scheduler {
    /// Cycles through roles in declaration order, skipping any not enabled.
    RoundRobin { next: usize },
    /// Picks uniformly at random among enabled roles.
    Random,
    /// Picks the enabled role that has gone longest without being scheduled.
    Fair { last_scheduled: std::collections::HashMap<Role, usize> },
    /// Defers entirely to the caller (used by interactive/manual drivers).
    Manual,
}

impl Scheduler {
    pub fn round_robin() -> Self {
        Scheduler::RoundRobin { next: 0 }
    }

    pub fn random() -> Self {
        Scheduler::Random
    }

    pub fn fair() -> Self {
        Scheduler::Fair { last_scheduled: std::collections::HashMap::new() }
    }

    pub fn manual() -> Self {
        Scheduler::Manual
    }

    /// Picks one role from `enabled_roles` (in stable order), or `None` if
    /// `Manual` (the caller must choose directly) or the slice is empty.
    pub fn pick(&mut self, step: usize, enabled_roles: &[Role]) -> Option<Role> {
        if enabled_roles.is_empty() {
            return None;
        }
        match self {
            Scheduler::RoundRobin { next } => {
                let chosen = enabled_roles[*next % enabled_roles.len()].clone();
                *next = next.wrapping_add(1);
                Some(chosen)
            }
            Scheduler::Random => {
                let mut rng = rand::thread_rng();
                enabled_roles.choose(&mut rng).cloned()
            }
            Scheduler::Fair { last_scheduled } => {
                let chosen = enabled_roles
                    .iter()
                    .min_by_key(|r| last_scheduled.get(*r).copied().unwrap_or(0))
                    .cloned();
                if let Some(role) = &chosen {
                    last_scheduled.insert(role.clone(), step);
                }
                chosen
            }
            Scheduler::Manual => None,
        }
    }

    /// Picks which of a role's `count` enabled transitions to take (the
    /// internal-choice branches at a `choice at <self>` state): index `0`
    /// for `RoundRobin`/`Fair`/`Manual`, uniformly at random for `Random` —
    /// so an automatic `Random` run can reach every branch, not just the
    /// first (spec.md §4.9 step 3).
    pub fn pick_transition(&mut self, count: usize) -> usize {
        if count <= 1 {
            return 0;
        }
        match self {
            Scheduler::Random => rand::thread_rng().gen_range(0..count),
            Scheduler::RoundRobin { .. } | Scheduler::Fair { .. } | Scheduler::Manual => 0,
        }
    }
}
