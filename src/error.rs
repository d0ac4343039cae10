//! Top-level error taxonomy (spec.md §7).
//!
//! Every pipeline stage has its own `thiserror` error enum; this wraps them
//! for callers (the CLI, library consumers) that want one `Result` type to
//! propagate with `?` across the whole pipeline. `anyhow` is reserved for
//! the CLI boundary itself (spec.md §4.12), not this library surface.

use thiserror::Error;

use crate::cfg::CfgError;
use crate::executor::ExecutorError;
use crate::parser::ParseError;
use crate::projector::ProjectionError;
use crate::registry::RegistryError;
use crate::simulator::SimulationError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Cfg(#[from] CfgError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("protocol `{0}` was rejected by verification (see the accompanying report)")]
    Rejected(String),

    #[error("internal invariant violated: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;
