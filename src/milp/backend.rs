//! Solver backend seam.

use std::time::Duration;
use thiserror::Error;

use super::expr::{LinearConstraint, LinearExpr};
use super::model::MilpModel;

/// One backend run: the model's constraints plus `extra` rows,
/// minimising `objective`.
#[derive(Debug, Clone, Copy)]
pub struct SolveRequest<'a> {
    pub model: &'a MilpModel,
    pub objective: &'a LinearExpr,
    /// Pinned objectives and lazy cuts accumulated so far.
    pub extra: &'a [LinearConstraint],
    pub time_limit: Duration,
}

/// Values returned by a backend run.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// One value per model variable.
    pub values: Vec<f64>,
    /// `false` unless the backend closed the search (time or gap limit hit).
    pub proven_optimal: bool,
}

/// Why a backend run produced no candidate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendFailure {
    #[error("model is infeasible")]
    Infeasible,
    #[error("model is unbounded")]
    Unbounded,
    #[error("backend stopped: {0}")]
    Interrupted(String),
}

/// A mixed-integer solver able to minimise one linear objective.
///
/// A run that stops on a time or gap limit returns its incumbent with
/// `proven_optimal = false`; the caller checks feasibility.
pub trait MilpBackend: Send + Sync {
    fn solve(&self, request: SolveRequest<'_>) -> Result<Candidate, BackendFailure>;
}
