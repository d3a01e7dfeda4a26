//! Errors that abort a solve before any model is built.

use thiserror::Error;

use crate::models::SessionType;
use crate::validation::ValidationError;

/// A problem with the input or configuration that makes a solve meaningless.
///
/// Solver outcomes (infeasible, time limit, interrupted) are not errors;
/// see [`SolveOutcome`](crate::SolveOutcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Workload balancing divides by the number of staff.
    #[error("at least one staff member is required")]
    NoStaff,

    /// Structural problems in the input data.
    #[error("invalid input: {}", summarize(.0))]
    InvalidInput(Vec<ValidationError>),

    /// A preference ratio that cannot be satisfied or means nothing.
    #[error(
        "preference threshold {threshold} for {session_type:?} must lie in [{minimum}, 1]"
    )]
    PreferenceThreshold {
        session_type: SessionType,
        threshold: f64,
        minimum: f64,
    },

    /// Seniority weighting outside `(0, 1]`.
    #[error("new staff weight must lie in (0, 1], got {0}")]
    SeniorityWeight(f64),
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
