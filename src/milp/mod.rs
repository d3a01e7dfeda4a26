//! Mixed-integer linear programming layer.
//!
//! A small backend-neutral model ([`MilpModel`]) plus the search driver
//! that layers lexicographic objectives and lazy constraints on top of a
//! plain single-objective MILP backend.
//!
//! # Architecture
//!
//! ```text
//! MilpModel ──► LexicographicSearch ──► MilpBackend (HiGHS)
//!                      ▲
//!                      └── LazyConstraintCallback (cuts per candidate)
//! ```

mod backend;
mod expr;
mod highs;
mod model;
mod search;

pub use backend::{BackendFailure, Candidate, MilpBackend, SolveRequest};
pub use expr::{LinearConstraint, LinearExpr, Sense, VarId};
pub use highs::HighsBackend;
pub use model::{LabelledConstraint, MilpModel, PrioritizedObjective, VarKind, VariableDef};
pub use search::{
    LazyConstraintCallback, LazyCut, LexicographicSearch, SearchResult, SearchStatistics,
    SearchStatus, FEASIBILITY_TOLERANCE,
};
