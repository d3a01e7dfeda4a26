//! Lexicographic optimisation with lazily generated cuts.
//!
//! # Algorithm
//! Objectives are processed from highest to lowest priority. Each stage
//! minimises one objective subject to the model, every cut found so far,
//! and one pin per earlier stage (`objective ≤ best + tol`). Within a stage
//! the backend is re-run until the lazy-constraint callback accepts its
//! candidate; rejected candidates contribute their cuts to a shared pool
//! that later stages inherit.
//!
//! A stage that runs out of time ends the search with the best accepted
//! candidate so far, which satisfies every pin and every cut.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use super::backend::{BackendFailure, MilpBackend, SolveRequest};
use super::expr::{LinearConstraint, LinearExpr, VarId};
use super::model::MilpModel;

/// Tolerance for accepting backend values as feasible.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-5;

/// Relative slack added to a pinned objective value.
const PIN_TOLERANCE: f64 = 1e-6;

/// A cut `Σ vars ≤ max_active` over binary variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LazyCut {
    pub vars: Vec<VarId>,
    pub max_active: usize,
}

impl LazyCut {
    /// Forces one variable to zero.
    pub fn forbid(var: VarId) -> Self {
        Self {
            vars: vec![var],
            max_active: 0,
        }
    }

    /// At most `max_active` of `vars` may be one.
    pub fn at_most(vars: Vec<VarId>, max_active: usize) -> Self {
        Self { vars, max_active }
    }

    fn key(&self) -> (Vec<VarId>, usize) {
        let mut vars = self.vars.clone();
        vars.sort_unstable();
        vars.dedup();
        (vars, self.max_active)
    }

    /// The cut as a linear constraint.
    pub fn to_constraint(&self) -> LinearConstraint {
        LinearExpr::sum(self.vars.iter().copied()).leq(self.max_active as f64)
    }
}

/// Inspects integer-feasible candidates and returns cuts that remove the
/// infeasible ones.
///
/// Receives a read-only snapshot of the candidate's variable values; may be
/// called from any thread.
pub trait LazyConstraintCallback: Send + Sync {
    /// Cuts violated by `values`; empty if the candidate is acceptable.
    fn on_candidate(&self, values: &[f64]) -> Vec<LazyCut>;
}

impl<F> LazyConstraintCallback for F
where
    F: Fn(&[f64]) -> Vec<LazyCut> + Send + Sync,
{
    fn on_candidate(&self, values: &[f64]) -> Vec<LazyCut> {
        self(values)
    }
}

/// Cuts injected so far, without duplicates.
#[derive(Debug, Default)]
struct CutPool {
    seen: HashSet<(Vec<VarId>, usize)>,
    rows: Vec<LinearConstraint>,
}

impl CutPool {
    /// Returns `false` if an equivalent cut is already present.
    fn insert(&mut self, cut: &LazyCut) -> bool {
        if !self.seen.insert(cut.key()) {
            return false;
        }
        self.rows.push(cut.to_constraint());
        true
    }

    fn len(&self) -> usize {
        self.rows.len()
    }
}

/// How a search ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchStatus {
    /// Every stage solved to proven optimality.
    Optimal,
    /// A feasible incumbent exists but not every stage was proven optimal.
    TimeLimit,
    /// The first stage has no feasible point.
    Infeasible,
    /// No acceptable candidate was found.
    Interrupted(String),
}

/// Counters collected during a search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchStatistics {
    pub backend_calls: usize,
    pub lazy_cuts: usize,
    pub stages_completed: usize,
}

/// Outcome of [`LexicographicSearch::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    pub status: SearchStatus,
    /// Accepted incumbent, if any.
    pub values: Option<Vec<f64>>,
    /// Achieved value per completed stage, in priority order.
    pub objective_values: Vec<(&'static str, f64)>,
    pub statistics: SearchStatistics,
}

enum StageOutcome {
    Solved { values: Vec<f64>, proven_optimal: bool },
    Infeasible,
    OutOfTime,
    Failed(String),
}

/// Sequential lexicographic optimisation over a [`MilpModel`].
pub struct LexicographicSearch<'a, B, C> {
    model: &'a MilpModel,
    backend: &'a B,
    callback: &'a C,
    time_budget: Duration,
}

impl<'a, B: MilpBackend, C: LazyConstraintCallback> LexicographicSearch<'a, B, C> {
    pub fn new(
        model: &'a MilpModel,
        backend: &'a B,
        callback: &'a C,
        time_budget: Duration,
    ) -> Self {
        Self {
            model,
            backend,
            callback,
            time_budget,
        }
    }

    /// Runs every stage within the time budget.
    pub fn run(&self) -> SearchResult {
        let deadline = Instant::now() + self.time_budget;
        let zero = LinearExpr::new();
        let objectives = self.model.objectives_by_priority();
        let stages: Vec<(&'static str, &LinearExpr)> = if objectives.is_empty() {
            vec![("feasibility", &zero)]
        } else {
            objectives.iter().map(|o| (o.name, &o.expression)).collect()
        };

        let mut pins: Vec<LinearConstraint> = Vec::new();
        let mut pool = CutPool::default();
        let mut statistics = SearchStatistics::default();
        let mut incumbent: Option<Vec<f64>> = None;
        let mut objective_values = Vec::new();
        let mut proven = true;
        let mut failure = None;

        for (index, &(name, objective)) in stages.iter().enumerate() {
            let outcome = self.solve_stage(objective, &pins, &mut pool, deadline, &mut statistics);
            match outcome {
                StageOutcome::Solved {
                    values,
                    proven_optimal,
                } => {
                    let best = objective.evaluate(&values);
                    debug!(
                        "Stage {} ({}): {:.4}{}",
                        index,
                        name,
                        best,
                        if proven_optimal { "" } else { " (time limit)" }
                    );
                    objective_values.push((name, best));
                    incumbent = Some(values);
                    statistics.stages_completed += 1;
                    if !proven_optimal {
                        proven = false;
                        break;
                    }
                    let pin = objective.clone().leq(best + PIN_TOLERANCE * best.abs().max(1.0));
                    pins.push(pin);
                }
                StageOutcome::Infeasible if index == 0 => {
                    return SearchResult {
                        status: SearchStatus::Infeasible,
                        values: None,
                        objective_values,
                        statistics,
                    };
                }
                StageOutcome::Infeasible => {
                    warn!(
                        "Stage {index} ({name}) became infeasible under pinned objectives; \
                         keeping previous incumbent"
                    );
                    proven = false;
                    break;
                }
                StageOutcome::OutOfTime => {
                    debug!("Stage {index} ({name}) ran out of time");
                    proven = false;
                    failure = Some(
                        "time budget exhausted before a feasible candidate was accepted"
                            .to_string(),
                    );
                    break;
                }
                StageOutcome::Failed(reason) => {
                    warn!("Stage {index} ({name}) failed: {reason}");
                    proven = false;
                    failure = Some(reason);
                    break;
                }
            }
        }

        let status = match (&incumbent, proven) {
            (Some(_), true) => SearchStatus::Optimal,
            (Some(_), false) => SearchStatus::TimeLimit,
            (None, _) => SearchStatus::Interrupted(
                failure.unwrap_or_else(|| "no candidate was produced".to_string()),
            ),
        };
        SearchResult {
            status,
            values: incumbent,
            objective_values,
            statistics,
        }
    }

    fn solve_stage(
        &self,
        objective: &LinearExpr,
        pins: &[LinearConstraint],
        pool: &mut CutPool,
        deadline: Instant,
        statistics: &mut SearchStatistics,
    ) -> StageOutcome {
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return StageOutcome::OutOfTime;
            }

            let extra: Vec<LinearConstraint> =
                pins.iter().chain(pool.rows.iter()).cloned().collect();
            statistics.backend_calls += 1;
            let candidate = match self.backend.solve(SolveRequest {
                model: self.model,
                objective,
                extra: &extra,
                time_limit: remaining,
            }) {
                Ok(candidate) => candidate,
                Err(BackendFailure::Infeasible) => return StageOutcome::Infeasible,
                Err(other) => return StageOutcome::Failed(other.to_string()),
            };

            let breach = self
                .model
                .first_violation(&candidate.values, FEASIBILITY_TOLERANCE)
                .or_else(|| {
                    extra
                        .iter()
                        .find(|c| !c.is_satisfied(&candidate.values, FEASIBILITY_TOLERANCE))
                        .map(|_| "pinned objective or cut violated".to_string())
                });
            if let Some(breach) = breach {
                return if candidate.proven_optimal {
                    StageOutcome::Failed(format!("backend returned an infeasible point: {breach}"))
                } else {
                    StageOutcome::OutOfTime
                };
            }

            let cuts = self.callback.on_candidate(&candidate.values);
            if cuts.is_empty() {
                return StageOutcome::Solved {
                    values: candidate.values,
                    proven_optimal: candidate.proven_optimal,
                };
            }

            let before = pool.len();
            for cut in &cuts {
                if pool.insert(cut) {
                    trace!("Lazy cut: sum of {:?} <= {}", cut.vars, cut.max_active);
                }
            }
            let added = pool.len() - before;
            statistics.lazy_cuts += added;
            if added == 0 {
                return StageOutcome::Failed(
                    "lazy constraint callback rejected a candidate without new cuts".to_string(),
                );
            }
        }
    }
}
