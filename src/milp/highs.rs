//! HiGHS backend through `good_lp`.

use good_lp::{
    default_solver, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolutionStatus, SolverModel, Variable,
};
use log::trace;

use super::backend::{BackendFailure, Candidate, MilpBackend, SolveRequest};
use super::expr::{LinearConstraint, LinearExpr, Sense};
use super::model::VarKind;
use crate::config::AllocatorConfig;

/// Solves [`MilpModel`](super::MilpModel)s with HiGHS.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HighsBackend {
    threads: Option<u32>,
    mip_gap: f64,
}

impl HighsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend tuned by the allocator configuration.
    pub fn from_config(config: &AllocatorConfig) -> Self {
        Self {
            threads: config.threads,
            mip_gap: config.mip_gap,
        }
    }

    pub fn with_threads(mut self, threads: u32) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_mip_gap(mut self, gap: f64) -> Self {
        self.mip_gap = gap;
        self
    }
}

/// Only a closed search counts; gap and time limits leave the bound open.
fn is_proven_optimal(status: SolutionStatus) -> bool {
    matches!(status, SolutionStatus::Optimal)
}

fn to_expression(expr: &LinearExpr, vars: &[Variable]) -> Expression {
    let mut out = Expression::from(expr.constant_value());
    for &(var, coef) in expr.terms() {
        out += coef * vars[var.index()];
    }
    out
}

fn to_constraint(c: &LinearConstraint, vars: &[Variable]) -> good_lp::Constraint {
    let lhs = to_expression(&c.expr, vars);
    match c.sense {
        Sense::LessEq => lhs.leq(c.rhs),
        Sense::GreaterEq => lhs.geq(c.rhs),
        Sense::Equal => lhs.eq(c.rhs),
    }
}

impl MilpBackend for HighsBackend {
    fn solve(&self, request: SolveRequest<'_>) -> Result<Candidate, BackendFailure> {
        let model = request.model;
        let mut problem = ProblemVariables::new();
        let vars: Vec<Variable> = model
            .variables()
            .iter()
            .map(|def| {
                let definition = match def.kind {
                    VarKind::Binary => variable().binary(),
                    VarKind::Continuous { lower, upper } => {
                        let mut v = variable();
                        if lower.is_finite() {
                            v = v.min(lower);
                        }
                        if upper.is_finite() {
                            v = v.max(upper);
                        }
                        v
                    }
                };
                problem.add(definition.name(def.name.clone()))
            })
            .collect();

        let objective = to_expression(request.objective, &vars);
        let limit = request.time_limit.as_secs_f64().max(0.001);
        let mut solver = problem
            .minimise(objective)
            .using(default_solver)
            .set_option("output_flag", false)
            .set_option("time_limit", limit)
            .set_option("mip_rel_gap", self.mip_gap);
        if let Some(threads) = self.threads {
            solver = solver.set_option("threads", i32::try_from(threads).unwrap_or(i32::MAX));
        }

        for c in model.constraints() {
            solver.add_constraint(to_constraint(&c.constraint, &vars));
        }
        for c in request.extra {
            solver.add_constraint(to_constraint(c, &vars));
        }

        trace!(
            "HiGHS run: {} variables, {} + {} rows, limit {:.1}s",
            vars.len(),
            model.constraints().len(),
            request.extra.len(),
            limit
        );
        let solution = solver.solve().map_err(|e| match e {
            ResolutionError::Infeasible => BackendFailure::Infeasible,
            ResolutionError::Unbounded => BackendFailure::Unbounded,
            other => BackendFailure::Interrupted(other.to_string()),
        })?;
        let status = solution.status();
        trace!("HiGHS status: {status:?}");

        Ok(Candidate {
            values: vars.iter().map(|&v| solution.value(v)).collect(),
            proven_optimal: is_proven_optimal(status),
        })
    }
}
