//! Lexicographic objectives and their linking constraints.

use super::{AllocationVariables, Timetable};
use crate::config::PreferenceMode;
use crate::error::ConfigurationError;
use crate::milp::{LinearExpr, MilpModel};

pub const UNFILLED_LINK: &str = "unfilled_link";
pub const WORKDAY_LINK: &str = "workday_link";
pub const DEVIATION_LINK: &str = "deviation_link";
pub const SPREAD_LINK: &str = "spread_link";

/// The five allocation objectives, all minimised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ObjectiveKind {
    /// Streams with no staff at all.
    UnfilledSessions,
    /// `Σ_t (n_t − filled_t) × total_hours(t)`.
    UnfilledHours,
    /// Hours worked on a type other than the staff member's preference.
    PreferenceViolation,
    /// `Σ_s |weighted_hours(s) − mean|`.
    WorkloadSpread,
    /// Distinct (staff, day, week) triples with any assignment.
    WorkDays,
}

impl ObjectiveKind {
    /// All objectives, highest priority first.
    pub const ALL: [ObjectiveKind; 5] = [
        ObjectiveKind::UnfilledSessions,
        ObjectiveKind::UnfilledHours,
        ObjectiveKind::PreferenceViolation,
        ObjectiveKind::WorkloadSpread,
        ObjectiveKind::WorkDays,
    ];

    /// Lexicographic priority (higher first).
    pub fn priority(self) -> u32 {
        match self {
            Self::UnfilledSessions => 5,
            Self::UnfilledHours => 4,
            Self::PreferenceViolation => 3,
            Self::WorkloadSpread => 2,
            Self::WorkDays => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::UnfilledSessions => "unfilled_sessions",
            Self::UnfilledHours => "unfilled_hours",
            Self::PreferenceViolation => "preference_violation",
            Self::WorkloadSpread => "workload_spread",
            Self::WorkDays => "work_days",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Emits the prioritised objectives and the rows linking their auxiliary
/// variables to the assignment decisions.
pub struct ObjectiveBuilder<'a> {
    timetable: &'a Timetable<'a>,
    vars: &'a AllocationVariables,
    new_staff_weight: f64,
    preference_objective: bool,
}

impl<'a> ObjectiveBuilder<'a> {
    pub fn new(timetable: &'a Timetable<'a>, vars: &'a AllocationVariables) -> Self {
        Self {
            timetable,
            vars,
            new_staff_weight: 1.0,
            preference_objective: true,
        }
    }

    /// Divisor applied to hours of new staff in the balance term.
    pub fn with_new_staff_weight(mut self, weight: f64) -> Self {
        self.new_staff_weight = weight;
        self
    }

    /// The preference objective is only emitted in objective mode.
    pub fn with_preference(mut self, mode: &PreferenceMode) -> Self {
        self.preference_objective = matches!(mode, PreferenceMode::Objective);
        self
    }

    /// Adds the objectives and their link rows to `model`.
    ///
    /// # Errors
    /// [`ConfigurationError::NoStaff`] if the mean workload is undefined.
    pub fn build(&self, model: &mut MilpModel) -> Result<(), ConfigurationError> {
        let unfilled = self.unfilled_sessions(model);
        add(model, ObjectiveKind::UnfilledSessions, unfilled);

        let hours = self.unfilled_hours();
        add(model, ObjectiveKind::UnfilledHours, hours);

        if self.preference_objective {
            let violation = self.preference_violation();
            add(model, ObjectiveKind::PreferenceViolation, violation);
        }

        let spread = self.workload_spread(model)?;
        add(model, ObjectiveKind::WorkloadSpread, spread);

        let days = self.work_days(model);
        add(model, ObjectiveKind::WorkDays, days);
        Ok(())
    }

    fn assigned(&self, t: usize) -> LinearExpr {
        LinearExpr::sum((0..self.timetable.staff_count()).map(|s| self.vars.assignment(s, t)))
    }

    /// `Σ unfilled[t]` with `unfilled[t] + Σ_s x[s,t] ≥ 1`.
    fn unfilled_sessions(&self, model: &mut MilpModel) -> LinearExpr {
        let mut objective = LinearExpr::new();
        for t in 0..self.timetable.stream_count() {
            let Some(unfilled) = self.vars.unfilled(t) else {
                continue;
            };
            let link = self.assigned(t).with_term(unfilled, 1.0);
            model.add_constraint(UNFILLED_LINK, link.geq(1.0));
            objective.add_term(unfilled, 1.0);
        }
        objective
    }

    fn unfilled_hours(&self) -> LinearExpr {
        let mut objective = LinearExpr::new();
        for (t, stream) in self.timetable.streams.iter().enumerate() {
            let hours = stream.total_hours();
            objective.add_constant(f64::from(stream.number_of_tutors) * hours);
            objective.add_scaled(&self.assigned(t), -hours);
        }
        objective
    }

    fn preference_violation(&self) -> LinearExpr {
        let tt = self.timetable;
        let mut objective = LinearExpr::new();
        for (s, person) in tt.staff.iter().enumerate() {
            let Some(preferred) = person.type_preference else {
                continue;
            };
            for (t, stream) in tt.streams.iter().enumerate() {
                if stream.session_type != preferred && tt.is_available(s, t) {
                    objective.add_term(self.vars.assignment(s, t), stream.total_hours());
                }
            }
        }
        objective
    }

    /// `Σ spread[s]` with
    /// `Σ_t x[s,t]·H_t / w_s − deviation[s] = mean` and `spread[s] ≥ ±deviation[s]`.
    fn workload_spread(&self, model: &mut MilpModel) -> Result<LinearExpr, ConfigurationError> {
        let tt = self.timetable;
        let mean = tt.mean_hours()?;
        let mut objective = LinearExpr::new();
        for s in 0..tt.staff_count() {
            let weight = tt.balance_weight(s, self.new_staff_weight);
            let deviation = self.vars.deviation(s);
            let spread = self.vars.spread(s);

            let mut balance = LinearExpr::new();
            for (t, stream) in tt.streams.iter().enumerate() {
                if tt.is_available(s, t) {
                    balance.add_term(self.vars.assignment(s, t), stream.total_hours() / weight);
                }
            }
            balance.add_term(deviation, -1.0);
            model.add_constraint(DEVIATION_LINK, balance.eq(mean));

            model.add_constraint(
                SPREAD_LINK,
                LinearExpr::new().with_term(spread, 1.0).with_term(deviation, -1.0).geq(0.0),
            );
            model.add_constraint(
                SPREAD_LINK,
                LinearExpr::new().with_term(spread, 1.0).with_term(deviation, 1.0).geq(0.0),
            );
            objective.add_term(spread, 1.0);
        }
        Ok(objective)
    }

    /// `Σ works[s,d,w]` with `works[s,d,w] ≥ x[s,t]` for every stream `t`
    /// on day `d` in week `w`.
    fn work_days(&self, model: &mut MilpModel) -> LinearExpr {
        let tt = self.timetable;
        let mut objective = LinearExpr::new();
        for ((day, week), hosted) in tt.day_week_streams() {
            for s in 0..tt.staff_count() {
                let Some(works) = self.vars.work_day(s, day, week) else {
                    continue;
                };
                for &t in hosted.iter().filter(|&&t| tt.is_available(s, t)) {
                    let link = LinearExpr::new()
                        .with_term(works, 1.0)
                        .with_term(self.vars.assignment(s, t), -1.0);
                    model.add_constraint(WORKDAY_LINK, link.geq(0.0));
                }
                objective.add_term(works, 1.0);
            }
        }
        objective
    }
}

fn add(model: &mut MilpModel, kind: ObjectiveKind, expression: LinearExpr) {
    model.add_objective(kind.name(), kind.priority(), expression);
}
