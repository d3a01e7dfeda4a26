//! Allocation model formulation.
//!
//! Translates the rostering domain into a [`MilpModel`]: one binary
//! decision `x[s,t]` per (staff, stream) pair, the static hard-rule
//! families, the five prioritised objectives, and the lazy contiguity
//! detector that enforces working-block caps during search.
//!
//! # Constraint Families
//!
//! | Label | Rule |
//! |-------|------|
//! | `headcount` | `Σ_s x[s,t] ≤ number_of_tutors(t)` |
//! | `collision` | `x[s,a] + x[s,b] ≤ 1` for clashing `a ≠ b` |
//! | `availability` | `x[s,t] ≤ 0` where `s` cannot cover `t` |
//! | `seniority` | `(n_t − 1)·Σ_senior x ≥ Σ_new x` on root streams |
//! | `weekly_hours` | `Σ_{t in w} x·duration ≤ max_weekly_hours(s)` |
//! | `preference_ratio` | preferred hours `≥ θ ×` assigned hours (ratio mode) |
//!
//! Contiguous-hours caps are not in the static model; see [`contiguity`].

mod clash;
mod constraints;
pub mod contiguity;
mod extract;
mod objectives;
mod variables;

pub use clash::ClashIndex;
pub use constraints::ConstraintBuilder;
pub use contiguity::{find_violating_runs, ContiguityDetector};
pub use extract::extract_allocation;
pub use objectives::{ObjectiveBuilder, ObjectiveKind};
pub use variables::AllocationVariables;

use std::collections::BTreeMap;

use log::info;

use crate::config::AllocatorConfig;
use crate::error::ConfigurationError;
use crate::milp::MilpModel;
use crate::models::{IsoDay, SessionStream, Staff, Week, WeekId};

/// Read-only view of one problem instance with precomputed lookups.
#[derive(Debug)]
pub struct Timetable<'a> {
    pub staff: &'a [Staff],
    pub streams: &'a [SessionStream],
    pub weeks: &'a [Week],
    clashes: ClashIndex,
    availability: Vec<bool>,
    week_streams: BTreeMap<WeekId, Vec<usize>>,
    day_week_streams: BTreeMap<(IsoDay, WeekId), Vec<usize>>,
}

impl<'a> Timetable<'a> {
    /// Indexes the instance.
    ///
    /// # Errors
    /// [`ConfigurationError::NoStaff`] if `staff` is empty.
    pub fn new(
        staff: &'a [Staff],
        streams: &'a [SessionStream],
        weeks: &'a [Week],
    ) -> Result<Self, ConfigurationError> {
        if staff.is_empty() {
            return Err(ConfigurationError::NoStaff);
        }

        let availability = staff
            .iter()
            .flat_map(|s| streams.iter().map(move |t| s.is_available(t)))
            .collect();

        let mut week_streams: BTreeMap<WeekId, Vec<usize>> = BTreeMap::new();
        let mut day_week_streams: BTreeMap<(IsoDay, WeekId), Vec<usize>> = BTreeMap::new();
        for (t, stream) in streams.iter().enumerate() {
            for &week in &stream.weeks {
                week_streams.entry(week).or_default().push(t);
                day_week_streams.entry((stream.day, week)).or_default().push(t);
            }
        }

        Ok(Self {
            staff,
            streams,
            weeks,
            clashes: ClashIndex::new(streams),
            availability,
            week_streams,
            day_week_streams,
        })
    }

    pub fn staff_count(&self) -> usize {
        self.staff.len()
    }

    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }

    /// Whether staff `s` can cover stream `t`.
    #[inline]
    pub fn is_available(&self, s: usize, t: usize) -> bool {
        self.availability[s * self.streams.len() + t]
    }

    pub fn clashes(&self) -> &ClashIndex {
        &self.clashes
    }

    /// Streams running in each week that hosts any.
    pub fn week_streams(&self) -> impl Iterator<Item = (WeekId, &[usize])> {
        self.week_streams.iter().map(|(w, ts)| (*w, ts.as_slice()))
    }

    /// Streams per `(day, week)` slot that hosts any.
    pub fn day_week_streams(&self) -> impl Iterator<Item = ((IsoDay, WeekId), &[usize])> {
        self.day_week_streams.iter().map(|(k, ts)| (*k, ts.as_slice()))
    }

    /// Seniority weight of staff `s` in workload balancing.
    pub fn balance_weight(&self, s: usize, new_staff_weight: f64) -> f64 {
        if self.staff[s].new {
            new_staff_weight
        } else {
            1.0
        }
    }

    /// Population mean of required hours: `Σ_t n_t × total_hours(t) / |staff|`.
    pub fn mean_hours(&self) -> Result<f64, ConfigurationError> {
        if self.staff.is_empty() {
            return Err(ConfigurationError::NoStaff);
        }
        let required: f64 = self
            .streams
            .iter()
            .map(|t| f64::from(t.number_of_tutors) * t.total_hours())
            .sum();
        Ok(required / self.staff.len() as f64)
    }
}

/// A built model together with its variable table.
#[derive(Debug)]
pub struct Formulation {
    pub model: MilpModel,
    pub variables: AllocationVariables,
}

impl Formulation {
    /// Builds variables, hard constraints, and objectives.
    pub fn build(
        timetable: &Timetable<'_>,
        config: &AllocatorConfig,
    ) -> Result<Self, ConfigurationError> {
        let mut model = MilpModel::new();
        let variables = AllocationVariables::new(&mut model, timetable);

        ConstraintBuilder::new(timetable, &variables)
            .with_preference(&config.preference)
            .build(&mut model);
        ObjectiveBuilder::new(timetable, &variables)
            .with_new_staff_weight(config.new_staff_weight)
            .with_preference(&config.preference)
            .build(&mut model)?;

        info!(
            "Formulated allocation model: {} staff, {} streams, {} variables, {} constraints, \
                 {} objectives",
            timetable.staff_count(),
            timetable.stream_count(),
            model.num_variables(),
            model.constraints().len(),
            model.objectives_by_priority().len()
        );
        Ok(Self { model, variables })
    }
}
