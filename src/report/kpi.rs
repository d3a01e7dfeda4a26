//! Allocation quality metrics (KPIs).
//!
//! Recomputes the allocation objectives from a finished [`Allocation`],
//! independently of the solver that produced it.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Unfilled sessions | Streams needing staff that have none |
//! | Unfilled hours | `Σ_t (n_t − filled_t) × total_hours(t)` |
//! | Preference violation | Hours on a type other than the staff member's preference |
//! | Workload spread | `Σ_s |hours(s) / w_s − mean|`, `w_s` the seniority weight |
//! | Work days | Distinct (staff, day, week) triples with any assignment |

use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::formulation::ObjectiveKind;
use crate::models::{Allocation, IsoDay, SessionStream, Staff, WeekId};

/// Allocation performance indicators.
///
/// All hour values are term totals (`duration × |weeks|`).
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationKpi {
    /// Streams needing staff that have at least one.
    pub filled_sessions: usize,
    /// Streams needing staff that have none.
    pub unfilled_sessions: usize,
    /// Required tutor-hours left uncovered.
    pub unfilled_hours: f64,
    /// Hours assigned against declared preferences.
    pub preference_violation_hours: f64,
    /// Sum of absolute deviations from the mean weighted workload.
    pub workload_spread: f64,
    /// Distinct (staff, day, week) triples worked.
    pub work_days: usize,
    /// Mean required hours per staff member.
    pub mean_hours: f64,
    /// Real (unweighted) hours per staff member.
    pub hours_by_staff: BTreeMap<String, f64>,
}

impl AllocationKpi {
    /// Computes KPIs from an allocation and its inputs.
    ///
    /// # Arguments
    /// * `allocation` - The finished allocation.
    /// * `staff` - The staff it was built for.
    /// * `streams` - The session streams it covers.
    /// * `new_staff_weight` - Seniority divisor used in workload balancing.
    pub fn calculate(
        allocation: &Allocation,
        staff: &[Staff],
        streams: &[SessionStream],
        new_staff_weight: f64,
    ) -> Self {
        let by_id: HashMap<&str, &SessionStream> =
            streams.iter().map(|t| (t.id.as_str(), t)).collect();

        let mut filled_sessions = 0;
        let mut unfilled_sessions = 0;
        let mut unfilled_hours = 0.0;
        let mut required_hours = 0.0;
        for stream in streams {
            let filled = allocation.filled_count(&stream.id);
            let needed = stream.number_of_tutors as usize;
            if needed > 0 {
                if filled == 0 {
                    unfilled_sessions += 1;
                } else {
                    filled_sessions += 1;
                }
            }
            unfilled_hours += (needed as f64 - filled as f64) * stream.total_hours();
            required_hours += needed as f64 * stream.total_hours();
        }

        let mean_hours = if staff.is_empty() {
            0.0
        } else {
            required_hours / staff.len() as f64
        };

        let mut hours_by_staff = BTreeMap::new();
        let mut preference_violation_hours = 0.0;
        let mut workload_spread = 0.0;
        let mut days: BTreeSet<(&str, IsoDay, WeekId)> = BTreeSet::new();
        for person in staff {
            let mut hours = 0.0;
            for stream in allocation
                .streams_for_staff(&person.id)
                .filter_map(|id| by_id.get(id).copied())
            {
                hours += stream.total_hours();
                if person
                    .type_preference
                    .is_some_and(|preferred| preferred != stream.session_type)
                {
                    preference_violation_hours += stream.total_hours();
                }
                for &week in &stream.weeks {
                    days.insert((person.id.as_str(), stream.day, week));
                }
            }
            let weight = if person.new { new_staff_weight } else { 1.0 };
            workload_spread += (hours / weight - mean_hours).abs();
            hours_by_staff.insert(person.id.clone(), hours);
        }

        Self {
            filled_sessions,
            unfilled_sessions,
            unfilled_hours,
            preference_violation_hours,
            workload_spread,
            work_days: days.len(),
            mean_hours,
            hours_by_staff,
        }
    }

    /// Value of one objective.
    pub fn objective_value(&self, kind: ObjectiveKind) -> f64 {
        match kind {
            ObjectiveKind::UnfilledSessions => self.unfilled_sessions as f64,
            ObjectiveKind::UnfilledHours => self.unfilled_hours,
            ObjectiveKind::PreferenceViolation => self.preference_violation_hours,
            ObjectiveKind::WorkloadSpread => self.workload_spread,
            ObjectiveKind::WorkDays => self.work_days as f64,
        }
    }

    /// All objective values, highest priority first.
    pub fn objective_values(&self) -> Vec<(&'static str, f64)> {
        ObjectiveKind::ALL
            .iter()
            .map(|&kind| (kind.name(), self.objective_value(kind)))
            .collect()
    }

    /// Whether every stream needing staff has at least one.
    pub fn is_fully_staffed(&self) -> bool {
        self.unfilled_sessions == 0
    }
}
