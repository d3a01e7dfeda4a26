//! Allocation entry points.
//!
//! [`Allocator`] validates the input, builds the model, runs the
//! lexicographic search with the contiguity detector attached, and turns
//! the search result into a [`SolveOutcome`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

use log::{info, warn};

use crate::config::AllocatorConfig;
use crate::error::ConfigurationError;
use crate::formulation::{extract_allocation, ContiguityDetector, Formulation, Timetable};
use crate::milp::{HighsBackend, LexicographicSearch, MilpBackend, SearchStatus};
use crate::models::{Allocation, SessionStream, Staff, Week};
use crate::report::audit_allocation;
use crate::validation::validate_input;

/// Result of one solve.
#[derive(Debug, Clone, PartialEq)]
pub enum SolveOutcome {
    /// Every objective stage was solved to optimality.
    Optimal(Allocation),
    /// Feasible allocation found before the time budget ran out.
    TimeLimit(Allocation),
    /// The hard rules admit no allocation.
    Infeasible,
    /// Stopped before any acceptable allocation was found.
    Interrupted,
}

impl SolveOutcome {
    /// The allocation, for the two feasible outcomes.
    pub fn allocation(&self) -> Option<&Allocation> {
        match self {
            Self::Optimal(a) | Self::TimeLimit(a) => Some(a),
            Self::Infeasible | Self::Interrupted => None,
        }
    }

    /// Consumes the outcome, returning the allocation if there is one.
    pub fn into_allocation(self) -> Option<Allocation> {
        match self {
            Self::Optimal(a) | Self::TimeLimit(a) => Some(a),
            Self::Infeasible | Self::Interrupted => None,
        }
    }

    pub fn is_proven_optimal(&self) -> bool {
        matches!(self, Self::Optimal(_))
    }
}

impl fmt::Display for SolveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal(_) => write!(f, "optimal"),
            Self::TimeLimit(_) => write!(f, "time limit"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Counters and achieved objective values of one solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SolveStatistics {
    pub backend_calls: usize,
    pub lazy_cuts: usize,
    pub stages_completed: usize,
    /// Achieved value per completed objective, highest priority first.
    pub objective_values: Vec<(&'static str, f64)>,
    /// Why the search stopped early, if it did.
    pub stop_reason: Option<String>,
    pub elapsed: Duration,
}

/// Outcome plus statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRun {
    pub outcome: SolveOutcome,
    pub statistics: SolveStatistics,
}

/// Staff-to-stream allocator.
///
/// # Example
/// ```no_run
/// use u_roster::{Allocator, AllocatorConfig};
/// use u_roster::models::{IsoDay, SessionStream, SessionType, Staff, Timeslot, Week};
///
/// let weeks = Week::term(2);
/// let streams = vec![
///     SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
///         .with_weeks([1, 2]),
/// ];
/// let staff = vec![Staff::new("alex").available_weekdays(8.0, 18.0)];
///
/// let run = Allocator::new(AllocatorConfig::default().with_time_budget_secs(60))
///     .allocate(&staff, &streams, &weeks)
///     .unwrap();
/// assert!(run.outcome.is_proven_optimal());
/// ```
#[derive(Debug, Clone)]
pub struct Allocator<B = HighsBackend> {
    config: AllocatorConfig,
    backend: B,
}

impl Allocator<HighsBackend> {
    /// Allocator using HiGHS tuned by `config`.
    pub fn new(config: AllocatorConfig) -> Self {
        let backend = HighsBackend::from_config(&config);
        Self { config, backend }
    }
}

impl Default for Allocator<HighsBackend> {
    fn default() -> Self {
        Self::new(AllocatorConfig::default())
    }
}

impl<B: MilpBackend> Allocator<B> {
    /// Allocator using a custom backend.
    pub fn with_backend(config: AllocatorConfig, backend: B) -> Self {
        Self { config, backend }
    }

    pub fn config(&self) -> &AllocatorConfig {
        &self.config
    }

    /// Allocates `staff` to `streams`.
    ///
    /// # Errors
    /// [`ConfigurationError`] for empty staff, invalid input, or invalid
    /// configuration. Solver statuses are reported in the outcome.
    pub fn allocate(
        &self,
        staff: &[Staff],
        streams: &[SessionStream],
        weeks: &[Week],
    ) -> Result<AllocationRun, ConfigurationError> {
        let started = Instant::now();
        if staff.is_empty() {
            return Err(ConfigurationError::NoStaff);
        }
        validate_input(staff, streams, weeks).map_err(ConfigurationError::InvalidInput)?;
        self.config.validate(streams)?;

        let timetable = Timetable::new(staff, streams, weeks)?;
        if streams.is_empty() {
            return Ok(AllocationRun {
                outcome: SolveOutcome::Optimal(Allocation::default()),
                statistics: SolveStatistics {
                    elapsed: started.elapsed(),
                    ..SolveStatistics::default()
                },
            });
        }

        let formulation = Formulation::build(&timetable, &self.config)?;
        let detector = ContiguityDetector::new(&timetable, &formulation.variables);
        let budget = self.config.time_budget().saturating_sub(started.elapsed());
        let result =
            LexicographicSearch::new(&formulation.model, &self.backend, &detector, budget).run();

        let mut statistics = SolveStatistics {
            backend_calls: result.statistics.backend_calls,
            lazy_cuts: result.statistics.lazy_cuts,
            stages_completed: result.statistics.stages_completed,
            objective_values: result.objective_values,
            stop_reason: None,
            elapsed: Duration::ZERO,
        };

        let allocation = result
            .values
            .as_deref()
            .map(|values| extract_allocation(&timetable, &formulation.variables, values));
        let outcome = match (result.status, allocation) {
            (SearchStatus::Optimal, Some(allocation)) => SolveOutcome::Optimal(allocation),
            (SearchStatus::TimeLimit, Some(allocation)) => {
                let violations =
                    audit_allocation(&allocation, staff, streams, &self.config.preference);
                if violations.is_empty() {
                    SolveOutcome::TimeLimit(allocation)
                } else {
                    warn!(
                        "Time-limited allocation breaks {} hard rule(s); discarding it",
                        violations.len()
                    );
                    statistics.stop_reason =
                        Some(format!("incumbent failed audit: {}", violations[0].message));
                    SolveOutcome::Interrupted
                }
            }
            (SearchStatus::Infeasible, _) => SolveOutcome::Infeasible,
            (SearchStatus::Interrupted(reason), _) => {
                warn!("Allocation interrupted: {reason}");
                statistics.stop_reason = Some(reason);
                SolveOutcome::Interrupted
            }
            (_, None) => SolveOutcome::Interrupted,
        };

        statistics.elapsed = started.elapsed();
        info!(
            "Allocation finished: {} after {:.2}s ({} backend calls, {} lazy cuts)",
            outcome,
            statistics.elapsed.as_secs_f64(),
            statistics.backend_calls,
            statistics.lazy_cuts
        );
        Ok(AllocationRun { outcome, statistics })
    }
}

/// Solves with default configuration and the given time budget.
///
/// # Errors
/// See [`Allocator::allocate`].
pub fn solve(
    staff: &[Staff],
    streams: &[SessionStream],
    weeks: &[Week],
    time_budget_seconds: u64,
) -> Result<SolveOutcome, ConfigurationError> {
    let config = AllocatorConfig::default().with_time_budget_secs(time_budget_seconds);
    Allocator::new(config)
        .allocate(staff, streams, weeks)
        .map(|run| run.outcome)
}

/// A complete allocation job as submitted by a timetabling service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRequest {
    #[serde(default)]
    pub timetable_id: String,
    pub weeks: Vec<Week>,
    pub session_streams: Vec<SessionStream>,
    pub staff: Vec<Staff>,
    /// Seniority weight; the configured default applies when absent.
    #[serde(default)]
    pub new_threshold: Option<f64>,
    /// Time budget in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

fn default_timeout() -> u64 {
    3600
}

impl AllocationRequest {
    /// `base` with this request's seniority weight and time budget applied.
    pub fn config(&self, base: &AllocatorConfig) -> AllocatorConfig {
        let mut config = base.clone().with_time_budget_secs(self.timeout);
        if let Some(weight) = self.new_threshold {
            config = config.with_new_staff_weight(weight);
        }
        config
    }

    /// Runs the request on HiGHS.
    pub fn allocate(&self, base: &AllocatorConfig) -> Result<AllocationRun, ConfigurationError> {
        Allocator::new(self.config(base)).allocate(&self.staff, &self.session_streams, &self.weeks)
    }
}


#[cfg(test)]
mod scenario_tests {
    use super::*;
    use crate::config::PreferenceMode;
    use crate::formulation::ObjectiveKind;
    use crate::models::{IsoDay, SessionType, Timeslot};
    use crate::report::AllocationKpi;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn allocator() -> Allocator {
        Allocator::new(AllocatorConfig::default().with_time_budget_secs(120).with_threads(1))
    }

    fn objective(run: &AllocationRun, kind: ObjectiveKind) -> f64 {
        run.statistics
            .objective_values
            .iter()
            .find(|(name, _)| *name == kind.name())
            .map(|(_, v)| *v)
            .unwrap()
    }

    #[test]
    fn test_single_stream_filled_by_one_of_two() {
        let weeks = Week::term(2);
        let streams = vec![
            SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
                .with_weeks([1, 2]),
        ];
        let staff = vec![
            Staff::new("alex").with_availability(IsoDay::Mon, 8.0, 10.0),
            Staff::new("sam").with_availability(IsoDay::Mon, 8.0, 10.0),
        ];

        let run = allocator().allocate(&staff, &streams, &weeks).unwrap();
        let allocation = match &run.outcome {
            SolveOutcome::Optimal(a) => a,
            other => panic!("expected optimal, got {other}"),
        };
        assert_eq!(allocation.filled_count("P01"), 1);
        assert!(objective(&run, ObjectiveKind::UnfilledHours).abs() < 1e-6);
        assert!(objective(&run, ObjectiveKind::UnfilledSessions).abs() < 1e-6);
        assert_eq!(run.statistics.stages_completed, 5);
    }

    #[test]
    fn test_partial_availability_leaves_stream_unfilled() {
        let weeks = Week::term(1);
        let streams = vec![
            SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
                .with_weeks([1]),
        ];
        let staff = vec![Staff::new("alex").with_availability(IsoDay::Mon, 8.0, 9.0)];

        let run = allocator().allocate(&staff, &streams, &weeks).unwrap();
        let allocation = match &run.outcome {
            SolveOutcome::Optimal(a) => a,
            other => panic!("expected optimal, got {other}"),
        };
        assert_eq!(allocation.filled_count("P01"), 0);
        assert!((objective(&run, ObjectiveKind::UnfilledHours) - 2.0).abs() < 1e-6);
        assert!((objective(&run, ObjectiveKind::UnfilledSessions) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_contiguous_cap_splits_adjacent_streams() {
        let weeks = Week::term(1);
        let streams = vec![
            SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
                .with_weeks([1]),
            SessionStream::new(
                "P02",
                SessionType::Practical,
                IsoDay::Mon,
                Timeslot::new(10.0, 12.0),
            )
            .with_weeks([1]),
        ];
        let staff = vec![Staff::new("alex")
            .with_max_contiguous_hours(3.0)
            .with_availability(IsoDay::Mon, 8.0, 12.0)];

        let run = allocator().allocate(&staff, &streams, &weeks).unwrap();
        let allocation = run.outcome.allocation().unwrap();
        assert!(!(allocation.is_assigned("P01", "alex") && allocation.is_assigned("P02", "alex")));
        assert_eq!(allocation.assignment_count(), 1);
        assert!(run.statistics.lazy_cuts >= 1);
        assert!(
            audit_allocation(allocation, &staff, &streams, &PreferenceMode::Objective).is_empty()
        );
    }

    #[test]
    fn test_preference_ratio_mode_end_to_end() {
        let weeks = Week::term(1);
        let streams = vec![
            SessionStream::new("T01", SessionType::Tutorial, IsoDay::Mon, Timeslot::new(8.0, 9.0))
                .with_weeks([1]),
            SessionStream::new("P01", SessionType::Practical, IsoDay::Tue, Timeslot::new(8.0, 10.0))
                .with_weeks([1]),
        ];
        let staff = vec![Staff::new("alex")
            .with_preference(SessionType::Tutorial)
            .available_weekdays(8.0, 18.0)];
        let config = AllocatorConfig::default()
            .with_time_budget_secs(120)
            .with_preference(PreferenceMode::ratio(0.5));

        let run = Allocator::new(config.clone()).allocate(&staff, &streams, &weeks).unwrap();
        let allocation = run.outcome.allocation().unwrap();
        // Both would put 1h of 3h on tutorials.
        assert_eq!(allocation.assignment_count(), 1);
        assert!(audit_allocation(allocation, &staff, &streams, &config.preference).is_empty());
        assert_eq!(run.statistics.objective_values.len(), 4);
    }

    #[test]
    fn test_zero_budget_is_interrupted() {
        let weeks = Week::term(1);
        let streams = vec![
            SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
                .with_weeks([1]),
        ];
        let staff = vec![Staff::new("alex").available_weekdays(8.0, 18.0)];
        assert_eq!(solve(&staff, &streams, &weeks, 0), Ok(SolveOutcome::Interrupted));
    }

    fn random_instance(seed: u64) -> (Vec<Staff>, Vec<SessionStream>, Vec<Week>) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let weeks = Week::term(2);
        let types = [SessionType::Practical, SessionType::Tutorial, SessionType::Workshop];
        let days = [IsoDay::Mon, IsoDay::Tue];

        let streams = (0..8)
            .map(|i| {
                let start = f64::from(rng.random_range(8u32..14));
                let length = f64::from(rng.random_range(1u32..=2));
                let weeks: Vec<u32> = match rng.random_range(0..3) {
                    0 => vec![1],
                    1 => vec![2],
                    _ => vec![1, 2],
                };
                let mut stream = SessionStream::new(
                    format!("S{i:02}"),
                    types[rng.random_range(0..types.len())],
                    days[rng.random_range(0..days.len())],
                    Timeslot::new(start, start + length),
                )
                .with_tutors(rng.random_range(0..=2))
                .with_weeks(weeks);
                if rng.random_bool(0.2) {
                    stream = stream.derived();
                }
                stream
            })
            .collect();

        let staff = (0..4)
            .map(|i| {
                let mut person = Staff::new(format!("u{i}"))
                    .with_max_contiguous_hours([2.0, 3.0, 4.0, 24.0][rng.random_range(0..4)])
                    .with_max_weekly_hours([3.0, 6.0, 100.0][rng.random_range(0..3)]);
                if rng.random_bool(0.3) {
                    person = person.as_new();
                }
                if rng.random_bool(0.5) {
                    person = person.with_preference(types[rng.random_range(0..types.len())]);
                }
                for day in days {
                    if rng.random_bool(0.8) {
                        let open = f64::from(rng.random_range(8u32..11));
                        let close = f64::from(rng.random_range(13u32..=16));
                        person = person.with_availability(day, open, close);
                    }
                }
                person
            })
            .collect();

        (staff, streams, weeks)
    }

    #[test]
    fn test_random_instances_pass_audit() {
        for seed in 0..6 {
            let (staff, streams, weeks) = random_instance(seed);
            let run = allocator().allocate(&staff, &streams, &weeks).unwrap();
            let allocation = run
                .outcome
                .allocation()
                .unwrap_or_else(|| panic!("seed {seed}: no allocation ({})", run.outcome));
            let violations =
                audit_allocation(allocation, &staff, &streams, &PreferenceMode::Objective);
            assert!(violations.is_empty(), "seed {seed}: {violations:?}");
        }
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let (staff, streams, weeks) = random_instance(42);
        let first = allocator().allocate(&staff, &streams, &weeks).unwrap();
        let second = allocator().allocate(&staff, &streams, &weeks).unwrap();
        let (a, b) = (first.outcome.allocation().unwrap(), second.outcome.allocation().unwrap());

        for stream in &streams {
            assert_eq!(a.filled_count(&stream.id), b.filled_count(&stream.id));
        }
        let kpi_a = AllocationKpi::calculate(a, &staff, &streams, 1.0);
        let kpi_b = AllocationKpi::calculate(b, &staff, &streams, 1.0);
        for ((name, x), (_, y)) in kpi_a.objective_values().iter().zip(kpi_b.objective_values()) {
            assert!((x - y).abs() < 1e-6, "{name}: {x} vs {y}");
        }
        for (name, value) in &first.statistics.objective_values {
            let kind = ObjectiveKind::from_name(name).unwrap();
            assert!((kpi_a.objective_value(kind) - value).abs() < 1e-4, "{name}");
        }
    }
}
