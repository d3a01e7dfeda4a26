//! Static hard-constraint families.

use super::{AllocationVariables, Timetable};
use crate::config::PreferenceMode;
use crate::milp::{LinearExpr, MilpModel};

pub const HEADCOUNT: &str = "headcount";
pub const COLLISION: &str = "collision";
pub const AVAILABILITY: &str = "availability";
pub const SENIORITY: &str = "seniority";
pub const WEEKLY_HOURS: &str = "weekly_hours";
pub const PREFERENCE_RATIO: &str = "preference_ratio";

/// Emits the hard rules of the allocation model.
///
/// Working-block caps are enforced lazily by
/// [`ContiguityDetector`](super::ContiguityDetector) and are not emitted here.
pub struct ConstraintBuilder<'a> {
    timetable: &'a Timetable<'a>,
    vars: &'a AllocationVariables,
    preference: Option<&'a PreferenceMode>,
}

impl<'a> ConstraintBuilder<'a> {
    pub fn new(timetable: &'a Timetable<'a>, vars: &'a AllocationVariables) -> Self {
        Self {
            timetable,
            vars,
            preference: None,
        }
    }

    /// Enables the preference-ratio family when `mode` is
    /// [`PreferenceMode::Ratio`].
    pub fn with_preference(mut self, mode: &'a PreferenceMode) -> Self {
        self.preference = Some(mode);
        self
    }

    /// Adds every family to `model`.
    pub fn build(&self, model: &mut MilpModel) {
        self.add_headcount(model);
        self.add_collisions(model);
        self.add_availability(model);
        self.add_seniority(model);
        self.add_weekly_hours(model);
        if let Some(mode) = self.preference {
            if matches!(mode, PreferenceMode::Ratio { .. }) {
                self.add_preference_ratio(model, mode);
            }
        }
    }

    fn staff_range(&self) -> std::ops::Range<usize> {
        0..self.timetable.staff_count()
    }

    fn add_headcount(&self, model: &mut MilpModel) {
        for (t, stream) in self.timetable.streams.iter().enumerate() {
            let filled = LinearExpr::sum(self.staff_range().map(|s| self.vars.assignment(s, t)));
            model.add_constraint(HEADCOUNT, filled.leq(f64::from(stream.number_of_tutors)));
        }
    }

    /// One row per staff member and clashing pair. Pairs involving a
    /// stream the staff member cannot cover are already fixed at zero.
    fn add_collisions(&self, model: &mut MilpModel) {
        let tt = self.timetable;
        for (a, b) in tt.clashes().clashing_pairs() {
            for s in self.staff_range() {
                if !(tt.is_available(s, a) && tt.is_available(s, b)) {
                    continue;
                }
                let pair =
                    LinearExpr::sum([self.vars.assignment(s, a), self.vars.assignment(s, b)]);
                model.add_constraint(COLLISION, pair.leq(1.0));
            }
        }
    }

    fn add_availability(&self, model: &mut MilpModel) {
        let tt = self.timetable;
        for s in self.staff_range() {
            for t in 0..tt.stream_count() {
                if !tt.is_available(s, t) {
                    let x = LinearExpr::sum([self.vars.assignment(s, t)]);
                    model.add_constraint(AVAILABILITY, x.leq(0.0));
                }
            }
        }
    }

    /// `(n_t − 1)·Σ_{senior} x[s,t] − Σ_{new} x[s,t] ≥ 0` on root streams.
    ///
    /// With `n_t = 1` this keeps new staff off single-tutor root streams.
    fn add_seniority(&self, model: &mut MilpModel) {
        let tt = self.timetable;
        for (t, stream) in tt.streams.iter().enumerate() {
            if !stream.root || stream.number_of_tutors == 0 {
                continue;
            }
            let senior_factor = f64::from(stream.number_of_tutors - 1);
            let mut expr = LinearExpr::new();
            for (s, person) in tt.staff.iter().enumerate() {
                let coef = if person.new { -1.0 } else { senior_factor };
                expr.add_term(self.vars.assignment(s, t), coef);
            }
            model.add_constraint(SENIORITY, expr.geq(0.0));
        }
    }

    fn add_weekly_hours(&self, model: &mut MilpModel) {
        let tt = self.timetable;
        for (_, hosted) in tt.week_streams() {
            for (s, person) in tt.staff.iter().enumerate() {
                let mut hours = LinearExpr::new();
                for &t in hosted.iter().filter(|&&t| tt.is_available(s, t)) {
                    hours.add_term(self.vars.assignment(s, t), tt.streams[t].duration());
                }
                if !hours.is_constant() {
                    model.add_constraint(WEEKLY_HOURS, hours.leq(person.max_weekly_hours));
                }
            }
        }
    }

    /// `Σ_t (θ·H_t − [type(t) = pref]·H_t)·x[s,t] ≤ 0` for staff with a
    /// preference, `H_t` being the stream's total hours.
    fn add_preference_ratio(&self, model: &mut MilpModel, mode: &PreferenceMode) {
        let tt = self.timetable;
        for (s, person) in tt.staff.iter().enumerate() {
            let Some(preferred) = person.type_preference else {
                continue;
            };
            let Some(threshold) = mode.threshold(preferred) else {
                continue;
            };
            let mut expr = LinearExpr::new();
            for (t, stream) in tt.streams.iter().enumerate() {
                if !tt.is_available(s, t) {
                    continue;
                }
                let hours = stream.total_hours();
                let on_type = if stream.session_type == preferred { hours } else { 0.0 };
                expr.add_term(self.vars.assignment(s, t), threshold * hours - on_type);
            }
            if !expr.is_constant() {
                model.add_constraint(PREFERENCE_RATIO, expr.leq(0.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IsoDay, SessionStream, SessionType, Staff, Timeslot, Week};

    fn stream(id: &str, kind: SessionType, start: f64, end: f64, weeks: &[u32]) -> SessionStream {
        SessionStream::new(id, kind, IsoDay::Mon, Timeslot::new(start, end))
            .with_weeks(weeks.iter().copied())
    }

    fn build(
        staff: &[Staff],
        streams: &[SessionStream],
        mode: &PreferenceMode,
    ) -> (MilpModel, AllocationVariables) {
        let weeks = Week::term(3);
        let tt = Timetable::new(staff, streams, &weeks).unwrap();
        let mut model = MilpModel::new();
        let vars = AllocationVariables::new(&mut model, &tt);
        ConstraintBuilder::new(&tt, &vars).with_preference(mode).build(&mut model);
        (model, vars)
    }

    #[test]
    fn test_family_counts() {
        let staff = vec![
            Staff::new("a").with_availability(IsoDay::Mon, 8.0, 18.0),
            Staff::new("b").with_availability(IsoDay::Mon, 8.0, 10.0),
            Staff::new("c").as_new().with_availability(IsoDay::Mon, 8.0, 18.0),
        ];
        let streams = vec![
            stream("P1", SessionType::Practical, 8.0, 10.0, &[1, 2]).with_tutors(2),
            stream("P2", SessionType::Practical, 9.0, 11.0, &[2]),
            stream("P3", SessionType::Tutorial, 12.0, 13.0, &[3]).derived(),
        ];
        let (model, _) = build(&staff, &streams, &PreferenceMode::Objective);

        assert_eq!(model.count_labelled(HEADCOUNT), 3);
        // P1/P2 clash; only a and c can cover both.
        assert_eq!(model.count_labelled(COLLISION), 2);
        // b cannot cover P2 or P3.
        assert_eq!(model.count_labelled(AVAILABILITY), 2);
        // root streams P1 and P2.
        assert_eq!(model.count_labelled(SENIORITY), 2);
        // wk1: a, b, c; wk2: a, b, c; wk3: a, c
        assert_eq!(model.count_labelled(WEEKLY_HOURS), 8);
        assert_eq!(model.count_labelled(PREFERENCE_RATIO), 0);
    }

    #[test]
    fn test_seniority_coefficients() {
        let staff = vec![
            Staff::new("senior").available_weekdays(8.0, 18.0),
            Staff::new("new").as_new().available_weekdays(8.0, 18.0),
        ];
        let streams = vec![stream("P1", SessionType::Practical, 8.0, 10.0, &[1]).with_tutors(3)];
        let (model, vars) = build(&staff, &streams, &PreferenceMode::Objective);

        let row = model.constraints_labelled(SENIORITY).next().unwrap();
        let mut values = vec![0.0; model.num_variables()];
        values[vars.assignment(1, 0).index()] = 1.0;
        // only the new member assigned: 2·0 − 1 < 0
        assert!(!row.is_satisfied(&values, 1e-9));
        values[vars.assignment(0, 0).index()] = 1.0;
        assert!(row.is_satisfied(&values, 1e-9));
    }

    #[test]
    fn test_single_tutor_root_stream_excludes_new_staff() {
        let staff = vec![Staff::new("new").as_new().available_weekdays(8.0, 18.0)];
        let streams = vec![stream("P1", SessionType::Practical, 8.0, 10.0, &[1])];
        let (model, vars) = build(&staff, &streams, &PreferenceMode::Objective);

        let mut values = vec![0.0; model.num_variables()];
        values[vars.assignment(0, 0).index()] = 1.0;
        let row = model.constraints_labelled(SENIORITY).next().unwrap();
        assert!(!row.is_satisfied(&values, 1e-9));
    }

    #[test]
    fn test_weekly_hours_row() {
        let staff = vec![Staff::new("a")
            .with_max_weekly_hours(3.0)
            .with_availability(IsoDay::Mon, 8.0, 18.0)];
        let streams = vec![
            stream("P1", SessionType::Practical, 8.0, 10.0, &[1]),
            stream("P2", SessionType::Practical, 10.0, 12.0, &[1]),
        ];
        let (model, vars) = build(&staff, &streams, &PreferenceMode::Objective);

        assert_eq!(model.count_labelled(WEEKLY_HOURS), 1);
        let row = model.constraints_labelled(WEEKLY_HOURS).next().unwrap();
        let mut values = vec![0.0; model.num_variables()];
        values[vars.assignment(0, 0).index()] = 1.0;
        assert!(row.is_satisfied(&values, 1e-9));
        values[vars.assignment(0, 1).index()] = 1.0;
        assert!(!row.is_satisfied(&values, 1e-9));
    }

    #[test]
    fn test_preference_ratio_row() {
        let staff = vec![
            Staff::new("a")
                .with_preference(SessionType::Tutorial)
                .with_availability(IsoDay::Mon, 8.0, 18.0),
            Staff::new("b").with_availability(IsoDay::Mon, 8.0, 18.0),
        ];
        let streams = vec![
            stream("T1", SessionType::Tutorial, 8.0, 9.0, &[1, 2]),
            stream("P1", SessionType::Practical, 10.0, 12.0, &[1]),
        ];
        let (model, vars) = build(&staff, &streams, &PreferenceMode::ratio(0.5));

        assert_eq!(model.count_labelled(PREFERENCE_RATIO), 1);
        let row = model.constraints_labelled(PREFERENCE_RATIO).next().unwrap();
        let mut values = vec![0.0; model.num_variables()];
        values[vars.assignment(0, 1).index()] = 1.0;
        // 0 tutorial hours of 2
        assert!(!row.is_satisfied(&values, 1e-9));
        values[vars.assignment(0, 0).index()] = 1.0;
        // 2 tutorial hours of 4
        assert!(row.is_satisfied(&values, 1e-9));
    }
}
