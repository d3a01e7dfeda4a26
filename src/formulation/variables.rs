//! Decision and auxiliary variables of the allocation model.

use std::collections::BTreeMap;

use super::Timetable;
use crate::milp::{MilpModel, VarId};
use crate::models::{IsoDay, WeekId};

/// Variable table shared by the builders, the detector, and the extractor.
#[derive(Debug, Clone)]
pub struct AllocationVariables {
    streams: usize,
    assignment: Vec<VarId>,
    unfilled: Vec<Option<VarId>>,
    work_days: BTreeMap<(usize, IsoDay, WeekId), VarId>,
    deviation: Vec<VarId>,
    spread: Vec<VarId>,
}

impl AllocationVariables {
    /// Adds every variable to `model`.
    ///
    /// - `x[s,t]` binary for every (staff, stream) pair
    /// - `unfilled[t]` binary for streams needing at least one tutor
    /// - `works[s,d,w]` binary for every `(day, week)` slot in which `s`
    ///   can cover at least one stream
    /// - `deviation[s]` free, `spread[s] ≥ 0`
    pub fn new(model: &mut MilpModel, timetable: &Timetable<'_>) -> Self {
        let staff = timetable.staff;
        let streams = timetable.streams;

        let mut assignment = Vec::with_capacity(staff.len() * streams.len());
        for s in staff {
            for t in streams {
                assignment.push(model.add_binary(format!("x[{},{}]", s.id, t.id)));
            }
        }

        let unfilled = streams
            .iter()
            .map(|t| {
                (t.number_of_tutors > 0).then(|| model.add_binary(format!("unfilled[{}]", t.id)))
            })
            .collect();

        let mut work_days = BTreeMap::new();
        for ((day, week), hosted) in timetable.day_week_streams() {
            for (s, person) in staff.iter().enumerate() {
                if hosted.iter().any(|&t| timetable.is_available(s, t)) {
                    let name = format!("works[{},{},{}]", person.id, day.number(), week);
                    let var = model.add_binary(name);
                    work_days.insert((s, day, week), var);
                }
            }
        }

        let deviation = staff
            .iter()
            .map(|s| {
                let name = format!("deviation[{}]", s.id);
                model.add_continuous(name, f64::NEG_INFINITY, f64::INFINITY)
            })
            .collect();
        let spread = staff
            .iter()
            .map(|s| model.add_continuous(format!("spread[{}]", s.id), 0.0, f64::INFINITY))
            .collect();

        Self {
            streams: streams.len(),
            assignment,
            unfilled,
            work_days,
            deviation,
            spread,
        }
    }

    /// `x[s,t]`.
    #[inline]
    pub fn assignment(&self, s: usize, t: usize) -> VarId {
        self.assignment[s * self.streams + t]
    }

    /// `unfilled[t]`, absent for streams needing no tutors.
    pub fn unfilled(&self, t: usize) -> Option<VarId> {
        self.unfilled[t]
    }

    /// `works[s,d,w]` entries.
    pub fn work_days(&self) -> impl Iterator<Item = ((usize, IsoDay, WeekId), VarId)> + '_ {
        self.work_days.iter().map(|(k, v)| (*k, *v))
    }

    pub fn work_day(&self, s: usize, day: IsoDay, week: WeekId) -> Option<VarId> {
        self.work_days.get(&(s, day, week)).copied()
    }

    pub fn deviation(&self, s: usize) -> VarId {
        self.deviation[s]
    }

    pub fn spread(&self, s: usize) -> VarId {
        self.spread[s]
    }

    /// Number of staff rows.
    pub fn staff_count(&self) -> usize {
        self.deviation.len()
    }

    /// Number of stream columns.
    pub fn stream_count(&self) -> usize {
        self.streams
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SessionStream, SessionType, Staff, Timeslot, Week};

    #[test]
    fn test_variable_layout() {
        let staff = vec![
            Staff::new("a").with_availability(IsoDay::Mon, 8.0, 12.0),
            Staff::new("b"),
        ];
        let streams = vec![
            SessionStream::new("P1", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
                .with_weeks([1, 2]),
            SessionStream::new("P2", SessionType::Practical, IsoDay::Mon, Timeslot::new(10.0, 11.0))
                .with_tutors(0)
                .with_weeks([1]),
        ];
        let weeks = Week::term(2);
        let tt = Timetable::new(&staff, &streams, &weeks).unwrap();
        let mut model = MilpModel::new();
        let vars = AllocationVariables::new(&mut model, &tt);

        // 4 x, 1 unfilled, 2 works (staff a on Mon wk1/wk2), 2 deviation, 2 spread
        assert_eq!(model.num_variables(), 11);
        assert_eq!(vars.assignment(1, 1).index(), 3);
        assert!(vars.unfilled(0).is_some());
        assert!(vars.unfilled(1).is_none());
        assert_eq!(vars.work_days().count(), 2);
        assert!(vars.work_day(0, IsoDay::Mon, 2).is_some());
        assert!(vars.work_day(1, IsoDay::Mon, 1).is_none());
        assert_eq!(vars.staff_count(), 2);
        assert_eq!(vars.stream_count(), 2);
    }
}
