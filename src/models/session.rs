//! Session stream model.
//!
//! A session stream is one recurring class instance: a fixed weekday and
//! timeslot, repeated over a subset of the term's weeks, that needs a
//! number of staff members.
//!
//! # Clash Predicate
//! Two streams clash iff they fall on the same day, their timeslots
//! overlap, and their week sets intersect. A staff member can never work
//! two clashing streams.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::{Timeslot, WeekId};

/// ISO weekday (Monday = 1 .. Sunday = 7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum IsoDay {
    Mon = 1,
    Tue = 2,
    Wed = 3,
    Thu = 4,
    Fri = 5,
    Sat = 6,
    Sun = 7,
}

impl IsoDay {
    /// All days in ISO order.
    pub const ALL: [IsoDay; 7] = [
        IsoDay::Mon,
        IsoDay::Tue,
        IsoDay::Wed,
        IsoDay::Thu,
        IsoDay::Fri,
        IsoDay::Sat,
        IsoDay::Sun,
    ];

    /// ISO day number (1-7).
    #[inline]
    pub fn number(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for IsoDay {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        IsoDay::ALL
            .get(usize::from(value).wrapping_sub(1))
            .copied()
            .ok_or_else(|| format!("ISO weekday must be 1-7, got {value}"))
    }
}

impl From<IsoDay> for u8 {
    fn from(day: IsoDay) -> u8 {
        day.number()
    }
}

/// Category of a session stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SessionType {
    Practical,
    Tutorial,
    Seminar,
    Lecture,
    Studio,
    Contact,
    Workshop,
}

/// A recurring timetabled session that staff are allocated to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStream {
    /// Unique stream identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Session category.
    #[serde(rename = "type")]
    pub session_type: SessionType,
    /// Weekday the stream runs on.
    pub day: IsoDay,
    /// Time of day.
    pub time: Timeslot,
    /// Required headcount.
    pub number_of_tutors: u32,
    /// Weeks in which the stream runs.
    #[serde(default)]
    pub weeks: BTreeSet<WeekId>,
    /// Root streams need senior coverage; derived streams do not.
    #[serde(default = "default_root")]
    pub root: bool,
}

fn default_root() -> bool {
    true
}

impl SessionStream {
    /// Creates a single-tutor root stream that runs in no weeks yet.
    pub fn new(
        id: impl Into<String>,
        session_type: SessionType,
        day: IsoDay,
        time: Timeslot,
    ) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            session_type,
            day,
            time,
            number_of_tutors: 1,
            weeks: BTreeSet::new(),
            root: true,
        }
    }

    /// Sets the stream name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the required headcount.
    pub fn with_tutors(mut self, number_of_tutors: u32) -> Self {
        self.number_of_tutors = number_of_tutors;
        self
    }

    /// Sets the weeks the stream runs in.
    pub fn with_weeks(mut self, weeks: impl IntoIterator<Item = WeekId>) -> Self {
        self.weeks = weeks.into_iter().collect();
        self
    }

    /// Marks the stream as derived (no seniority coverage needed).
    pub fn derived(mut self) -> Self {
        self.root = false;
        self
    }

    /// Length of one occurrence in hours.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.time.duration()
    }

    /// Hours over the whole term: `duration × |weeks|`.
    pub fn total_hours(&self) -> f64 {
        self.duration() * self.weeks.len() as f64
    }

    /// Whether the stream runs in `week`.
    #[inline]
    pub fn runs_in(&self, week: WeekId) -> bool {
        self.weeks.contains(&week)
    }

    /// Whether the two streams run in at least one common week.
    pub fn shares_week_with(&self, other: &Self) -> bool {
        self.weeks.intersection(&other.weeks).next().is_some()
    }

    /// Clash predicate: same day, overlapping time, common week.
    pub fn clashes_with(&self, other: &Self) -> bool {
        self.day == other.day && self.time.clashes_with(&other.time) && self.shares_week_with(other)
    }

    /// Whether this stream directly continues `previous` in a working block:
    /// same day, starts exactly when `previous` ends, and a common week.
    pub fn continues(&self, previous: &Self) -> bool {
        self.day == previous.day
            && self.time.is_contiguous(&previous.time)
            && self.shares_week_with(previous)
    }
}

impl fmt::Display for SessionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "Session Stream {}", self.id)
        } else {
            write!(f, "Session Stream {}", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: &str, day: IsoDay, start: f64, end: f64, weeks: &[WeekId]) -> SessionStream {
        SessionStream::new(id, SessionType::Practical, day, Timeslot::new(start, end))
            .with_weeks(weeks.iter().copied())
    }

    #[test]
    fn test_stream_builder() {
        let s = SessionStream::new(
            "P01",
            SessionType::Tutorial,
            IsoDay::Wed,
            Timeslot::new(9.0, 11.0),
        )
        .with_name("T01 Wednesday")
        .with_tutors(3)
        .with_weeks([1, 2, 3, 5])
        .derived();

        assert_eq!(s.id, "P01");
        assert_eq!(s.name, "T01 Wednesday");
        assert_eq!(s.number_of_tutors, 3);
        assert!(!s.root);
        assert!((s.duration() - 2.0).abs() < 1e-10);
        assert!((s.total_hours() - 8.0).abs() < 1e-10);
        assert!(s.runs_in(5));
        assert!(!s.runs_in(4));
    }

    #[test]
    fn test_clash_requires_same_day_overlap_and_week() {
        let a = stream("a", IsoDay::Mon, 8.0, 10.0, &[1, 2]);
        assert!(a.clashes_with(&stream("b", IsoDay::Mon, 9.0, 11.0, &[2, 3])));
        assert!(!a.clashes_with(&stream("c", IsoDay::Tue, 9.0, 11.0, &[1, 2])));
        assert!(!a.clashes_with(&stream("d", IsoDay::Mon, 10.0, 11.0, &[1, 2])));
        assert!(!a.clashes_with(&stream("e", IsoDay::Mon, 8.0, 10.0, &[3, 4])));
        assert!(a.clashes_with(&a));
    }

    #[test]
    fn test_continues() {
        let a = stream("a", IsoDay::Mon, 8.0, 10.0, &[1, 2]);
        let b = stream("b", IsoDay::Mon, 10.0, 12.0, &[2]);
        assert!(b.continues(&a));
        assert!(!a.continues(&b));
        assert!(!stream("c", IsoDay::Mon, 10.0, 12.0, &[3]).continues(&a));
        assert!(!stream("d", IsoDay::Tue, 10.0, 12.0, &[1]).continues(&a));
        assert!(!stream("e", IsoDay::Mon, 10.5, 12.0, &[1]).continues(&a));
    }

    #[test]
    fn test_iso_day_serde() {
        let day: IsoDay = serde_json::from_str("5").unwrap();
        assert_eq!(day, IsoDay::Fri);
        assert_eq!(serde_json::to_string(&IsoDay::Sun).unwrap(), "7");
        assert!(serde_json::from_str::<IsoDay>("0").is_err());
        assert!(serde_json::from_str::<IsoDay>("8").is_err());
    }

    #[test]
    fn test_stream_deserialize() {
        let json = r#"{
            "id": "7", "name": "P07", "type": "Workshop", "day": 2,
            "time": {"start": 14.0, "end": 16.0},
            "number_of_tutors": 2, "weeks": [1, 3]
        }"#;
        let s: SessionStream = serde_json::from_str(json).unwrap();
        assert_eq!(s.session_type, SessionType::Workshop);
        assert_eq!(s.day, IsoDay::Tue);
        assert!(s.root);
        assert!((s.total_hours() - 4.0).abs() < 1e-10);
    }
}
