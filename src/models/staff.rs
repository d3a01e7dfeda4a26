//! Staff model.
//!
//! Staff members are the resources being allocated. Each carries a
//! seniority flag, an optional preferred session type, two workload caps,
//! and per-weekday availability windows.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::{IsoDay, SessionStream, SessionType, Timeslot};

/// A staff member who can be allocated to session streams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Staff {
    /// Unique staff identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Seniority flag: `true` for staff new to the course.
    pub new: bool,
    /// Preferred session type, if any.
    #[serde(default)]
    pub type_preference: Option<SessionType>,
    /// Longest unbroken working block (hours).
    #[serde(default = "default_max_contiguous_hours")]
    pub max_contiguous_hours: f64,
    /// Cap on hours worked in any single week.
    #[serde(default = "default_max_weekly_hours")]
    pub max_weekly_hours: f64,
    /// Windows in which the staff member can work, per weekday.
    /// A missing or empty day means unavailable.
    #[serde(default)]
    pub availabilities: BTreeMap<IsoDay, Vec<Timeslot>>,
}

fn default_max_contiguous_hours() -> f64 {
    24.0
}

fn default_max_weekly_hours() -> f64 {
    100.0
}

impl Staff {
    /// Creates a senior staff member with no availability.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            new: false,
            type_preference: None,
            max_contiguous_hours: default_max_contiguous_hours(),
            max_weekly_hours: default_max_weekly_hours(),
            availabilities: BTreeMap::new(),
        }
    }

    /// Sets the name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Flags the staff member as new.
    pub fn as_new(mut self) -> Self {
        self.new = true;
        self
    }

    /// Sets the preferred session type.
    pub fn with_preference(mut self, session_type: SessionType) -> Self {
        self.type_preference = Some(session_type);
        self
    }

    /// Sets the contiguous-hours cap.
    pub fn with_max_contiguous_hours(mut self, hours: f64) -> Self {
        self.max_contiguous_hours = hours;
        self
    }

    /// Sets the weekly-hours cap.
    pub fn with_max_weekly_hours(mut self, hours: f64) -> Self {
        self.max_weekly_hours = hours;
        self
    }

    /// Adds an availability window on `day`.
    pub fn with_availability(mut self, day: IsoDay, start: f64, end: f64) -> Self {
        self.availabilities
            .entry(day)
            .or_default()
            .push(Timeslot::new(start, end));
        self
    }

    /// Adds the same window on every weekday Monday to Friday.
    pub fn available_weekdays(mut self, start: f64, end: f64) -> Self {
        for day in &IsoDay::ALL[..5] {
            self = self.with_availability(*day, start, end);
        }
        self
    }

    /// Whether the staff member can work the whole of `stream`.
    ///
    /// # Algorithm
    /// Windows for the stream's day are sorted by `(start, end)`. A check
    /// point starts at the stream's start. The first window that begins
    /// after the check point ends the search (a gap). A window containing
    /// the check point either covers the stream's end, or moves the check
    /// point to its own end so that a window starting right there can carry
    /// the coverage on. Overlapping and touching windows therefore chain,
    /// gaps never do.
    pub fn is_available(&self, stream: &SessionStream) -> bool {
        let Some(windows) = self.availabilities.get(&stream.day) else {
            return false;
        };
        let mut windows: Vec<&Timeslot> = windows.iter().collect();
        windows.sort_by(|a, b| a.cmp_by_start(b));

        let mut check = stream.time.start;
        for window in windows {
            if window.start > check {
                return false;
            }
            if window.contains(check) {
                if stream.time.end <= window.end {
                    return true;
                }
                check = window.end;
            }
        }
        false
    }
}

impl fmt::Display for Staff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "Staff {}", self.id)
        } else {
            write!(f, "Staff {}", self.name)
        }
    }
}
