//! Clock hours and timeslots.
//!
//! # Time Model
//! Times are real-valued hours on a 24-hour clock (`8.5` = 08:30).
//! There is no date or timezone: a timeslot only makes sense together
//! with the weekday and week set of the stream or availability it belongs to.
//!
//! Timeslots are half-open intervals `[start, end)`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Sub;

/// A point on a 24-hour clock, in hours.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hour(pub f64);

impl Hour {
    /// Creates an hour value.
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Raw hour value.
    #[inline]
    pub fn value(self) -> f64 {
        self.0
    }

    /// Total ordering (NaN sorts last), used for sorting timeslots.
    #[inline]
    pub fn total_cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Sub for Hour {
    type Output = f64;

    fn sub(self, rhs: Self) -> f64 {
        self.0 - rhs.0
    }
}

impl From<f64> for Hour {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h", self.0)
    }
}

/// A time interval `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Timeslot {
    /// Interval start (inclusive).
    #[serde(alias = "start_time")]
    pub start: Hour,
    /// Interval end (exclusive).
    #[serde(alias = "end_time")]
    pub end: Hour,
}

impl Timeslot {
    /// Creates a new timeslot.
    ///
    /// No ordering check is made here; use [`Timeslot::is_well_formed`]
    /// or the input validation before solving.
    pub fn new(start: impl Into<Hour>, end: impl Into<Hour>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Length of the slot in hours.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `start < end` and both ends are finite.
    pub fn is_well_formed(&self) -> bool {
        self.start.0.is_finite() && self.end.0.is_finite() && self.start < self.end
    }

    /// Whether the two slots overlap (half-open semantics).
    ///
    /// ```
    /// use u_roster::models::Timeslot;
    ///
    /// let a = Timeslot::new(8.0, 10.0);
    /// assert!(a.clashes_with(&Timeslot::new(9.0, 11.0)));
    /// assert!(!a.clashes_with(&Timeslot::new(10.0, 12.0))); // touching only
    /// ```
    pub fn clashes_with(&self, other: &Self) -> bool {
        (self.start <= other.start && other.start < self.end)
            || (other.start <= self.start && self.start < other.end)
    }

    /// Whether this slot starts exactly when `previous` ends.
    ///
    /// Directional: `b.is_contiguous(&a)` means `b` immediately follows `a`.
    #[inline]
    pub fn is_contiguous(&self, previous: &Self) -> bool {
        self.start == previous.end
    }

    /// Whether `hour` falls inside this slot.
    #[inline]
    pub fn contains(&self, hour: Hour) -> bool {
        self.start <= hour && hour < self.end
    }

    /// Sort key `(start, end)` as a total order.
    pub fn cmp_by_start(&self, other: &Self) -> Ordering {
        self.start
            .total_cmp(&other.start)
            .then_with(|| self.end.total_cmp(&other.end))
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}
