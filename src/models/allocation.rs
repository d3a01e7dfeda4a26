//! Allocation (solution) model.
//!
//! An allocation maps every session stream to the set of staff members
//! working it. It is created empty, filled once from a solved model and
//! not modified afterwards. Hard-rule breaches found by the audit are
//! reported as [`Violation`]s alongside it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Staff assigned per session stream (`stream_id → {staff_id}`).
///
/// Every stream of the problem has an entry, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Allocation {
    streams: BTreeMap<String, BTreeSet<String>>,
}

impl Allocation {
    /// Creates an empty allocation with one entry per stream id.
    pub fn new<'a>(stream_ids: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            streams: stream_ids
                .into_iter()
                .map(|id| (id.to_string(), BTreeSet::new()))
                .collect(),
        }
    }

    /// Records that `staff_id` works `stream_id`.
    pub fn assign(&mut self, stream_id: impl Into<String>, staff_id: impl Into<String>) {
        self.streams
            .entry(stream_id.into())
            .or_default()
            .insert(staff_id.into());
    }

    /// Staff assigned to a stream (empty if unknown).
    pub fn staff_for(&self, stream_id: &str) -> impl Iterator<Item = &str> {
        self.streams
            .get(stream_id)
            .into_iter()
            .flat_map(|staff| staff.iter().map(String::as_str))
    }

    /// Number of staff assigned to a stream.
    pub fn filled_count(&self, stream_id: &str) -> usize {
        self.streams.get(stream_id).map_or(0, BTreeSet::len)
    }

    /// Whether `staff_id` works `stream_id`.
    pub fn is_assigned(&self, stream_id: &str, staff_id: &str) -> bool {
        self.streams
            .get(stream_id)
            .is_some_and(|staff| staff.contains(staff_id))
    }

    /// Streams a staff member works, in stream-id order.
    pub fn streams_for_staff<'a>(&'a self, staff_id: &'a str) -> impl Iterator<Item = &'a str> {
        self.streams
            .iter()
            .filter(move |(_, staff)| staff.contains(staff_id))
            .map(|(stream, _)| stream.as_str())
    }

    /// Iterates `(stream_id, staff set)` in stream-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.streams.iter().map(|(id, staff)| (id.as_str(), staff))
    }

    /// Total number of (staff, stream) pairs.
    pub fn assignment_count(&self) -> usize {
        self.streams.values().map(BTreeSet::len).sum()
    }

    /// Number of streams in the allocation.
    pub fn stream_count(&self) -> usize {
        self.streams.len()
    }
}

/// A hard-rule breach found in an allocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Rule that was broken.
    pub violation_type: ViolationType,
    /// Staff or stream the breach is attributed to.
    pub entity_id: String,
    /// Human-readable description.
    pub message: String,
}

/// Classification of hard-rule breaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Staff member works two clashing streams.
    Collision,
    /// Staff member works outside their availability.
    Unavailable,
    /// Stream has more staff than it needs.
    OverFilled,
    /// Weekly hours exceed the staff member's cap.
    WeeklyHoursExceeded,
    /// An unbroken working block exceeds the staff member's cap.
    ContiguousHoursExceeded,
    /// A root stream's team lacks senior coverage.
    SeniorityCoverage,
    /// Preferred-type share is below the configured ratio.
    PreferenceRatio,
    /// Allocation refers to an unknown staff member or stream.
    UnknownEntity,
}

impl Violation {
    /// Creates a violation.
    pub fn new(
        violation_type: ViolationType,
        entity_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            violation_type,
            entity_id: entity_id.into(),
            message: message.into(),
        }
    }
}
