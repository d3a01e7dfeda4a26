//! Reading an allocation out of solved variable values.

use super::{AllocationVariables, Timetable};
use crate::models::Allocation;

/// Decision values above this count as assigned.
pub const EXTRACTION_THRESHOLD: f64 = 0.99;

/// Builds the stream → staff mapping from `values`.
///
/// Every stream gets an entry, empty if nobody works it.
pub fn extract_allocation(
    timetable: &Timetable<'_>,
    vars: &AllocationVariables,
    values: &[f64],
) -> Allocation {
    let mut allocation = Allocation::new(timetable.streams.iter().map(|t| t.id.as_str()));
    for (s, person) in timetable.staff.iter().enumerate() {
        for (t, stream) in timetable.streams.iter().enumerate() {
            if values[vars.assignment(s, t).index()] > EXTRACTION_THRESHOLD {
                allocation.assign(stream.id.as_str(), person.id.as_str());
            }
        }
    }
    allocation
}
