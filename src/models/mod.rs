//! Rostering domain models.
//!
//! Value types describing a term timetable and the people who staff it.
//! All types are read-only input to a solve, except [`Allocation`], which
//! is its output.
//!
//! # Domain Mappings
//!
//! | u-roster | University | Clinic | Retail |
//! |----------|-----------|--------|--------|
//! | SessionStream | Weekly practical class | Recurring clinic session | Recurring shift |
//! | Staff | Tutor / demonstrator | Nurse | Shop assistant |
//! | Week | Teaching week | Roster week | Roster week |
//! | Allocation | Tutor allocation | Session roster | Shift roster |

mod allocation;
mod session;
mod staff;
mod timeslot;
mod week;

pub use allocation::{Allocation, Violation, ViolationType};
pub use session::{IsoDay, SessionStream, SessionType};
pub use staff::Staff;
pub use timeslot::{Hour, Timeslot};
pub use week::{Week, WeekId};
