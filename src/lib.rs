//! Staff rostering for recurring timetabled sessions.
//!
//! Assigns staff members to session streams across a multi-week term,
//! subject to hard rules (availability, headcount, no double-booking,
//! weekly and contiguous hour caps, seniority coverage) while optimising a
//! lexicographic hierarchy of soft objectives (filled sessions, filled
//! hours, type preferences, workload balance, work days).
//!
//! # Modules
//!
//! - **`models`**: Domain types: `Staff`, `SessionStream`, `Timeslot`,
//!   `Week`, `Allocation`
//! - **`validation`**: Input integrity checks (duplicate IDs, week refs, timeslots)
//! - **`formulation`**: Domain → MILP translation, clash index, and the lazy
//!   contiguity detector
//! - **`milp`**: Backend-neutral model, lexicographic search, HiGHS backend
//! - **`report`**: Allocation audit and KPIs
//!
//! # Example
//! ```no_run
//! use u_roster::{solve, SolveOutcome};
//! use u_roster::models::{IsoDay, SessionStream, SessionType, Staff, Timeslot, Week};
//!
//! let weeks = Week::term(2);
//! let streams = vec![
//!     SessionStream::new("P01", SessionType::Practical, IsoDay::Mon, Timeslot::new(8.0, 10.0))
//!         .with_weeks([1, 2]),
//! ];
//! let staff = vec![
//!     Staff::new("alex").with_availability(IsoDay::Mon, 8.0, 10.0),
//!     Staff::new("sam").with_availability(IsoDay::Mon, 8.0, 10.0),
//! ];
//!
//! match solve(&staff, &streams, &weeks, 60).unwrap() {
//!     SolveOutcome::Optimal(allocation) => assert_eq!(allocation.filled_count("P01"), 1),
//!     other => panic!("unexpected outcome: {other}"),
//! }
//! ```
//!
//! # References
//!
//! - Ernst et al. (2004), "Staff scheduling and rostering: A review of
//!   applications, methods and models"
//! - Wolsey (1998), "Integer Programming", Ch. 9 (cutting planes)

pub mod config;
pub mod error;
pub mod formulation;
pub mod milp;
pub mod models;
pub mod report;
pub mod solver;
pub mod validation;

pub use config::{AllocatorConfig, PreferenceMode};
pub use error::ConfigurationError;
pub use report::{audit_allocation, AllocationKpi};
pub use solver::{solve, AllocationRequest, AllocationRun, Allocator, SolveOutcome, SolveStatistics};
