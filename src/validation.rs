//! Input validation for allocation problems.
//!
//! Checks structural integrity of staff, streams, and weeks before any
//! model is built. Detects:
//! - Duplicate IDs
//! - Streams running in weeks that were not supplied
//! - Malformed timeslots (stream times and availability windows)
//! - Non-finite or negative workload caps

use crate::models::{SessionStream, Staff, Week};
use std::collections::HashSet;
use std::fmt;

/// Validation result.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// A validation error.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    /// Error category.
    pub kind: ValidationErrorKind,
    /// Human-readable description.
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Two entities share the same ID.
    DuplicateId,
    /// A stream runs in a week that doesn't exist.
    InvalidWeekReference,
    /// A timeslot has `start >= end` or a non-finite bound.
    MalformedTimeslot,
    /// A workload cap is negative or not finite.
    InvalidLimit,
}

impl ValidationError {
    /// Creates a validation error.
    pub fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

/// Validates the input data for an allocation problem.
///
/// Checks:
/// 1. No duplicate week, stream, or staff IDs
/// 2. Every stream week refers to a supplied week
/// 3. Every stream timeslot and availability window is well formed
/// 4. Workload caps are finite and non-negative
///
/// An empty staff list is not reported here; it is a
/// [`ConfigurationError::NoStaff`](crate::ConfigurationError::NoStaff).
///
/// # Returns
/// `Ok(())` if all checks pass, `Err(errors)` with all detected issues.
pub fn validate_input(
    staff: &[Staff],
    streams: &[SessionStream],
    weeks: &[Week],
) -> ValidationResult {
    let mut errors = Vec::new();

    let mut week_ids = HashSet::new();
    for w in weeks {
        if !week_ids.insert(w.id) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate week ID: {}", w.id),
            ));
        }
    }

    let mut stream_ids = HashSet::new();
    for s in streams {
        if !stream_ids.insert(s.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate stream ID: {}", s.id),
            ));
        }
        if !s.time.is_well_formed() {
            errors.push(ValidationError::new(
                ValidationErrorKind::MalformedTimeslot,
                format!("Stream '{}' has malformed time {}", s.id, s.time),
            ));
        }
        for week in &s.weeks {
            if !week_ids.contains(week) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidWeekReference,
                    format!("Stream '{}' runs in unknown week {}", s.id, week),
                ));
            }
        }
    }

    let mut staff_ids = HashSet::new();
    for p in staff {
        if !staff_ids.insert(p.id.as_str()) {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate staff ID: {}", p.id),
            ));
        }
        for (day, windows) in &p.availabilities {
            for window in windows.iter().filter(|w| !w.is_well_formed()) {
                errors.push(ValidationError::new(
                    ValidationErrorKind::MalformedTimeslot,
                    format!(
                        "Staff '{}' has malformed availability {} on day {}",
                        p.id,
                        window,
                        day.number()
                    ),
                ));
            }
        }
        for (label, value) in [
            ("max_contiguous_hours", p.max_contiguous_hours),
            ("max_weekly_hours", p.max_weekly_hours),
        ] {
            if !value.is_finite() || value < 0.0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::InvalidLimit,
                    format!("Staff '{}' has invalid {}: {}", p.id, label, value),
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{IsoDay, SessionType, Timeslot};

    fn stream(id: &str, start: f64, end: f64, weeks: &[u32]) -> SessionStream {
        SessionStream::new(id, SessionType::Practical, IsoDay::Mon, Timeslot::new(start, end))
            .with_weeks(weeks.iter().copied())
    }

    #[test]
    fn test_valid_input() {
        let weeks = Week::term(2);
        let streams = vec![stream("P01", 8.0, 10.0, &[1, 2]), stream("P02", 10.0, 12.0, &[2])];
        let staff = vec![Staff::new("a").available_weekdays(8.0, 18.0), Staff::new("b")];
        assert!(validate_input(&staff, &streams, &weeks).is_ok());
    }

    #[test]
    fn test_duplicate_ids() {
        let weeks = vec![Week::new(1, "1"), Week::new(1, "1 again")];
        let streams = vec![stream("P01", 8.0, 10.0, &[1]), stream("P01", 10.0, 11.0, &[1])];
        let staff = vec![Staff::new("a"), Staff::new("a")];
        let errors = validate_input(&staff, &streams, &weeks).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::DuplicateId));
    }

    #[test]
    fn test_unknown_week_reference() {
        let weeks = Week::term(2);
        let streams = vec![stream("P01", 8.0, 10.0, &[1, 5])];
        let errors = validate_input(&[Staff::new("a")], &streams, &weeks).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ValidationErrorKind::InvalidWeekReference);
        assert!(errors[0].message.contains("week 5"));
    }

    #[test]
    fn test_malformed_timeslots() {
        let weeks = Week::term(1);
        let streams = vec![stream("P01", 10.0, 8.0, &[1])];
        let staff = vec![Staff::new("a").with_availability(IsoDay::Tue, 12.0, 12.0)];
        let errors = validate_input(&staff, &streams, &weeks).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors
            .iter()
            .all(|e| e.kind == ValidationErrorKind::MalformedTimeslot));
    }

    #[test]
    fn test_invalid_limits() {
        let staff = vec![Staff::new("a")
            .with_max_contiguous_hours(-1.0)
            .with_max_weekly_hours(f64::INFINITY)];
        let errors = validate_input(&staff, &[], &[]).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| e.kind == ValidationErrorKind::InvalidLimit));
    }

    #[test]
    fn test_collects_all_errors() {
        let weeks = Week::term(1);
        let streams = vec![stream("P01", 9.0, 9.0, &[3]), stream("P01", 8.0, 9.0, &[1])];
        let errors = validate_input(&[Staff::new("a")], &streams, &weeks).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
