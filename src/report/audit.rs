//! Hard-rule audit of a finished allocation.

use std::collections::{BTreeMap, HashMap};

use crate::config::PreferenceMode;
use crate::formulation::find_violating_runs;
use crate::models::{Allocation, SessionStream, Staff, Violation, ViolationType, WeekId};

const HOURS_EPSILON: f64 = 1e-6;

/// Checks `allocation` against every hard rule.
///
/// Rules: known ids, headcount, availability, collisions, weekly and
/// contiguous hour caps, seniority coverage on root streams, and the
/// preference ratio when `preference` is [`PreferenceMode::Ratio`].
/// Returns an empty list for a sound allocation.
pub fn audit_allocation(
    allocation: &Allocation,
    staff: &[Staff],
    streams: &[SessionStream],
    preference: &PreferenceMode,
) -> Vec<Violation> {
    let mut violations = Vec::new();
    let stream_index: HashMap<&str, usize> =
        streams.iter().enumerate().map(|(i, t)| (t.id.as_str(), i)).collect();
    let staff_by_id: HashMap<&str, &Staff> = staff.iter().map(|s| (s.id.as_str(), s)).collect();

    for (stream_id, assigned) in allocation.iter() {
        let Some(&t) = stream_index.get(stream_id) else {
            violations.push(Violation::new(
                ViolationType::UnknownEntity,
                stream_id,
                format!("Unknown stream '{stream_id}'"),
            ));
            continue;
        };
        let stream = &streams[t];
        if assigned.len() > stream.number_of_tutors as usize {
            violations.push(Violation::new(
                ViolationType::OverFilled,
                stream_id,
                format!(
                    "{} staff on {} needing {}",
                    assigned.len(),
                    stream,
                    stream.number_of_tutors
                ),
            ));
        }

        let mut senior = 0usize;
        let mut new = 0usize;
        for staff_id in assigned {
            match staff_by_id.get(staff_id.as_str()) {
                None => violations.push(Violation::new(
                    ViolationType::UnknownEntity,
                    staff_id.as_str(),
                    format!("Unknown staff '{staff_id}' on {stream}"),
                )),
                Some(person) if person.new => new += 1,
                Some(_) => senior += 1,
            }
        }
        if stream.root && stream.number_of_tutors > 0 {
            let capacity = (stream.number_of_tutors as usize - 1) * senior;
            if capacity < new {
                violations.push(Violation::new(
                    ViolationType::SeniorityCoverage,
                    stream_id,
                    format!("{stream} has {new} new and {senior} senior staff"),
                ));
            }
        }
    }

    for person in staff {
        let allocated: Vec<usize> = allocation
            .streams_for_staff(&person.id)
            .filter_map(|id| stream_index.get(id).copied())
            .collect();
        audit_staff(person, streams, &allocated, preference, &mut violations);
    }

    violations
}

fn audit_staff(
    person: &Staff,
    streams: &[SessionStream],
    allocated: &[usize],
    preference: &PreferenceMode,
    violations: &mut Vec<Violation>,
) {
    for &t in allocated {
        if !person.is_available(&streams[t]) {
            violations.push(Violation::new(
                ViolationType::Unavailable,
                person.id.as_str(),
                format!("{} is not available for {}", person, streams[t]),
            ));
        }
    }

    for (i, &a) in allocated.iter().enumerate() {
        for &b in &allocated[i + 1..] {
            if streams[a].clashes_with(&streams[b]) {
                violations.push(Violation::new(
                    ViolationType::Collision,
                    person.id.as_str(),
                    format!("{} works clashing {} and {}", person, streams[a], streams[b]),
                ));
            }
        }
    }

    let mut weekly: BTreeMap<WeekId, f64> = BTreeMap::new();
    for &t in allocated {
        for &week in &streams[t].weeks {
            *weekly.entry(week).or_default() += streams[t].duration();
        }
    }
    for (week, hours) in weekly {
        if hours > person.max_weekly_hours + HOURS_EPSILON {
            violations.push(Violation::new(
                ViolationType::WeeklyHoursExceeded,
                person.id.as_str(),
                format!(
                    "{person} works {hours}h in week {week} (cap {}h)",
                    person.max_weekly_hours
                ),
            ));
        }
    }

    for run in find_violating_runs(streams, allocated, person.max_contiguous_hours) {
        let ids: Vec<&str> = run.iter().map(|&t| streams[t].id.as_str()).collect();
        violations.push(Violation::new(
            ViolationType::ContiguousHoursExceeded,
            person.id.as_str(),
            format!(
                "{} works {:?} back to back (cap {}h)",
                person, ids, person.max_contiguous_hours
            ),
        ));
    }

    let Some(preferred) = person.type_preference else {
        return;
    };
    let Some(threshold) = preference.threshold(preferred) else {
        return;
    };
    let total: f64 = allocated.iter().map(|&t| streams[t].total_hours()).sum();
    let on_type: f64 = allocated
        .iter()
        .filter(|&&t| streams[t].session_type == preferred)
        .map(|&t| streams[t].total_hours())
        .sum();
    if on_type + HOURS_EPSILON < threshold * total {
        violations.push(Violation::new(
            ViolationType::PreferenceRatio,
            person.id.as_str(),
            format!("{person} works {on_type}h of {total}h on {preferred:?} (ratio {threshold})"),
        ));
    }
}
