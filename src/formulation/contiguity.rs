//! Lazy enforcement of contiguous working-hour caps.
//!
//! A working block is a chain of a staff member's streams on one day where
//! each stream starts exactly when the previous one ends and the two share
//! at least one week. Which blocks exist depends on the candidate
//! allocation, so the cap is checked per candidate and violated blocks are
//! cut off with `Σ_{t in block} x[s,t] ≤ |block| − 1` (or `x[s,t] = 0` for a
//! single over-long stream).
//!
//! # Algorithm
//! 1. Sort the staff member's allocated streams by `(day, start, end)`.
//! 2. Seed a work list with the first stream. Pop a seed and scan forward,
//!    extending the run with every stream that continues its last member.
//!    Streams that do not continue it are queued as seeds; a stream that
//!    begins after the run's end (or on a later day) ends the scan.
//! 3. Stop extending once the accumulated hours exceed the cap and report
//!    the run.
//! 4. If the walk reports nothing, a longest-chain pass over the same order
//!    confirms that no branching chain exceeds the cap either; any chain it
//!    finds is trimmed to its shortest violating suffix.

use std::collections::{BTreeSet, VecDeque};

use log::trace;

use super::{AllocationVariables, Timetable};
use crate::milp::{LazyConstraintCallback, LazyCut};
use crate::models::SessionStream;

/// Value band around 1 within which a binary counts as assigned.
pub const ASSIGNED_TOLERANCE: f64 = 0.01;

const HOURS_EPSILON: f64 = 1e-9;

/// Runs of `allocated` (stream indices into `streams`) whose total
/// duration exceeds `cap`.
///
/// Each returned run lists stream indices in time order; every member
/// continues the previous one.
pub fn find_violating_runs(
    streams: &[SessionStream],
    allocated: &[usize],
    cap: f64,
) -> Vec<Vec<usize>> {
    let mut order = allocated.to_vec();
    order.sort_by(|&a, &b| {
        let (x, y) = (&streams[a], &streams[b]);
        x.day.cmp(&y.day).then_with(|| x.time.cmp_by_start(&y.time))
    });

    let mut runs = walk(streams, &order, cap);
    if runs.is_empty() {
        runs = longest_chains(streams, &order, cap);
    }
    runs
}

fn exceeds(hours: f64, cap: f64) -> bool {
    hours > cap + HOURS_EPSILON
}

/// Whether `next` lies strictly after the run ending with `last`.
fn is_gap(next: &SessionStream, last: &SessionStream) -> bool {
    next.day != last.day || next.time.start > last.time.end
}

fn walk(streams: &[SessionStream], order: &[usize], cap: f64) -> Vec<Vec<usize>> {
    let k = order.len();
    let mut runs = Vec::new();
    if k == 0 {
        return runs;
    }

    let mut queued = vec![false; k];
    let mut queue = VecDeque::from([0]);
    queued[0] = true;

    while let Some(seed) = queue.pop_front() {
        let mut run = vec![seed];
        let mut last = seed;
        let mut hours = streams[order[seed]].duration();
        let mut violated = exceeds(hours, cap);

        if !violated {
            for next in seed + 1..k {
                let (candidate, tail) = (&streams[order[next]], &streams[order[last]]);
                if candidate.continues(tail) {
                    run.push(next);
                    last = next;
                    hours += candidate.duration();
                    if exceeds(hours, cap) {
                        violated = true;
                        break;
                    }
                    continue;
                }
                if !queued[next] {
                    queued[next] = true;
                    queue.push_back(next);
                }
                if is_gap(candidate, tail) {
                    break;
                }
            }
        }

        if violated {
            runs.push(run.iter().map(|&i| order[i]).collect());
        }
        if last + 1 < k && !queued[last + 1] {
            queued[last + 1] = true;
            queue.push_back(last + 1);
        }
    }
    runs
}

/// Longest chain ending at each position; reports the shortest violating
/// suffix of every chain that first crosses the cap there.
fn longest_chains(streams: &[SessionStream], order: &[usize], cap: f64) -> Vec<Vec<usize>> {
    let k = order.len();
    let mut best = vec![0.0_f64; k];
    let mut previous: Vec<Option<usize>> = vec![None; k];

    for i in 0..k {
        let current = &streams[order[i]];
        let mut longest = 0.0;
        for j in 0..i {
            if current.continues(&streams[order[j]]) && best[j] > longest {
                longest = best[j];
                previous[i] = Some(j);
            }
        }
        best[i] = longest + current.duration();
    }

    let mut seen = BTreeSet::new();
    let mut runs = Vec::new();
    for i in 0..k {
        if !exceeds(best[i], cap) || previous[i].is_some_and(|j| exceeds(best[j], cap)) {
            continue;
        }
        let mut suffix = Vec::new();
        let mut hours = 0.0;
        let mut cursor = Some(i);
        while let Some(at) = cursor {
            suffix.push(order[at]);
            hours += streams[order[at]].duration();
            if exceeds(hours, cap) {
                break;
            }
            cursor = previous[at];
        }
        suffix.reverse();
        if seen.insert(suffix.clone()) {
            runs.push(suffix);
        }
    }
    runs
}

/// Lazy-constraint callback enforcing `max_contiguous_hours` for every
/// staff member.
///
/// Holds only shared references; safe to call from any backend thread.
pub struct ContiguityDetector<'a> {
    timetable: &'a Timetable<'a>,
    vars: &'a AllocationVariables,
}

impl<'a> ContiguityDetector<'a> {
    pub fn new(timetable: &'a Timetable<'a>, vars: &'a AllocationVariables) -> Self {
        Self { timetable, vars }
    }

    /// Streams staff `s` works in `values`.
    fn allocated(&self, s: usize, values: &[f64]) -> Vec<usize> {
        (0..self.timetable.stream_count())
            .filter(|&t| {
                let v = values[self.vars.assignment(s, t).index()];
                (v - 1.0).abs() <= ASSIGNED_TOLERANCE
            })
            .collect()
    }
}

impl LazyConstraintCallback for ContiguityDetector<'_> {
    fn on_candidate(&self, values: &[f64]) -> Vec<LazyCut> {
        let tt = self.timetable;
        let mut cuts = Vec::new();
        for (s, person) in tt.staff.iter().enumerate() {
            let allocated = self.allocated(s, values);
            if allocated.is_empty() {
                continue;
            }
            for run in find_violating_runs(tt.streams, &allocated, person.max_contiguous_hours) {
                trace!(
                    "{} exceeds {}h contiguous on {:?}",
                    person,
                    person.max_contiguous_hours,
                    run.iter().map(|&t| tt.streams[t].id.as_str()).collect::<Vec<_>>()
                );
                let vars: Vec<_> = run.iter().map(|&t| self.vars.assignment(s, t)).collect();
                cuts.push(if vars.len() == 1 {
                    LazyCut::forbid(vars[0])
                } else {
                    let max_active = vars.len() - 1;
                    LazyCut::at_most(vars, max_active)
                });
            }
        }
        cuts
    }
}
