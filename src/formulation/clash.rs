//! Pairwise stream clash table.

use crate::models::SessionStream;

/// Dense `n × n` clash matrix over session streams.
///
/// `clashes(a, b)` holds iff the streams share a day, their timeslots
/// overlap, and their week sets intersect. The diagonal is set for every
/// stream that runs in at least one week.
#[derive(Debug, Clone)]
pub struct ClashIndex {
    n: usize,
    table: Vec<bool>,
}

impl ClashIndex {
    /// Computes the table in `O(n²)`.
    pub fn new(streams: &[SessionStream]) -> Self {
        let n = streams.len();
        let mut table = vec![false; n * n];
        for a in 0..n {
            for b in a..n {
                let clash = streams[a].clashes_with(&streams[b]);
                table[a * n + b] = clash;
                table[b * n + a] = clash;
            }
        }
        Self { n, table }
    }

    /// Whether streams `a` and `b` clash.
    #[inline]
    pub fn clashes(&self, a: usize, b: usize) -> bool {
        self.table[a * self.n + b]
    }

    /// Unordered clashing pairs `(a, b)` with `a < b`.
    pub fn clashing_pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.n).flat_map(move |a| {
            (a + 1..self.n)
                .filter(move |&b| self.clashes(a, b))
                .map(move |b| (a, b))
        })
    }

    /// Number of streams indexed.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }
}
