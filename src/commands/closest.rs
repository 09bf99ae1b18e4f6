//! Closest sweep - find the nearest reference interval for each query.
//!
//! Both inputs are [`SortedSet`]s, so one forward pass over each is enough.
//! The sweep is an iterator: matches are produced only when pulled, and
//! dropping it early releases everything it holds.
//!
//! # Distance
//!
//! - Overlap: distance = 0
//! - Upstream (R.end <= Q.start): distance = Q.start - R.end
//! - Downstream (R.start >= Q.end): distance = R.start - Q.end
//!
//! # Ties
//!
//! Among references at the minimum distance the one with the lowest sorted
//! position wins (bedtools `-t first`).
//!
//! # State per chromosome
//!
//! - `cursor`: first reference not yet admitted. Only moves forward.
//! - `active`: admitted references whose end is still past the current
//!   query start. Kept in sorted order behind a head index and compacted
//!   lazily. References that start at or after the query end (admitted by
//!   an earlier, longer query) stay at the back of the window.
//! - `upstream`: the best retired reference. A reference retires once its
//!   end is at or before the current query start, wherever it sits in the
//!   window; since query starts never decrease, its distance to every later
//!   query is `Q.start - R.end`, so only the one with the largest end
//!   (lowest position on ties) can ever win again.
//!
//! Each reference is admitted and retired at most once. Per query only the
//! window entries overlapping the query are visited, giving O(n + m + k)
//! work where k is the total number of (query, overlapping reference) pairs.

use crate::commands::sort::SortedSet;
use crate::interval::{gap, IntervalRecord};
use tracing::trace;

/// Active set compaction threshold.
const COMPACT_THRESHOLD: usize = 4096;

/// The nearest reference for one query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub query: &'a IntervalRecord,
    /// `None` when no reference shares the query's chromosome.
    pub nearest: Option<&'a IntervalRecord>,
    /// `None` exactly when `nearest` is `None` (unbounded distance).
    pub distance: Option<u64>,
}

impl Match<'_> {
    /// True if a reference was found on the query's chromosome.
    #[inline]
    pub fn is_found(&self) -> bool {
        self.nearest.is_some()
    }

    /// True if found and no farther than `max_distance` (inclusive).
    #[inline]
    pub fn within(&self, max_distance: u64) -> bool {
        self.distance.is_some_and(|d| d <= max_distance)
    }
}

/// Statistics from a sweep.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClosestStats {
    pub queries: usize,
    pub found: usize,
    pub references_consumed: usize,
    pub max_active: usize,
}

impl std::fmt::Display for ClosestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queries: {}, Found: {}, References consumed: {}, Max active: {}",
            self.queries, self.found, self.references_consumed, self.max_active
        )
    }
}

/// Lazy nearest-feature sweep over two sorted record sets.
#[derive(Debug)]
pub struct ClosestSweep<'a> {
    queries: std::slice::Iter<'a, IntervalRecord>,
    references: &'a [IntervalRecord],
    chrom: Option<&'a str>,
    cursor: usize,
    active: Vec<usize>,
    head: usize,
    /// (position, end) of the best retired reference
    upstream: Option<(usize, u64)>,
    stats: ClosestStats,
}

/// Start a sweep of `queries` against `references`.
pub fn sweep<'a>(queries: &'a SortedSet, references: &'a SortedSet) -> ClosestSweep<'a> {
    ClosestSweep::new(queries, references)
}

impl<'a> ClosestSweep<'a> {
    pub fn new(queries: &'a SortedSet, references: &'a SortedSet) -> Self {
        Self {
            queries: queries.as_slice().iter(),
            references: references.as_slice(),
            chrom: None,
            cursor: 0,
            active: Vec::with_capacity(64),
            head: 0,
            upstream: None,
            stats: ClosestStats::default(),
        }
    }

    /// Statistics for the queries processed so far.
    pub fn stats(&self) -> ClosestStats {
        self.stats
    }

    /// Reset per-chromosome state and skip references on earlier chromosomes.
    fn enter_chromosome(&mut self, chrom: &'a str) {
        trace!(chrom, cursor = self.cursor, "sweep entering chromosome");
        self.chrom = Some(chrom);
        self.active.clear();
        self.head = 0;
        self.upstream = None;

        while let Some(r) = self.references.get(self.cursor) {
            if r.chrom().as_bytes() >= chrom.as_bytes() {
                break;
            }
            self.cursor += 1;
            self.stats.references_consumed += 1;
        }
    }

    /// Fold a reference into the upstream tracker.
    #[inline]
    fn retire(&mut self, pos: usize) {
        let end = self.references[pos].end();
        match self.upstream {
            Some((best_pos, best_end)) if best_end > end || (best_end == end && best_pos < pos) => {}
            _ => self.upstream = Some((pos, end)),
        }
    }

    fn closest(&mut self, query: &'a IntervalRecord, chrom: &str) -> Option<(usize, u64)> {
        let (q_start, q_end) = (query.start(), query.end());
        let refs = self.references;

        // Admit every reference that starts before this query ends
        while let Some(r) = refs.get(self.cursor) {
            if r.chrom() != chrom || r.start() >= q_end {
                break;
            }
            if r.end() <= q_start {
                self.retire(self.cursor);
            } else {
                self.active.push(self.cursor);
            }
            self.cursor += 1;
            self.stats.references_consumed += 1;
        }

        // Window entries from `split` on start at or after the query end
        let split = self.active[self.head..]
            .iter()
            .position(|&pos| refs[pos].start() >= q_end)
            .map_or(self.active.len(), |offset| self.head + offset);

        // Retire finished entries before `split`, packing survivors against it
        let mut write = split;
        for read in (self.head..split).rev() {
            let pos = self.active[read];
            if refs[pos].end() <= q_start {
                self.retire(pos);
            } else {
                write -= 1;
                self.active[write] = pos;
            }
        }
        self.head = write;

        // Window positions are increasing, so the first overlap and the
        // first downstream entry are the lowest positions of their kind
        let upstream = self
            .upstream
            .map(|(pos, _)| (gap(q_start, q_end, refs[pos].start(), refs[pos].end()), pos));
        let overlapping = (self.head < split).then(|| (0, self.active[self.head]));
        let downstream = match self.active.get(split) {
            Some(&pos) => Some(pos),
            None => refs
                .get(self.cursor)
                .filter(|r| r.chrom() == chrom)
                .map(|_| self.cursor),
        }
        .map(|pos| (refs[pos].start() - q_end, pos));

        self.stats.max_active = self.stats.max_active.max(self.active.len() - self.head);
        if self.head > COMPACT_THRESHOLD && self.head * 2 > self.active.len() {
            self.active.drain(..self.head);
            self.head = 0;
        }

        // (distance, position); lexicographic min gives the "first" tie-break
        [upstream, overlapping, downstream]
            .into_iter()
            .flatten()
            .min()
            .map(|(distance, pos)| (pos, distance))
    }
}

impl<'a> Iterator for ClosestSweep<'a> {
    type Item = Match<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let query = self.queries.next()?;
        self.stats.queries += 1;

        let chrom = query.chrom();
        if self.chrom != Some(chrom) {
            self.enter_chromosome(chrom);
        }

        let found = self.closest(query, chrom);
        if found.is_some() {
            self.stats.found += 1;
        }

        Some(Match {
            query,
            nearest: found.map(|(pos, _)| &self.references[pos]),
            distance: found.map(|(_, distance)| distance),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.queries.size_hint()
    }
}

impl ExactSizeIterator for ClosestSweep<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sort::SortCommand;

    fn set(records: &[(&str, u64, u64)]) -> SortedSet {
        SortCommand::new().sort(
            records
                .iter()
                .map(|&(c, s, e)| IntervalRecord::new(c, s, e))
                .collect(),
        )
    }

    fn named(records: &[(&str, u64, u64, &str)]) -> SortedSet {
        SortCommand::new().sort(
            records
                .iter()
                .map(|&(c, s, e, n)| IntervalRecord::with_fields(c, s, e, [n]))
                .collect(),
        )
    }

    fn nearest_names(queries: &SortedSet, refs: &SortedSet) -> Vec<Option<(String, u64)>> {
        sweep(queries, refs)
            .map(|m| {
                m.nearest
                    .map(|r| (r.fields[0].clone(), m.distance.unwrap()))
            })
            .collect()
    }

    #[test]
    fn test_basic_closest_downstream() {
        let q = set(&[("chr1", 100, 200)]);
        let r = named(&[("chr1", 500, 600, "GENE1")]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("GENE1".into(), 300))]);
    }

    #[test]
    fn test_basic_closest_upstream() {
        let q = set(&[("chr1", 300, 400)]);
        let r = named(&[("chr1", 100, 200, "up")]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("up".into(), 100))]);
    }

    #[test]
    fn test_closest_overlap() {
        let q = set(&[("chr1", 100, 200)]);
        let r = named(&[("chr1", 50, 60, "far"), ("chr1", 150, 250, "hit")]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("hit".into(), 0))]);
    }

    #[test]
    fn test_bookended_is_zero() {
        let q = set(&[("chr1", 100, 200)]);
        let r = named(&[("chr1", 200, 300, "next")]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("next".into(), 0))]);
    }

    #[test]
    fn test_tie_prefers_first_sorted() {
        // upstream and downstream both 50 away: upstream sorts first
        let q = set(&[("chr1", 200, 300)]);
        let r = named(&[("chr1", 350, 400, "down"), ("chr1", 100, 150, "up")]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("up".into(), 50))]);
    }

    #[test]
    fn test_tie_among_overlaps_prefers_first_sorted() {
        let q = set(&[("chr1", 100, 500)]);
        let r = named(&[
            ("chr1", 300, 350, "b"),
            ("chr1", 90, 110, "a"),
            ("chr1", 400, 450, "c"),
        ]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("a".into(), 0))]);
    }

    #[test]
    fn test_identical_references_keep_input_order() {
        let q = set(&[("chr1", 0, 10)]);
        let r = named(&[("chr1", 20, 30, "first"), ("chr1", 20, 30, "second")]);

        for _ in 0..3 {
            assert_eq!(nearest_names(&q, &r), vec![Some(("first".into(), 10))]);
        }
    }

    #[test]
    fn test_nested_query_sees_reference_behind_cursor() {
        // Q1 admits B1; Q2 sits inside Q1 and B1 is now downstream of it
        let q = set(&[("chr1", 100, 200), ("chr1", 120, 150)]);
        let r = named(&[("chr1", 180, 300, "b1"), ("chr1", 400, 500, "b2")]);

        assert_eq!(
            nearest_names(&q, &r),
            vec![Some(("b1".into(), 0)), Some(("b1".into(), 30))]
        );
    }

    #[test]
    fn test_retired_reference_still_wins_later() {
        let q = set(&[("chr1", 100, 110), ("chr1", 300, 310)]);
        let r = named(&[("chr1", 50, 250, "long"), ("chr1", 600, 700, "far")]);

        assert_eq!(
            nearest_names(&q, &r),
            vec![Some(("long".into(), 0)), Some(("long".into(), 50))]
        );
    }

    #[test]
    fn test_upstream_with_larger_end_wins() {
        let q = set(&[("chr1", 1000, 1010)]);
        let r = named(&[
            ("chr1", 10, 900, "wide"),
            ("chr1", 500, 600, "narrow"),
        ]);

        assert_eq!(nearest_names(&q, &r), vec![Some(("wide".into(), 100))]);
    }

    #[test]
    fn test_no_reference_on_chromosome() {
        let q = set(&[("chr2", 100, 200)]);
        let r = named(&[("chr1", 100, 200, "x"), ("chr3", 100, 200, "y")]);

        let matches: Vec<_> = sweep(&q, &r).collect();
        assert_eq!(matches.len(), 1);
        assert!(!matches[0].is_found());
        assert_eq!(matches[0].distance, None);
        assert!(!matches[0].within(u64::MAX));
    }

    #[test]
    fn test_multiple_chromosomes_lexicographic() {
        let q = set(&[("chr10", 100, 200), ("chr2", 100, 200), ("chr1", 100, 200)]);
        let r = named(&[
            ("chr2", 250, 260, "two"),
            ("chr1", 10, 20, "one"),
            ("chr10", 300, 310, "ten"),
        ]);

        assert_eq!(
            nearest_names(&q, &r),
            vec![
                Some(("one".into(), 80)),
                Some(("ten".into(), 100)),
                Some(("two".into(), 50)),
            ]
        );
    }

    #[test]
    fn test_empty_reference_set() {
        let q = set(&[("chr1", 100, 200), ("chr2", 1, 2)]);
        let r = SortedSet::new();

        let matches: Vec<_> = sweep(&q, &r).collect();
        assert_eq!(matches.len(), 2);
        assert!(matches.iter().all(|m| m.nearest.is_none()));
    }

    #[test]
    fn test_empty_query_set() {
        let q = SortedSet::new();
        let r = named(&[("chr1", 1, 2, "x")]);

        assert_eq!(sweep(&q, &r).count(), 0);
    }

    #[test]
    fn test_single_base_intervals() {
        let q = set(&[("chr1", 0, 1), ("chr1", 5, 6)]);
        let r = named(&[("chr1", 1, 2, "adj"), ("chr1", 9, 10, "far")]);

        assert_eq!(
            nearest_names(&q, &r),
            vec![Some(("adj".into(), 0)), Some(("adj".into(), 3))]
        );
    }

    #[test]
    fn test_one_match_per_query_in_order() {
        let q = set(&[("chr1", 1, 2), ("chr1", 1, 2), ("chr1", 50, 60)]);
        let r = named(&[("chr1", 10, 20, "x")]);

        let mut it = sweep(&q, &r);
        assert_eq!(it.len(), 3);
        let starts: Vec<_> = it.by_ref().map(|m| m.query.start()).collect();
        assert_eq!(starts, vec![1, 1, 50]);
        assert_eq!(it.stats().queries, 3);
        assert_eq!(it.stats().found, 3);
    }

    #[test]
    fn test_window_stays_small_under_long_reference() {
        // One gene spanning many short genes, queries inside each short gene
        let n = 5_000u64;
        let mut refs = vec![IntervalRecord::with_fields("chr1", 0, 10 * n + 100, ["long"])];
        refs.extend((0..n).map(|i| {
            IntervalRecord::with_fields("chr1", 10 * i + 1, 10 * i + 8, [format!("s{i}")])
        }));
        let r = SortCommand::new().sort(refs);
        let q = SortCommand::new().sort(
            (0..n)
                .map(|i| IntervalRecord::new("chr1", 10 * i + 5, 10 * i + 6))
                .collect(),
        );

        let mut it = sweep(&q, &r);
        let names: Vec<_> = it
            .by_ref()
            .map(|m| m.nearest.map(|r| r.fields[0].clone()))
            .collect();

        assert_eq!(names.len(), n as usize);
        assert!(names.iter().all(|name| name.as_deref() == Some("long")));
        assert_eq!(it.stats().max_active, 2);
    }

    #[test]
    fn test_finished_reference_behind_long_one_still_wins_upstream() {
        let q = set(&[("chr1", 100, 110), ("chr1", 300, 310)]);
        let r = named(&[
            ("chr1", 0, 120, "long"),
            ("chr1", 50, 105, "short"),
            ("chr1", 500, 600, "far"),
        ]);

        assert_eq!(
            nearest_names(&q, &r),
            vec![Some(("long".into(), 0)), Some(("long".into(), 180))]
        );
    }

    #[test]
    fn test_dropping_early_consumes_lazily() {
        let q = set(&[("chr1", 1, 2), ("chr2", 1, 2), ("chr3", 1, 2)]);
        let r = named(&[("chr1", 5, 6, "a"), ("chr2", 5, 6, "b"), ("chr3", 5, 6, "c")]);

        let mut it = sweep(&q, &r);
        assert!(it.next().is_some());
        assert_eq!(it.stats().queries, 1);
        assert!(it.stats().references_consumed <= 1);
    }
}
