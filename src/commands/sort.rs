//! Sort command implementation.
//!
//! Sort order (matches `LC_ALL=C sort -k1,1 -k2,2n -k3,3n`):
//! 1. Primary: chromosome (byte-lexicographic, so chr10 < chr2)
//! 2. Secondary: start coordinate (ascending, numeric)
//! 3. Tertiary: end coordinate (ascending, numeric)
//! 4. Ties: input order preserved (stable sort)

use crate::bed::{load_records, BedError};
use crate::config::ParseMode;
use crate::interval::IntervalRecord;
use crate::streaming::output::BedWriter;
use crate::streaming::validation::SortValidator;
use rayon::prelude::*;
use std::cmp::Ordering;
use std::io::{Read, Write};
use std::ops::Deref;
use tracing::info;

/// Minimum number of records before the parallel sort is used.
/// Below this threshold, sequential sorting is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Records in coordinate order.
///
/// Only produced by [`SortCommand::sort`] or by [`SortedSet::from_sorted`]
/// after validation, so holders can rely on the ordering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedSet(Vec<IntervalRecord>);

impl SortedSet {
    /// Empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap records that are expected to be sorted already.
    ///
    /// Returns [`BedError::InvalidFormat`] naming the first out-of-order
    /// record if they are not.
    pub fn from_sorted(records: Vec<IntervalRecord>) -> Result<Self, BedError> {
        let mut validator = SortValidator::new();
        for record in &records {
            validator.validate(record)?;
        }
        Ok(Self(records))
    }

    /// Unwrap into the underlying records.
    pub fn into_inner(self) -> Vec<IntervalRecord> {
        self.0
    }

    pub fn as_slice(&self) -> &[IntervalRecord] {
        &self.0
    }
}

impl Deref for SortedSet {
    type Target = [IntervalRecord];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Coordinate comparison used by every sort path.
#[inline]
pub fn compare_records(a: &IntervalRecord, b: &IntervalRecord) -> Ordering {
    a.chrom()
        .as_bytes()
        .cmp(b.chrom().as_bytes())
        .then_with(|| a.start().cmp(&b.start()))
        .then_with(|| a.end().cmp(&b.end()))
}

/// Sort command configuration.
#[derive(Debug, Clone, Default)]
pub struct SortCommand {
    /// Use rayon for inputs above [`PARALLEL_THRESHOLD`]
    pub parallel: bool,
}

impl SortCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sort records into coordinate order.
    ///
    /// Both paths are stable (`par_sort_by` is stable, `par_sort_unstable_by`
    /// is not), so the result does not depend on `parallel`.
    pub fn sort(&self, mut records: Vec<IntervalRecord>) -> SortedSet {
        if self.parallel && records.len() >= PARALLEL_THRESHOLD {
            records.par_sort_by(compare_records);
        } else {
            records.sort_by(compare_records);
        }
        SortedSet(records)
    }

    /// Sort a BED stream and write the records back verbatim.
    ///
    /// Returns the number of records written.
    pub fn run<R: Read, W: Write>(
        &self,
        input: R,
        output: &mut W,
        mode: ParseMode,
    ) -> Result<usize, BedError> {
        let loaded = load_records(input, mode, "input")?;
        let sorted = self.sort(loaded.records);

        let mut writer = BedWriter::new(output);
        for record in sorted.iter() {
            writer.write_record(record)?;
        }
        writer.flush()?;

        info!(
            records = sorted.len(),
            skipped = loaded.skipped,
            "sorted records"
        );
        Ok(sorted.len())
    }
}
