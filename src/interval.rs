//! Core interval types for genomic region representation.

use std::cmp::Ordering;
use std::fmt;

/// A genomic interval with chromosome, start, and end positions.
/// Uses 0-based, half-open coordinates (BED format).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Interval {
    pub chrom: String,
    pub start: u64,
    pub end: u64,
}

impl Interval {
    /// Create a new interval.
    #[inline]
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            chrom: chrom.into(),
            start,
            end,
        }
    }
}

/// Gap between two half-open ranges on the same chromosome.
///
/// Never underflows: each subtraction is guarded by the comparison
/// that selects it.
#[inline]
pub(crate) fn gap(a_start: u64, a_end: u64, b_start: u64, b_end: u64) -> u64 {
    if b_start >= a_end {
        b_start - a_end
    } else if a_start >= b_end {
        a_start - b_end
    } else {
        0
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t{}", self.chrom, self.start, self.end)
    }
}

impl Ord for Interval {
    fn cmp(&self, other: &Self) -> Ordering {
        self.chrom
            .as_bytes()
            .cmp(other.chrom.as_bytes())
            .then(self.start.cmp(&other.start))
            .then(self.end.cmp(&other.end))
    }
}

impl PartialOrd for Interval {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A parsed BED line: the mandatory interval plus every remaining column.
///
/// `fields` holds columns 4.. verbatim and in order, so a column at a
/// fixed offset (such as a gene id) reads exactly what the file contained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntervalRecord {
    pub interval: Interval,
    pub fields: Vec<String>,
}

impl IntervalRecord {
    /// Create a BED3 record with no extra columns.
    pub fn new(chrom: impl Into<String>, start: u64, end: u64) -> Self {
        Self {
            interval: Interval::new(chrom, start, end),
            fields: Vec::new(),
        }
    }

    /// Create a record carrying extra columns.
    pub fn with_fields<I, S>(chrom: impl Into<String>, start: u64, end: u64, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            interval: Interval::new(chrom, start, end),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Get the chromosome.
    #[inline]
    pub fn chrom(&self) -> &str {
        &self.interval.chrom
    }

    /// Get the start position.
    #[inline]
    pub fn start(&self) -> u64 {
        self.interval.start
    }

    /// Get the end position.
    #[inline]
    pub fn end(&self) -> u64 {
        self.interval.end
    }

    /// Column at a 0-based position counted over the whole line.
    ///
    /// Columns 0-2 are the coordinates and are not stored as text, so they
    /// return `None`.
    #[inline]
    pub fn column(&self, index: usize) -> Option<&str> {
        index
            .checked_sub(3)
            .and_then(|i| self.fields.get(i))
            .map(String::as_str)
    }
}

impl fmt::Display for IntervalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.interval)?;
        for field in &self.fields {
            write!(f, "\t{}", field)?;
        }
        Ok(())
    }
}
