//! Sort validation for records that claim to be sorted already.
//!
//! The sweep relies on both inputs being in coordinate order. Callers that
//! skip sorting (`--assume-sorted`) have their input checked here instead,
//! record by record, so an unsorted file fails loudly rather than
//! producing wrong matches.

use crate::bed::BedError;
use crate::interval::IntervalRecord;
use std::cmp::Ordering;

/// Inline sort validator.
///
/// Validates that consecutive records are non-decreasing by
/// (chromosome bytes, start, end). Byte order on the chromosome name also
/// implies that each chromosome's records are contiguous.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev: Option<(String, u64, u64)>,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(&mut self, record: &IntervalRecord) -> Result<(), BedError> {
        self.record_count += 1;
        let (chrom, start, end) = (record.chrom(), record.start(), record.end());

        match &mut self.prev {
            Some((prev_chrom, prev_start, prev_end)) => {
                let order = prev_chrom
                    .as_bytes()
                    .cmp(chrom.as_bytes())
                    .then((*prev_start).cmp(&start))
                    .then((*prev_end).cmp(&end));

                if order == Ordering::Greater {
                    return Err(BedError::InvalidFormat(format!(
                        "Input not sorted: {}:{}-{} at record {} comes after {}:{}-{}",
                        chrom, start, end, self.record_count, prev_chrom, prev_start, prev_end
                    )));
                }

                if prev_chrom.as_str() != chrom {
                    *prev_chrom = chrom.to_string();
                }
                *prev_start = start;
                *prev_end = end;
            }
            None => self.prev = Some((chrom.to_string(), start, end)),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(chrom: &str, start: u64, end: u64) -> IntervalRecord {
        IntervalRecord::new(chrom, start, end)
    }

    #[test]
    fn test_sorted_sequence_passes() {
        let mut v = SortValidator::new();
        for r in [
            rec("chr1", 100, 200),
            rec("chr1", 100, 200),
            rec("chr1", 100, 300),
            rec("chr10", 5, 10),
            rec("chr2", 1, 2),
        ] {
            v.validate(&r).unwrap();
        }
    }

    #[test]
    fn test_position_regression_fails() {
        let mut v = SortValidator::new();
        v.validate(&rec("chr1", 200, 300)).unwrap();
        let err = v.validate(&rec("chr1", 100, 150)).unwrap_err();
        assert!(err.to_string().contains("record 2"));
    }

    #[test]
    fn test_end_regression_fails() {
        let mut v = SortValidator::new();
        v.validate(&rec("chr1", 100, 300)).unwrap();
        assert!(v.validate(&rec("chr1", 100, 200)).is_err());
    }

    #[test]
    fn test_natural_chrom_order_fails() {
        // chr2 before chr10 is natural order, not byte order
        let mut v = SortValidator::new();
        v.validate(&rec("chr2", 1, 2)).unwrap();
        assert!(v.validate(&rec("chr10", 1, 2)).is_err());
    }

    #[test]
    fn test_interleaved_chromosomes_fail() {
        let mut v = SortValidator::new();
        v.validate(&rec("chr1", 1, 2)).unwrap();
        v.validate(&rec("chr2", 1, 2)).unwrap();
        assert!(v.validate(&rec("chr1", 5, 6)).is_err());
    }
}
