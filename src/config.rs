//! Run configuration defaults and parsing policy.
//!
//! All configuration is per invocation: commands carry their own settings
//! and nothing here is global or mutable, so concurrent runs never observe
//! each other's choices.

/// Largest distance (inclusive) a match may have to be reported.
pub const DEFAULT_MAX_DISTANCE: u64 = 10_000;

/// Maximum number of identifiers emitted by one run.
pub const DEFAULT_CAP: usize = 1_000;

/// 0-based column holding the gene id in reference records (the 7th column).
pub const DEFAULT_GENE_COLUMN: usize = 6;

/// How malformed input lines are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip the line, count it, keep going.
    #[default]
    Lenient,
    /// Fail the run on the first malformed line.
    Strict,
}

impl ParseMode {
    /// Strict when `strict` is set, lenient otherwise.
    #[inline]
    pub fn from_strict(strict: bool) -> Self {
        if strict {
            ParseMode::Strict
        } else {
            ParseMode::Lenient
        }
    }

    #[inline]
    pub fn is_strict(self) -> bool {
        self == ParseMode::Strict
    }
}
