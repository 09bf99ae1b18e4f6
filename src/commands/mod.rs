//! Command implementations for grit-nearest.

pub mod closest;
pub mod nearest;
pub mod sort;

pub use crate::streaming::SortValidator;
pub use closest::{sweep, ClosestStats, ClosestSweep, Match};
pub use nearest::{pipeline, NearestCommand, NearestGenes, NearestStats, PipelineStats, PreparedInputs};
pub use sort::{compare_records, SortCommand, SortedSet};
