//! Shared I/O utilities for the commands.
//!
//! - Allocation-light line helpers
//! - Sort validation
//! - Buffered output formatting

pub mod buffers;
pub mod output;
pub mod parsing;
pub mod validation;

pub use output::BedWriter;
pub use parsing::{parse_u64_fast, should_skip_line, split_two_columns};
pub use validation::SortValidator;
