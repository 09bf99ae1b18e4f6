//! grit-nearest: nearest-gene lookup for genomic intervals
//!
//! For every query interval, find the closest gene interval on the same
//! chromosome, keep those within a distance limit, optionally translate the
//! gene id through a mapping table, and report each id once, up to a cap.
//!
//! # Features
//!
//! - **Linear sweep**: both inputs are sorted once, then walked forward together
//! - **Lazy output**: ids are produced as the sweep advances and the cap stops it
//! - **Lenient parsing**: malformed lines are skipped and counted, or rejected in strict mode
//!
//! # Example
//!
//! ```rust,no_run
//! use grit_nearest::commands::NearestCommand;
//!
//! let cmd = NearestCommand::new().with_max_distance(5_000).with_cap(100);
//!
//! let mut out = std::io::stdout();
//! let stats = cmd
//!     .run_files("peaks.bed", "genes.bed", Some("hgnc.tsv"), &mut out)
//!     .unwrap();
//! eprintln!("{}", stats);
//! ```

pub mod bed;
pub mod commands;
pub mod config;
pub mod interval;
pub mod mapping;
pub mod streaming;

// Re-export commonly used types
pub use bed::{parse_records, BedError, BedReader};
pub use interval::{Interval, IntervalRecord};
pub use mapping::MappingTable;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::bed::{load_records, parse_records, BedError, BedReader};
    pub use crate::commands::{
        pipeline, sweep, ClosestSweep, Match, NearestCommand, NearestStats, SortCommand,
        SortedSet,
    };
    pub use crate::config::ParseMode;
    pub use crate::interval::{Interval, IntervalRecord};
    pub use crate::mapping::MappingTable;
}
