//! Nearest-gene command: parse, sort, sweep, then filter/remap/dedup/cap.
//!
//! The result pipeline ([`NearestGenes`]) is an iterator over the sweep's
//! matches. It pulls one match at a time, so the first id can be written
//! before the sweep has seen the last query, and reaching the cap stops
//! the sweep without touching the remaining queries.

use crate::bed::{load_records, BedError, LoadedRecords};
use crate::commands::closest::{ClosestStats, ClosestSweep, Match};
use crate::commands::sort::{SortCommand, SortedSet};
use crate::config::{ParseMode, DEFAULT_CAP, DEFAULT_GENE_COLUMN, DEFAULT_MAX_DISTANCE};
use crate::mapping::MappingTable;
use crate::streaming::output::BedWriter;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::{debug, info};

/// Dedup set and emit counter for one pipeline run.
///
/// Ids borrow from the reference records or the mapping table, both of
/// which outlive the run.
#[derive(Debug, Default)]
struct OutputState<'a> {
    seen: FxHashSet<&'a str>,
    emitted: usize,
}

/// Counters for why matches were or were not emitted.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PipelineStats {
    pub matches: usize,
    pub no_nearest: usize,
    pub too_far: usize,
    pub missing_id: usize,
    pub duplicates: usize,
    pub emitted: usize,
    /// The cap ended the run
    pub capped: bool,
}

/// Lazy filter/remap/dedup/cap over sweep matches.
pub struct NearestGenes<'a, I> {
    matches: I,
    max_distance: u64,
    mapping: Option<&'a MappingTable>,
    cap: usize,
    gene_column: usize,
    state: OutputState<'a>,
    stats: PipelineStats,
}

/// Build the result pipeline over a match sequence.
pub fn pipeline<'a, I>(
    matches: I,
    max_distance: u64,
    mapping: Option<&'a MappingTable>,
    cap: usize,
) -> NearestGenes<'a, I>
where
    I: Iterator<Item = Match<'a>>,
{
    NearestGenes::new(matches, max_distance, mapping, cap)
}

impl<'a, I> NearestGenes<'a, I>
where
    I: Iterator<Item = Match<'a>>,
{
    pub fn new(
        matches: I,
        max_distance: u64,
        mapping: Option<&'a MappingTable>,
        cap: usize,
    ) -> Self {
        Self {
            matches,
            max_distance,
            mapping,
            cap,
            gene_column: DEFAULT_GENE_COLUMN,
            state: OutputState::default(),
            stats: PipelineStats::default(),
        }
    }

    /// Read the gene id from a different 0-based column.
    pub fn with_gene_column(mut self, column: usize) -> Self {
        self.gene_column = column;
        self
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }
}

impl<'a, I> Iterator for NearestGenes<'a, I>
where
    I: Iterator<Item = Match<'a>>,
{
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.state.emitted >= self.cap {
                self.stats.capped = true;
                return None;
            }

            let m = self.matches.next()?;
            self.stats.matches += 1;

            let nearest = match m.nearest {
                Some(nearest) if m.within(self.max_distance) => nearest,
                Some(_) => {
                    self.stats.too_far += 1;
                    continue;
                }
                None => {
                    self.stats.no_nearest += 1;
                    continue;
                }
            };

            let raw = match nearest.column(self.gene_column) {
                Some(raw) if !raw.is_empty() => raw,
                _ => {
                    debug!(reference = %nearest.interval, "nearest reference has no gene id");
                    self.stats.missing_id += 1;
                    continue;
                }
            };

            let id = match self.mapping {
                Some(mapping) => mapping.resolve(raw),
                None => raw,
            };

            if !self.state.seen.insert(id) {
                self.stats.duplicates += 1;
                continue;
            }

            self.state.emitted += 1;
            self.stats.emitted += 1;
            return Some(id.to_string());
        }
    }
}

/// Query and reference records, parsed and sorted.
#[derive(Debug, Default, Clone)]
pub struct PreparedInputs {
    pub queries: SortedSet,
    pub references: SortedSet,
    pub query_skipped: usize,
    pub reference_skipped: usize,
}

impl PreparedInputs {
    /// Start the sweep over these inputs.
    pub fn sweep(&self) -> ClosestSweep<'_> {
        ClosestSweep::new(&self.queries, &self.references)
    }
}

/// Statistics from a nearest-gene run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestStats {
    pub query_records: usize,
    pub reference_records: usize,
    pub query_skipped: usize,
    pub reference_skipped: usize,
    pub mapping_entries: usize,
    pub mapping_skipped: usize,
    pub sweep: ClosestStats,
    pub pipeline: PipelineStats,
}

impl std::fmt::Display for NearestStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Queries: {} ({} skipped), References: {} ({} skipped), Mapping entries: {} ({} skipped), \
             Matches: {}, No nearest: {}, Too far: {}, Missing id: {}, Duplicates: {}, \
             Emitted: {}{}",
            self.query_records,
            self.query_skipped,
            self.reference_records,
            self.reference_skipped,
            self.mapping_entries,
            self.mapping_skipped,
            self.pipeline.matches,
            self.pipeline.no_nearest,
            self.pipeline.too_far,
            self.pipeline.missing_id,
            self.pipeline.duplicates,
            self.pipeline.emitted,
            if self.pipeline.capped { " (capped)" } else { "" }
        )
    }
}

/// Nearest-gene command configuration.
#[derive(Debug, Clone)]
pub struct NearestCommand {
    /// Largest reported distance (inclusive)
    pub max_distance: u64,
    /// Maximum number of ids written
    pub cap: usize,
    /// 0-based column of the gene id in reference records
    pub gene_column: usize,
    /// How malformed lines are handled
    pub parse_mode: ParseMode,
    /// Validate instead of sorting (input must already be sorted)
    pub assume_sorted: bool,
    /// Allow rayon for sorting large inputs
    pub parallel_sort: bool,
}

impl Default for NearestCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl NearestCommand {
    pub fn new() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
            cap: DEFAULT_CAP,
            gene_column: DEFAULT_GENE_COLUMN,
            parse_mode: ParseMode::Lenient,
            assume_sorted: false,
            parallel_sort: false,
        }
    }

    pub fn with_max_distance(mut self, max_distance: u64) -> Self {
        self.max_distance = max_distance;
        self
    }

    pub fn with_cap(mut self, cap: usize) -> Self {
        self.cap = cap;
        self
    }

    pub fn with_gene_column(mut self, column: usize) -> Self {
        self.gene_column = column;
        self
    }

    pub fn with_parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = mode;
        self
    }

    /// Parse and order one stream.
    fn order(&self, loaded: LoadedRecords, label: &str) -> Result<SortedSet, BedError> {
        if self.assume_sorted {
            SortedSet::from_sorted(loaded.records).map_err(|e| match e {
                BedError::InvalidFormat(msg) => {
                    BedError::InvalidFormat(format!("{} input: {}", label, msg))
                }
                other => other,
            })
        } else {
            let sorter = SortCommand {
                parallel: self.parallel_sort,
            };
            Ok(sorter.sort(loaded.records))
        }
    }

    /// Parse and sort both inputs.
    pub fn prepare<Q: Read, R: Read>(
        &self,
        query: Q,
        reference: R,
    ) -> Result<PreparedInputs, BedError> {
        let queries = load_records(query, self.parse_mode, "query")?;
        let references = load_records(reference, self.parse_mode, "reference")?;
        let (query_skipped, reference_skipped) = (queries.skipped, references.skipped);

        Ok(PreparedInputs {
            queries: self.order(queries, "query")?,
            references: self.order(references, "reference")?,
            query_skipped,
            reference_skipped,
        })
    }

    /// Wrap a match sequence in this command's pipeline settings.
    pub fn pipeline<'a, I>(
        &self,
        matches: I,
        mapping: Option<&'a MappingTable>,
    ) -> NearestGenes<'a, I>
    where
        I: Iterator<Item = Match<'a>>,
    {
        NearestGenes::new(matches, self.max_distance, mapping, self.cap)
            .with_gene_column(self.gene_column)
    }

    /// Run on two BED streams and write one id per line to `output`.
    pub fn run<Q: Read, R: Read, W: Write>(
        &self,
        query: Q,
        reference: R,
        mapping: Option<&MappingTable>,
        output: &mut W,
    ) -> Result<NearestStats, BedError> {
        let inputs = self.prepare(query, reference)?;
        let mut sweep = inputs.sweep();
        let mut writer = BedWriter::new(output);

        let mut ids = self.pipeline(sweep.by_ref(), mapping);
        for id in ids.by_ref() {
            writer.write_line(id.as_bytes())?;
        }
        let pipeline = ids.stats();
        writer.flush()?;

        let stats = NearestStats {
            query_records: inputs.queries.len(),
            reference_records: inputs.references.len(),
            query_skipped: inputs.query_skipped,
            reference_skipped: inputs.reference_skipped,
            mapping_entries: mapping.map_or(0, MappingTable::len),
            mapping_skipped: mapping.map_or(0, MappingTable::skipped_lines),
            sweep: sweep.stats(),
            pipeline,
        };
        info!(%stats, "nearest run complete");
        Ok(stats)
    }

    /// Run on files, with an optional mapping table file.
    pub fn run_files<P: AsRef<Path>, W: Write>(
        &self,
        query_path: P,
        reference_path: P,
        mapping_path: Option<P>,
        output: &mut W,
    ) -> Result<NearestStats, BedError> {
        let query = File::open(query_path.as_ref())?;
        let reference = File::open(reference_path.as_ref())?;
        let mapping = mapping_path
            .map(|p| File::open(p.as_ref()).map_err(BedError::from))
            .transpose()?
            .map(|file| MappingTable::from_reader(file, self.parse_mode))
            .transpose()?;

        self.run(query, reference, mapping.as_ref(), output)
    }
}
