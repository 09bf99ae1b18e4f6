//! Streaming BED record parser.
//!
//! Parsing is permissive by default: a malformed line is reported as a
//! [`BedError::Parse`] by the reader, and [`load_records`] skips and counts
//! it instead of failing the whole run. [`ParseMode::Strict`] turns the
//! first malformed line into a hard error.

use crate::config::ParseMode;
use crate::interval::IntervalRecord;
use crate::streaming::buffers::{DEFAULT_INPUT_BUFFER, DEFAULT_LINE_BUFFER};
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, trim_line_end};
use std::io::{self, BufRead, BufReader, Read};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors that can occur while reading records or mapping tables.
#[derive(Error, Debug)]
pub enum BedError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Mapping error at line {line}: {message}")]
    Mapping { line: usize, message: String },

    #[error("Invalid BED format: {0}")]
    InvalidFormat(String),
}

impl BedError {
    /// True for per-line errors that lenient parsing may skip.
    #[inline]
    pub fn is_line_error(&self) -> bool {
        matches!(self, BedError::Parse { .. } | BedError::Mapping { .. })
    }
}

pub type Result<T> = std::result::Result<T, BedError>;

/// Parse one BED line into a record.
///
/// Requires at least three tab-delimited columns, non-negative integer
/// coordinates and `end > start`. Every column after the third is kept
/// verbatim. `line_number` is only used for error reporting.
pub fn parse_line(line: &str, line_number: usize) -> Result<IntervalRecord> {
    let mut columns = line.split('\t');
    let (chrom, start, end) = match (columns.next(), columns.next(), columns.next()) {
        (Some(chrom), Some(start), Some(end)) => (chrom, start, end),
        _ => {
            return Err(BedError::Parse {
                line: line_number,
                message: format!(
                    "Expected at least 3 fields, got {}",
                    line.split('\t').count()
                ),
            })
        }
    };

    if chrom.is_empty() {
        return Err(BedError::Parse {
            line: line_number,
            message: "Empty chromosome name".to_string(),
        });
    }

    let start = parse_position(start, "start", line_number)?;
    let end = parse_position(end, "end", line_number)?;

    if end <= start {
        return Err(BedError::Parse {
            line: line_number,
            message: format!("End ({}) must be greater than start ({})", end, start),
        });
    }

    Ok(IntervalRecord::with_fields(chrom, start, end, columns))
}

fn parse_position(s: &str, field_name: &str, line_number: usize) -> Result<u64> {
    parse_u64_fast(s.as_bytes()).ok_or_else(|| BedError::Parse {
        line: line_number,
        message: format!("Invalid {} position: '{}'", field_name, s),
    })
}

/// A streaming BED file reader.
pub struct BedReader<R: Read> {
    reader: BufReader<R>,
    line_number: usize,
    buffer: Vec<u8>,
}

impl<R: Read> BedReader<R> {
    /// Create a new BED reader from any readable source.
    pub fn new(reader: R) -> Self {
        Self::with_capacity(reader, DEFAULT_INPUT_BUFFER)
    }

    /// Create a BED reader with custom buffer capacity.
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
        }
    }

    /// Read the next BED record.
    ///
    /// Header, comment and blank lines are skipped silently. A malformed
    /// line yields `Err(BedError::Parse)`; the reader stays usable and the
    /// next call continues with the following line.
    pub fn read_record(&mut self) -> Result<Option<IntervalRecord>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = match std::str::from_utf8(&self.buffer) {
                Ok(line) => trim_line_end(line),
                Err(_) => {
                    return Err(BedError::Parse {
                        line: self.line_number,
                        message: "Line is not valid UTF-8".to_string(),
                    })
                }
            };

            if should_skip_line(line.as_bytes()) {
                continue;
            }

            return parse_line(line, self.line_number).map(Some);
        }
    }

    /// Get an iterator over all records.
    pub fn records(self) -> BedRecordIter<R> {
        BedRecordIter { reader: self }
    }
}

/// Iterator over BED records.
pub struct BedRecordIter<R: Read> {
    reader: BedReader<R>,
}

impl<R: Read> Iterator for BedRecordIter<R> {
    type Item = Result<IntervalRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}

/// Records read from one stream, with the count of lines that were skipped.
#[derive(Debug, Default, Clone)]
pub struct LoadedRecords {
    pub records: Vec<IntervalRecord>,
    pub skipped: usize,
}

/// Read every record from a stream under the given parse mode.
///
/// `label` names the stream in log messages ("query", "reference").
/// I/O errors always propagate.
pub fn load_records<R: Read>(reader: R, mode: ParseMode, label: &str) -> Result<LoadedRecords> {
    let mut loaded = LoadedRecords::default();

    for result in BedReader::new(reader).records() {
        match result {
            Ok(record) => loaded.records.push(record),
            Err(e) if e.is_line_error() && !mode.is_strict() => {
                debug!(stream = label, error = %e, "skipping malformed record");
                loaded.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if loaded.skipped > 0 {
        warn!(
            stream = label,
            skipped = loaded.skipped,
            kept = loaded.records.len(),
            "skipped malformed records"
        );
    }

    Ok(loaded)
}

/// Parse records from a string (useful for testing), skipping malformed lines.
pub fn parse_records(content: &str) -> Result<Vec<IntervalRecord>> {
    Ok(load_records(content.as_bytes(), ParseMode::Lenient, "string")?.records)
}
