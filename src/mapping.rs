//! Gene id mapping table parser.
//!
//! Parses two-column, tab-delimited tables (`raw_id\tdisplay_id`). The
//! first line is treated as a header when it begins with `name`
//! (case-insensitive). Later duplicates overwrite earlier entries.

use crate::bed::{BedError, Result};
use crate::config::ParseMode;
use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::parsing::split_two_columns;
use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use tracing::{debug, warn};

const HEADER_MARKER: &[u8] = b"name";

/// Immutable raw id -> display id lookup.
///
/// Built once before a run and only read afterwards, so one table can be
/// shared by reference between concurrent runs.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: FxHashMap<String, String>,
    skipped_lines: usize,
}

impl MappingTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a mapping table from a file, skipping malformed lines.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_reader(file, ParseMode::Lenient)
    }

    /// Load a mapping table from any readable source.
    ///
    /// Lines with fewer than two columns are skipped and counted in lenient
    /// mode, and fail the load with [`BedError::Mapping`] in strict mode.
    pub fn from_reader<R: Read>(reader: R, mode: ParseMode) -> Result<Self> {
        let mut reader = BufReader::with_capacity(DEFAULT_INPUT_BUFFER, reader);
        let mut table = Self::new();
        let mut buf = Vec::with_capacity(256);
        let mut line_number = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_number += 1;

            if line_number == 1 && is_header(&buf) {
                continue;
            }
            let line = buf.trim_ascii();

            match parse_entry(line, line_number) {
                Ok((raw, display)) => table.insert(raw, display),
                Err(e) if mode.is_strict() => return Err(e),
                Err(e) => {
                    debug!(error = %e, "skipping mapping line");
                    table.skipped_lines += 1;
                }
            }
        }

        if table.skipped_lines > 0 {
            warn!(
                skipped = table.skipped_lines,
                entries = table.len(),
                "skipped malformed mapping lines"
            );
        }

        Ok(table)
    }

    /// Resolve an id, falling back to the id itself when unmapped.
    #[inline]
    pub fn resolve<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).unwrap_or(id)
    }

    /// Get the display id for a raw id.
    #[inline]
    pub fn get(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(String::as_str)
    }

    /// Insert an entry, replacing any previous display id.
    pub fn insert(&mut self, raw: impl Into<String>, display: impl Into<String>) {
        self.entries.insert(raw.into(), display.into());
    }

    /// Number of lines skipped while loading.
    #[inline]
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Get number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MappingTable {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (raw, display) in iter {
            table.insert(raw, display);
        }
        table
    }
}

#[inline]
fn is_header(line: &[u8]) -> bool {
    line.len() >= HEADER_MARKER.len() && line[..HEADER_MARKER.len()].eq_ignore_ascii_case(HEADER_MARKER)
}

fn parse_entry(line: &[u8], line_number: usize) -> Result<(String, String)> {
    let (raw, display) = split_two_columns(line).ok_or_else(|| BedError::Mapping {
        line: line_number,
        message: "Expected two tab-delimited columns".to_string(),
    })?;

    let to_string = |bytes: &[u8]| {
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| BedError::Mapping {
                line: line_number,
                message: "Line is not valid UTF-8".to_string(),
            })
    };

    Ok((to_string(raw)?, to_string(display)?))
}
