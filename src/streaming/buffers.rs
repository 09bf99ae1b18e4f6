//! Buffer size constants for streaming I/O.

/// Default output buffer size (256 KB).
/// Output is one short id per line, so a smaller buffer than a BED
/// writer needs is plenty.
pub const DEFAULT_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input buffer size (256 KB).
/// Good balance for reading BED files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most BED lines.
pub const DEFAULT_LINE_BUFFER: usize = 1024;
