//! Buffered output for records and identifier lines.
//!
//! Uses itoa for coordinate formatting to avoid allocation per record.

use crate::bed::BedError;
use crate::interval::IntervalRecord;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use std::io::{BufWriter, Write};

/// Buffered line writer.
pub struct BedWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> BedWriter<W> {
    /// Create a new BedWriter with the default buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new BedWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a record with all of its columns, followed by newline.
    #[inline]
    pub fn write_record(&mut self, record: &IntervalRecord) -> Result<(), BedError> {
        self.writer.write_all(record.chrom().as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(record.start()).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(record.end()).as_bytes())?;
        for field in &record.fields {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(field.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a full line as-is with newline.
    #[inline]
    pub fn write_line(&mut self, line: &[u8]) -> Result<(), BedError> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), BedError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_record() {
        let mut output = Vec::new();
        {
            let mut writer = BedWriter::new(&mut output);
            writer
                .write_record(&IntervalRecord::with_fields("chr1", 100, 200, ["a", "", "+"]))
                .unwrap();
            writer.write_record(&IntervalRecord::new("chr2", 0, 1)).unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"chr1\t100\t200\ta\t\t+\nchr2\t0\t1\n");
    }

    #[test]
    fn test_write_line() {
        let mut output = Vec::new();
        {
            let mut writer = BedWriter::new(&mut output);
            writer.write_line(b"GENE1").unwrap();
            writer.write_line(b"HGNC:2").unwrap();
            writer.flush().unwrap();
        }
        assert_eq!(output, b"GENE1\nHGNC:2\n");
    }
}
