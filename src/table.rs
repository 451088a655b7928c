//! Streaming delimited table reader.

use crate::config::{ragged_row_policy, RaggedRowPolicy};
use crate::delimiter::Delimiter;
use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::{is_blank_line, SpanRecorder};
use csv::{StringRecord, Trim};
use std::io::{self, Read};
use thiserror::Error;

/// A data row: cells aligned to the header by position.
pub type Row = Vec<String>;

/// Errors that can occur while reading or querying a table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("Source '{source_id}' unavailable: {source}")]
    SourceUnavailable {
        source_id: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("Ragged row at line {line}: expected {expected} cells, found {found}")]
    RaggedRow {
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Invalid page request: {0}")]
    InvalidPage(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl TableError {
    /// Attribute an I/O failure to the source it came from.
    pub fn in_source(self, source_id: &str) -> Self {
        match self {
            TableError::Io(source) => TableError::SourceUnavailable {
                source_id: source_id.to_string(),
                source,
            },
            other => other,
        }
    }
}

impl From<csv::Error> for TableError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map_or(0, |p| p.line());
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => TableError::Io(e),
            _ => TableError::Parse { line, message },
        }
    }
}

pub type Result<T> = std::result::Result<T, TableError>;

/// A streaming reader over delimited rows.
///
/// The first non-blank record is the header; every later non-blank record
/// is a data row truncated or padded to the header width. A record is blank
/// when its raw text is only whitespace, so a quoted empty cell (`""`) is
/// a row. The record buffer is reused, so iteration holds one row at a time.
pub struct RowReader<R: Read> {
    reader: csv::Reader<SpanRecorder<R>>,
    record: StringRecord,
    line: u64,
    header: Option<Vec<String>>,
    policy: RaggedRowPolicy,
    rows_read: u64,
}

impl<R: Read> RowReader<R> {
    /// Create a new row reader from any readable source.
    pub fn new(reader: R, delimiter: Delimiter) -> Self {
        Self::with_capacity(reader, delimiter, DEFAULT_INPUT_BUFFER)
    }

    /// Create a row reader with custom buffer capacity.
    pub fn with_capacity(reader: R, delimiter: Delimiter, capacity: usize) -> Self {
        let reader = csv::ReaderBuilder::new()
            .delimiter(delimiter.as_byte())
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .buffer_capacity(capacity)
            .from_reader(SpanRecorder::new(reader));
        Self {
            reader,
            record: StringRecord::new(),
            line: 0,
            header: None,
            policy: ragged_row_policy(),
            rows_read: 0,
        }
    }

    /// Override the process-wide ragged row policy for this reader.
    pub fn with_ragged_policy(mut self, policy: RaggedRowPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Advance to the next non-blank record. Returns false at end of input.
    fn next_record(&mut self) -> Result<bool> {
        loop {
            if !self.reader.read_record(&mut self.record)? {
                return Ok(false);
            }
            let end = self.reader.position().byte();
            let (start, line) = self
                .record
                .position()
                .map_or((end, 0), |p| (p.byte(), p.line()));

            // The span starts before any empty lines csv skipped on the way
            let span = self.reader.get_ref().span(start, end);
            let blank = self.record.iter().all(str::is_empty) && is_blank_line(span);
            let lead = span.iter().take_while(|b| b.is_ascii_whitespace());
            self.line = line + lead.filter(|&&b| b == b'\n').count() as u64;

            self.reader.get_mut().release(end);
            if !blank {
                return Ok(true);
            }
        }
    }

    fn current_line(&self) -> u64 {
        self.line
    }

    /// Read the header row on first call; later calls return the cached row.
    ///
    /// An empty input has an empty header.
    pub fn header(&mut self) -> Result<&[String]> {
        if self.header.is_none() {
            let names = if self.next_record()? {
                self.record.iter().map(str::to_owned).collect()
            } else {
                Vec::new()
            };
            self.header = Some(names);
        }
        Ok(self.header.as_deref().unwrap_or_default())
    }

    /// Number of header columns (reads the header if needed).
    pub fn width(&mut self) -> Result<usize> {
        Ok(self.header()?.len())
    }

    /// Check the current record against the header width.
    fn check_width(&self, width: usize) -> Result<()> {
        let found = self.record.len();
        if found < width && self.policy == RaggedRowPolicy::Fail {
            return Err(TableError::RaggedRow {
                line: self.current_line(),
                expected: width,
                found,
            });
        }
        Ok(())
    }

    /// Read the next data row.
    pub fn read_row(&mut self) -> Result<Option<Row>> {
        let width = self.width()?;
        if !self.next_record()? {
            return Ok(None);
        }
        self.check_width(width)?;
        self.rows_read += 1;

        let mut row: Row = self.record.iter().take(width).map(str::to_owned).collect();
        row.resize(width, String::new());
        Ok(Some(row))
    }

    /// Advance past the next data row without materializing it.
    ///
    /// Applies the same ragged row policy as [`read_row`](Self::read_row).
    pub fn skip_row(&mut self) -> Result<bool> {
        let width = self.width()?;
        if !self.next_record()? {
            return Ok(false);
        }
        self.check_width(width)?;
        self.rows_read += 1;
        Ok(true)
    }

    /// Count the remaining data rows without retaining them.
    pub fn count_rows(mut self) -> Result<u64> {
        while self.skip_row()? {}
        Ok(self.rows_read)
    }

    /// Number of data rows read so far.
    pub fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Get an iterator over the remaining data rows.
    pub fn rows(self) -> RowIter<R> {
        RowIter {
            reader: self,
            done: false,
        }
    }
}

/// Iterator over data rows.
///
/// Stops after the first error.
pub struct RowIter<R: Read> {
    reader: RowReader<R>,
    done: bool,
}

impl<R: Read> Iterator for RowIter<R> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Read only the header row of a stream.
pub fn read_header<R: Read>(reader: R, delimiter: Delimiter) -> Result<Vec<String>> {
    let mut reader = RowReader::new(reader, delimiter);
    Ok(reader.header()?.to_vec())
}

/// Count the data rows of a stream (header excluded, blank lines skipped).
pub fn row_count<R: Read>(reader: R, delimiter: Delimiter) -> Result<u64> {
    let mut reader = RowReader::new(reader, delimiter);
    reader.header()?;
    reader.count_rows()
}

/// Lazily iterate the data rows of a stream.
pub fn rows<R: Read>(reader: R, delimiter: Delimiter) -> RowIter<R> {
    RowReader::new(reader, delimiter).rows()
}

/// Parse a whole table from a string (useful for testing).
pub fn parse_table(content: &str, delimiter: Delimiter) -> Result<(Vec<String>, Vec<Row>)> {
    let mut reader = RowReader::new(content.as_bytes(), delimiter);
    let header = reader.header()?.to_vec();
    let rows = reader.rows().collect::<Result<Vec<_>>>()?;
    Ok((header, rows))
}
