//! Buffered row output for query results.
//!
//! Uses itoa for count formatting to avoid allocation per line.
//! Cells are written verbatim: escaping for re-import is the job of
//! whatever consumes this output.

use crate::commands::QueryResult;
use crate::streaming::buffers::DEFAULT_OUTPUT_BUFFER;
use crate::table::TableError;
use std::io::{BufWriter, Write};

/// Row writer emitting one tab-separated line per row.
pub struct RowWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
}

impl<W: Write> RowWriter<W> {
    /// Create a new tab-separated RowWriter with the default buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_OUTPUT_BUFFER, output)
    }

    /// Create a new tab-separated RowWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
        }
    }

    /// Write a row of cells followed by newline.
    #[inline]
    pub fn write_row<S: AsRef<str>>(&mut self, cells: &[S]) -> Result<(), TableError> {
        for (i, cell) in cells.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b"\t")?;
            }
            self.writer.write_all(cell.as_ref().as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a bare line.
    #[inline]
    pub fn write_line(&mut self, line: &str) -> Result<(), TableError> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write an integer using itoa.
    #[inline]
    pub fn write_int<I: itoa::Integer>(&mut self, n: I) -> Result<(), TableError> {
        self.writer.write_all(self.itoa_buf.format(n).as_bytes())?;
        Ok(())
    }

    /// Write a count on its own line.
    #[inline]
    pub fn write_count(&mut self, n: u64) -> Result<(), TableError> {
        self.write_int(n)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Write a full query result: header, rows, then a `#` summary trailer.
    pub fn write_result(&mut self, result: &QueryResult) -> Result<(), TableError> {
        self.write_row(&result.columns)?;
        for row in &result.rows {
            self.write_row(row)?;
        }
        self.writer.write_all(b"# total=")?;
        self.write_int(result.total_filtered_rows)?;
        self.writer.write_all(b" page=")?;
        self.write_int(result.page)?;
        self.writer.write_all(b" page_size=")?;
        self.write_int(result.page_size)?;
        self.writer.write_all(b" pages=")?;
        self.write_int(result.total_pages)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Flush the output buffer.
    pub fn flush(&mut self) -> Result<(), TableError> {
        self.writer.flush()?;
        Ok(())
    }
}
