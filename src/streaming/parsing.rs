//! Byte-level line utilities used before a delimiter is known.
//!
//! Delimiter detection runs on raw lines rather than parsed records:
//! every candidate delimiter and the quote character are ASCII, so scanning
//! bytes is exact for UTF-8 input and never fails on decoding.
//! [`SpanRecorder`] keeps the raw bytes behind parsed records so the row
//! reader can tell a blank line from a quoted empty cell.

use crate::streaming::buffers::DEFAULT_LINE_BUFFER;
use memchr::{memchr2, memchr2_iter};
use std::io::{self, BufRead, Read};

/// Count occurrences of `delimiter` outside double-quoted spans.
///
/// Every `"` toggles the in-quotes state, so `"a,b",c,d` has two
/// countable commas.
///
/// # Performance
///
/// Uses memchr2 to jump straight between quote and delimiter bytes.
#[inline]
pub fn count_unquoted(line: &[u8], delimiter: u8) -> usize {
    let mut count = 0;
    let mut in_quotes = false;
    for pos in memchr2_iter(b'"', delimiter, line) {
        if line[pos] == b'"' {
            in_quotes = !in_quotes;
        } else if !in_quotes {
            count += 1;
        }
    }
    count
}

/// Check if a line holds nothing but whitespace and control bytes.
#[inline(always)]
pub fn is_blank_line(line: &[u8]) -> bool {
    line.iter().all(|&b| b <= b' ')
}

/// Reads up to a fixed number of non-blank lines from a stream.
///
/// `\n`, `\r\n` and a lone `\r` all end a line. The line buffer is
/// reused between calls, so sampling allocates once.
pub struct LineSampler<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    remaining: usize,
    skip_lf: bool,
}

impl<R: BufRead> LineSampler<R> {
    /// Sample at most `max_lines` non-blank lines from `reader`.
    pub fn new(reader: R, max_lines: usize) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(DEFAULT_LINE_BUFFER),
            remaining: max_lines,
            skip_lf: false,
        }
    }

    /// Next non-blank line without its line ending, or `None` once the
    /// sample is complete or the stream is exhausted.
    pub fn next_line(&mut self) -> io::Result<Option<&[u8]>> {
        while self.remaining > 0 {
            if !self.read_line()? {
                return Ok(None);
            }
            if is_blank_line(&self.buffer) {
                continue;
            }
            self.remaining -= 1;
            return Ok(Some(&self.buffer[..]));
        }
        Ok(None)
    }

    /// Fill the buffer with the next physical line. Returns false at end of input.
    fn read_line(&mut self) -> io::Result<bool> {
        self.buffer.clear();
        loop {
            let available = self.reader.fill_buf()?;
            if available.is_empty() {
                return Ok(!self.buffer.is_empty());
            }
            // Second half of a \r\n pair
            if self.skip_lf {
                self.skip_lf = false;
                if available[0] == b'\n' {
                    self.reader.consume(1);
                    continue;
                }
            }
            match memchr2(b'\n', b'\r', available) {
                Some(pos) => {
                    self.buffer.extend_from_slice(&available[..pos]);
                    self.skip_lf = available[pos] == b'\r';
                    self.reader.consume(pos + 1);
                    return Ok(true);
                }
                None => {
                    let len = available.len();
                    self.buffer.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }
    }
}

/// Minimum number of released bytes before the recorder compacts.
const RELEASE_MIN: usize = 4 * DEFAULT_LINE_BUFFER;

/// Reader adapter that keeps every byte it passes through until released.
///
/// Bytes are addressed by absolute stream offset, so a parser sitting on
/// top can look back at the raw text of the record it just produced.
pub struct SpanRecorder<R> {
    inner: R,
    kept: Vec<u8>,
    base: u64,
}

impl<R: Read> SpanRecorder<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            kept: Vec::new(),
            base: 0,
        }
    }

    /// Raw bytes in `[start, end)`, clamped to what is still kept.
    pub fn span(&self, start: u64, end: u64) -> &[u8] {
        let len = self.kept.len() as u64;
        let from = start.saturating_sub(self.base).min(len) as usize;
        let to = end.saturating_sub(self.base).min(len) as usize;
        &self.kept[from..to.max(from)]
    }

    /// Forget bytes before `offset`.
    ///
    /// Compaction waits until at least half of the kept bytes are released,
    /// which keeps the cost linear in the stream length.
    pub fn release(&mut self, offset: u64) {
        let done = offset.saturating_sub(self.base).min(self.kept.len() as u64) as usize;
        if done >= RELEASE_MIN && done * 2 >= self.kept.len() {
            self.kept.drain(..done);
            self.base += done as u64;
        }
    }
}

impl<R: Read> Read for SpanRecorder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.kept.extend_from_slice(&buf[..n]);
        Ok(n)
    }
}
