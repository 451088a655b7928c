//! Field delimiter model and detection.
//!
//! Detection is a heuristic over a small sample of lines: it rewards the
//! candidate that splits consecutive lines into the same number of fields,
//! and falls back to raw frequency when no candidate is consistent. Free
//! text that uses a candidate character irregularly can be misclassified.

use crate::streaming::buffers::DEFAULT_INPUT_BUFFER;
use crate::streaming::parsing::{count_unquoted, is_blank_line, LineSampler};
use crate::table::TableError;
use std::fmt;
use std::io::{self, BufReader, Read};
use std::str::FromStr;
use tracing::debug;

/// Number of non-blank lines sampled for detection.
pub const DETECT_SAMPLE_LINES: usize = 10;

/// A supported field delimiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Delimiter {
    #[default]
    Comma,
    Semicolon,
    Tab,
    Pipe,
}

impl Delimiter {
    /// All candidates in detection priority order.
    pub const CANDIDATES: [Delimiter; 4] = [
        Delimiter::Comma,
        Delimiter::Semicolon,
        Delimiter::Tab,
        Delimiter::Pipe,
    ];

    /// The delimiter byte.
    #[inline]
    pub const fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
            Delimiter::Pipe => b'|',
        }
    }

    /// The delimiter character.
    #[inline]
    pub const fn as_char(self) -> char {
        self.as_byte() as char
    }

    /// Human readable name, e.g. `Comma (,)`.
    pub const fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "Comma (,)",
            Delimiter::Semicolon => "Semicolon (;)",
            Delimiter::Tab => "Tab (\\t)",
            Delimiter::Pipe => "Pipe (|)",
        }
    }

    /// Map a raw character back to a supported delimiter.
    pub fn from_char(c: char) -> Option<Self> {
        Self::CANDIDATES.into_iter().find(|d| d.as_char() == c)
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Delimiter {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "tab" | "\t" | "\\t" => Ok(Delimiter::Tab),
            "pipe" | "|" => Ok(Delimiter::Pipe),
            _ => Err(TableError::InvalidArgument(format!(
                "Unsupported delimiter '{}' (expected comma, semicolon, tab or pipe)",
                s
            ))),
        }
    }
}

/// A delimiter given by the caller, or a request to detect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DelimiterChoice {
    #[default]
    Detect,
    Fixed(Delimiter),
}

impl From<Delimiter> for DelimiterChoice {
    fn from(delimiter: Delimiter) -> Self {
        DelimiterChoice::Fixed(delimiter)
    }
}

impl FromStr for DelimiterChoice {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" | "detect" => Ok(DelimiterChoice::Detect),
            _ => s.parse().map(DelimiterChoice::Fixed),
        }
    }
}

/// Per-candidate counters accumulated while sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CandidateScore {
    /// Occurrences outside quotes across all sampled lines.
    pub total: usize,
    /// Number of sampled lines whose count matched the previous line (and was > 0).
    pub consistency: usize,
}

/// Incremental delimiter detector.
///
/// Feed sampled lines with [`observe`](Self::observe), then ask for the
/// [`best`](Self::best) candidate.
#[derive(Debug, Clone, Default)]
pub struct DelimiterDetector {
    scores: [CandidateScore; 4],
    previous: Option<[usize; 4]>,
    lines_seen: usize,
}

impl DelimiterDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one sampled line. Blank lines and lines past the sample
    /// limit are ignored.
    pub fn observe(&mut self, line: &[u8]) {
        if self.lines_seen >= DETECT_SAMPLE_LINES || is_blank_line(line) {
            return;
        }

        let mut counts = [0usize; 4];
        for (i, candidate) in Delimiter::CANDIDATES.iter().enumerate() {
            let count = count_unquoted(line, candidate.as_byte());
            counts[i] = count;
            self.scores[i].total += count;

            if let Some(previous) = self.previous {
                if count == previous[i] && count > 0 {
                    self.scores[i].consistency += 1;
                }
            }
        }

        self.previous = Some(counts);
        self.lines_seen += 1;
    }

    /// Number of lines accounted for so far.
    pub fn lines_seen(&self) -> usize {
        self.lines_seen
    }

    /// Scores paired with their candidate, in priority order.
    pub fn scores(&self) -> impl Iterator<Item = (Delimiter, CandidateScore)> + '_ {
        Delimiter::CANDIDATES.into_iter().zip(self.scores.iter().copied())
    }

    /// Pick the best candidate for the lines seen so far.
    ///
    /// Highest consistency wins among candidates that occur at all; if no
    /// candidate was ever consistent, the most frequent wins. Ties go to
    /// the earlier candidate in priority order. Defaults to comma.
    pub fn best(&self) -> Delimiter {
        let mut best: Option<usize> = None;
        for (i, score) in self.scores.iter().enumerate() {
            if score.total == 0 {
                continue;
            }
            if best.map_or(true, |b| score.consistency > self.scores[b].consistency) {
                best = Some(i);
            }
        }

        let Some(mut best) = best else {
            return Delimiter::Comma;
        };

        if self.scores[best].consistency == 0 {
            for (i, score) in self.scores.iter().enumerate() {
                if score.total > self.scores[best].total {
                    best = i;
                }
            }
        }

        Delimiter::CANDIDATES[best]
    }
}

/// Detect the delimiter from already sampled lines.
///
/// Only the first [`DETECT_SAMPLE_LINES`] non-blank lines are considered.
/// Never fails: an empty sample yields comma.
pub fn detect<I, L>(lines: I) -> Delimiter
where
    I: IntoIterator<Item = L>,
    L: AsRef<[u8]>,
{
    let mut detector = DelimiterDetector::new();
    for line in lines {
        if detector.lines_seen() >= DETECT_SAMPLE_LINES {
            break;
        }
        detector.observe(line.as_ref());
    }
    detector.best()
}

/// Detect the delimiter by sampling the beginning of a stream.
///
/// Only I/O failures are reported; the heuristic itself never fails.
pub fn detect_reader<R: Read>(reader: R) -> io::Result<Delimiter> {
    let mut sampler = LineSampler::new(
        BufReader::with_capacity(DEFAULT_INPUT_BUFFER, reader),
        DETECT_SAMPLE_LINES,
    );
    let mut detector = DelimiterDetector::new();
    while let Some(line) = sampler.next_line()? {
        detector.observe(line);
    }

    let best = detector.best();
    debug!(
        lines = detector.lines_seen(),
        delimiter = %best,
        "delimiter detection finished"
    );
    Ok(best)
}
