//! Shared streaming utilities for tabscan.
//!
//! This module provides the low-level pieces used by every scan:
//! - Quote-aware byte scanning for delimiter detection
//! - Buffered row output
//! - Buffer size constants
//!
//! Scans keep O(1) memory beyond the current row unless a command
//! explicitly materializes its result.

pub mod buffers;
pub mod output;
pub mod parsing;

pub use output::RowWriter;
pub use parsing::{count_unquoted, is_blank_line, LineSampler, SpanRecorder};
