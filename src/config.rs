//! Global configuration for tabscan runtime behavior.
//!
//! This module provides thread-safe process-wide defaults that affect
//! row parsing without adding overhead to the scan loop.

use std::sync::atomic::{AtomicU8, Ordering};

/// What to do with a data row that has fewer cells than the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RaggedRowPolicy {
    /// Fill the missing trailing cells with empty strings.
    #[default]
    Pad,
    /// Report the row as a `TableError::RaggedRow`.
    Fail,
}

impl RaggedRowPolicy {
    #[inline]
    const fn as_u8(self) -> u8 {
        match self {
            RaggedRowPolicy::Pad => 0,
            RaggedRowPolicy::Fail => 1,
        }
    }

    #[inline]
    const fn from_u8(value: u8) -> Self {
        match value {
            1 => RaggedRowPolicy::Fail,
            _ => RaggedRowPolicy::Pad,
        }
    }
}

/// Process-wide ragged row policy used by readers that do not override it.
///
/// This is set once at startup and read whenever a `RowReader` is created.
static RAGGED_ROW_POLICY: AtomicU8 = AtomicU8::new(RaggedRowPolicy::Pad.as_u8());

/// Set the default ragged row policy.
///
/// # Example
///
/// ```
/// use tabscan::config::{self, RaggedRowPolicy};
///
/// // Enable at startup before any scanning
/// config::set_ragged_row_policy(RaggedRowPolicy::Fail);
/// assert_eq!(config::ragged_row_policy(), RaggedRowPolicy::Fail);
/// # config::set_ragged_row_policy(RaggedRowPolicy::Pad);
/// ```
#[inline]
pub fn set_ragged_row_policy(policy: RaggedRowPolicy) {
    RAGGED_ROW_POLICY.store(policy.as_u8(), Ordering::Release);
}

/// Current default ragged row policy.
#[inline]
pub fn ragged_row_policy() -> RaggedRowPolicy {
    RaggedRowPolicy::from_u8(RAGGED_ROW_POLICY.load(Ordering::Acquire))
}

/// Convenience for the CLI `--strict-columns` flag.
#[inline]
pub fn set_strict_columns(enabled: bool) {
    set_ragged_row_policy(if enabled {
        RaggedRowPolicy::Fail
    } else {
        RaggedRowPolicy::Pad
    });
}
