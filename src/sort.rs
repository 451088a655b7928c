//! Row ordering by a single column.
//!
//! Cell comparison picks its rule per pair: when both cells parse as
//! numbers they compare numerically, otherwise case-insensitively as
//! text. A column mixing numbers and words therefore does not induce a
//! total order, so rows are sorted with a merge sort that tolerates
//! inconsistent comparators and keeps equal rows in filtered order.

use crate::table::Row;
use rayon::join;
use std::cmp::Ordering;

/// Minimum number of rows before the merge sort splits work across threads.
/// Below this threshold, sequential sorting is faster due to
/// thread spawn overhead.
pub const PARALLEL_THRESHOLD: usize = 10_000;

/// Runs at or below this length are sorted by insertion.
const INSERTION_THRESHOLD: usize = 16;

/// Requested ordering of a query result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    /// Column name to sort by; `None` keeps file order.
    pub column: Option<String>,
    pub ascending: bool,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl SortSpec {
    /// Keep file order.
    pub fn none() -> Self {
        Self {
            column: None,
            ascending: true,
        }
    }

    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: Some(column.into()),
            ascending: false,
        }
    }

    /// Position of the sort column in `header`, if sorting applies at all.
    ///
    /// Blank or unknown column names disable sorting. Duplicate names
    /// resolve to their first position.
    pub fn resolve<S: AsRef<str>>(&self, header: &[S]) -> Option<usize> {
        let column = self.column.as_deref()?;
        if column.trim().is_empty() {
            return None;
        }
        header.iter().position(|name| name.as_ref() == column)
    }
}

/// Parse a cell as a decimal number, ignoring surrounding whitespace.
///
/// Only plain decimal and exponent notation count: `inf`, `infinity`
/// and `nan` stay text even though `f64::from_str` accepts them.
#[inline]
pub fn parse_number(cell: &str) -> Option<f64> {
    let cell = cell.trim();
    let first = *cell.as_bytes().first()?;
    if !(first.is_ascii_digit() || matches!(first, b'.' | b'+' | b'-')) {
        return None;
    }
    if cell
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'))
    {
        return None;
    }
    cell.parse::<f64>().ok()
}

/// Case-insensitive text comparison without allocating.
#[inline]
fn compare_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compare two cells, numerically when both are numbers.
pub fn compare_cells(a: &str, b: &str, ascending: bool) -> Ordering {
    let ordering = match (parse_number(a), parse_number(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        _ => compare_text(a, b),
    };
    if ascending {
        ordering
    } else {
        ordering.reverse()
    }
}

/// Stable sort of `rows` by the cell at `column`.
///
/// Rows missing the column compare as empty cells.
pub fn sort_rows(rows: Vec<Row>, column: usize, ascending: bool) -> Vec<Row> {
    merge_sort(rows, &|a: &Row, b: &Row| {
        compare_cells(cell_at(a, column), cell_at(b, column), ascending)
    })
}

#[inline]
fn cell_at(row: &Row, column: usize) -> &str {
    row.get(column).map_or("", String::as_str)
}

/// Stable merge sort that never panics on inconsistent comparators.
///
/// Large inputs sort their halves in parallel with rayon.
pub fn merge_sort<T, F>(mut items: Vec<T>, compare: &F) -> Vec<T>
where
    T: Send,
    F: Fn(&T, &T) -> Ordering + Sync,
{
    let len = items.len();
    if len <= INSERTION_THRESHOLD {
        insertion_sort(&mut items, compare);
        return items;
    }

    let right = items.split_off(len / 2);
    let (left, right) = if len >= PARALLEL_THRESHOLD {
        join(|| merge_sort(items, compare), || merge_sort(right, compare))
    } else {
        (merge_sort(items, compare), merge_sort(right, compare))
    };
    merge(left, right, compare)
}

fn insertion_sort<T, F>(items: &mut [T], compare: &F)
where
    F: Fn(&T, &T) -> Ordering,
{
    for i in 1..items.len() {
        let mut j = i;
        while j > 0 && compare(&items[j - 1], &items[j]) == Ordering::Greater {
            items.swap(j - 1, j);
            j -= 1;
        }
    }
}

fn merge<T, F>(left: Vec<T>, right: Vec<T>, compare: &F) -> Vec<T>
where
    F: Fn(&T, &T) -> Ordering,
{
    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        // Take from the left on ties to keep the sort stable
        let take_left = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(l, r) != Ordering::Greater,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };
        let next = if take_left { left.next() } else { right.next() };
        merged.extend(next);
    }

    merged
}
