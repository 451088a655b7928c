//! Row filtering by case-insensitive substring search.
//!
//! A filter combines an optional global term (any cell may contain it)
//! with per-column terms (every named column must contain its term) and
//! an optional final negation. Column names that are not in the header
//! add no constraint, so callers can search without knowing the schema.

use rustc_hash::FxHashMap;

/// Search configuration for a query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    /// Term matched against every cell.
    pub global_search: Option<String>,
    /// Column name -> term required in that column.
    pub column_search: FxHashMap<String, String>,
    /// Negate the final match decision.
    pub inverse_search: bool,
}

impl SearchFilter {
    /// The identity filter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the global search term.
    pub fn with_global(mut self, term: impl Into<String>) -> Self {
        self.global_search = Some(term.into());
        self
    }

    /// Require `term` in column `name`.
    pub fn with_column(mut self, name: impl Into<String>, term: impl Into<String>) -> Self {
        self.column_search.insert(name.into(), term.into());
        self
    }

    /// Negate the match decision.
    pub fn with_inverse(mut self, inverse: bool) -> Self {
        self.inverse_search = inverse;
        self
    }

    /// True when every row passes: no effective terms and no inversion.
    pub fn is_identity(&self) -> bool {
        !self.inverse_search
            && self.global_term().is_none()
            && self.column_search.values().all(|t| is_blank(t))
    }

    fn global_term(&self) -> Option<&str> {
        self.global_search.as_deref().filter(|t| !is_blank(t))
    }
}

#[inline]
fn is_blank(term: &str) -> bool {
    term.trim().is_empty()
}

#[inline]
fn contains_folded(cell: &str, folded_term: &str) -> bool {
    cell.to_lowercase().contains(folded_term)
}

/// A filter compiled against one header.
///
/// Terms are lowercased and column names resolved to positions once per
/// query instead of once per row.
#[derive(Debug, Clone)]
pub struct RowMatcher {
    global: Option<String>,
    columns: Vec<(usize, String)>,
    inverse: bool,
}

impl RowMatcher {
    pub fn new<S: AsRef<str>>(filter: &SearchFilter, header: &[S]) -> Self {
        // First occurrence wins for duplicate column names
        let mut positions: FxHashMap<&str, usize> = FxHashMap::default();
        for (i, name) in header.iter().enumerate() {
            positions.entry(name.as_ref()).or_insert(i);
        }

        let mut columns: Vec<(usize, String)> = filter
            .column_search
            .iter()
            .filter(|(_, term)| !is_blank(term))
            .filter_map(|(name, term)| {
                positions
                    .get(name.as_str())
                    .map(|&i| (i, term.to_lowercase()))
            })
            .collect();
        // Deterministic evaluation order regardless of map iteration order
        columns.sort();

        Self {
            global: filter.global_term().map(str::to_lowercase),
            columns,
            inverse: filter.inverse_search,
        }
    }

    /// True when every row matches without inspecting it.
    pub fn is_pass_through(&self) -> bool {
        !self.inverse && self.global.is_none() && self.columns.is_empty()
    }

    /// Decide whether `row` is part of the filtered result.
    pub fn matches<S: AsRef<str>>(&self, row: &[S]) -> bool {
        let mut matched = match &self.global {
            Some(term) => row.iter().any(|cell| contains_folded(cell.as_ref(), term)),
            None => true,
        };

        if matched {
            matched = self.columns.iter().all(|(i, term)| match row.get(*i) {
                Some(cell) => contains_folded(cell.as_ref(), term),
                None => true,
            });
        }

        if self.inverse {
            !matched
        } else {
            matched
        }
    }
}

/// Decide whether `row` passes `filter` under `header`.
///
/// Prefer [`RowMatcher`] when testing many rows against one filter.
pub fn matches<S: AsRef<str>, H: AsRef<str>>(row: &[S], header: &[H], filter: &SearchFilter) -> bool {
    RowMatcher::new(filter, header).matches(row)
}
