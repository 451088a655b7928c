//! Filtered, sorted, paginated row queries.
//!
//! A query streams the source once. Matching rows are kept only when the
//! result needs them: with a sort every match is materialized and sorted,
//! without one only the matches inside the requested page are kept. The
//! total is always the exact number of matches.

use crate::commands::{open_reader, resolve_delimiter};
use crate::config::RaggedRowPolicy;
use crate::delimiter::DelimiterChoice;
use crate::filter::{RowMatcher, SearchFilter};
use crate::page::PageRequest;
use crate::sort::{sort_rows, SortSpec};
use crate::source::TableSource;
use crate::streaming::RowWriter;
use crate::table::{Result, Row};
use std::io::Write;
use std::time::{Duration, Instant};
use tracing::debug;

/// One page of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    /// Number of rows passing the filter, independent of pagination.
    pub total_filtered_rows: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

/// Statistics from a query scan.
#[derive(Debug, Default, Clone)]
pub struct ScanStats {
    pub rows_scanned: u64,
    pub rows_matched: u64,
    pub rows_retained: u64,
    pub sorted: bool,
    pub elapsed: Duration,
}

impl std::fmt::Display for ScanStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scanned: {}, Matched: {}, Retained: {}, Sorted: {}, Elapsed: {:.3}s",
            self.rows_scanned,
            self.rows_matched,
            self.rows_retained,
            if self.sorted { "yes" } else { "no" },
            self.elapsed.as_secs_f64()
        )
    }
}

/// Query command configuration.
#[derive(Debug, Clone)]
pub struct QueryCommand {
    pub delimiter: DelimiterChoice,
    pub sort: SortSpec,
    pub filter: SearchFilter,
    /// Page to return; `None` returns every filtered row.
    pub page: Option<PageRequest>,
    ragged_policy: Option<RaggedRowPolicy>,
}

impl Default for QueryCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryCommand {
    pub fn new() -> Self {
        Self {
            delimiter: DelimiterChoice::Detect,
            sort: SortSpec::none(),
            filter: SearchFilter::new(),
            page: Some(PageRequest::default()),
            ragged_policy: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<DelimiterChoice>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }

    /// Return every filtered row instead of one page.
    pub fn all_rows(mut self) -> Self {
        self.page = None;
        self
    }

    /// Override the process-wide ragged row policy.
    pub fn with_ragged_policy(mut self, policy: RaggedRowPolicy) -> Self {
        self.ragged_policy = Some(policy);
        self
    }

    /// Run the query and return the requested page.
    pub fn execute<S: TableSource>(&self, source: &S) -> Result<QueryResult> {
        self.execute_with_stats(source).map(|(result, _)| result)
    }

    /// Run the query and write the page through a [`RowWriter`].
    pub fn run<S: TableSource, W: Write>(&self, source: &S, output: &mut W) -> Result<ScanStats> {
        let (result, stats) = self.execute_with_stats(source)?;
        let mut writer = RowWriter::new(output);
        writer.write_result(&result)?;
        writer.flush()?;
        Ok(stats)
    }

    /// Run the query, also reporting scan statistics.
    pub fn execute_with_stats<S: TableSource>(&self, source: &S) -> Result<(QueryResult, ScanStats)> {
        let started = Instant::now();
        let delimiter = resolve_delimiter(source, self.delimiter)?;
        let mut reader = open_reader(source, delimiter, self.ragged_policy)?;
        let columns = reader
            .header()
            .map_err(|e| e.in_source(source.id()))?
            .to_vec();

        let matcher = RowMatcher::new(&self.filter, &columns);
        let sort_column = self.sort.resolve(&columns);
        debug!(
            source = source.id(),
            delimiter = %delimiter,
            columns = columns.len(),
            sort_column = ?sort_column,
            "query scan started"
        );

        // Unsorted results are final in file order, so only the page window is kept
        let window = match (self.page, sort_column) {
            (Some(page), None) => Some(page.range(u64::MAX)),
            _ => None,
        };

        let mut stats = ScanStats {
            sorted: sort_column.is_some(),
            ..Default::default()
        };
        let mut retained: Vec<Row> = Vec::new();
        for row in reader.rows() {
            let row = row.map_err(|e| e.in_source(source.id()))?;
            stats.rows_scanned += 1;
            if !matcher.matches(&row) {
                continue;
            }
            let index = stats.rows_matched;
            stats.rows_matched += 1;
            if window.as_ref().map_or(true, |w| w.contains(&index)) {
                retained.push(row);
            }
        }
        stats.rows_retained = retained.len() as u64;

        let total = stats.rows_matched;
        let mut rows = match sort_column {
            Some(column) => sort_rows(retained, column, self.sort.ascending),
            None => retained,
        };

        let result = match self.page {
            Some(page) => {
                if sort_column.is_some() {
                    let range = page.range(total);
                    rows = rows
                        .into_iter()
                        .skip(range.start as usize)
                        .take((range.end - range.start) as usize)
                        .collect();
                }
                QueryResult {
                    columns,
                    rows,
                    total_filtered_rows: total,
                    page: page.page,
                    page_size: page.page_size,
                    total_pages: page.total_pages(total),
                }
            }
            None => QueryResult {
                columns,
                rows,
                total_filtered_rows: total,
                page: 0,
                page_size: total.max(1),
                total_pages: u64::from(total > 0),
            },
        };

        stats.elapsed = started.elapsed();
        debug!(source = source.id(), stats = %stats, "query scan finished");
        Ok((result, stats))
    }
}
