//! Row counting.

use crate::commands::{open_reader, resolve_delimiter};
use crate::config::RaggedRowPolicy;
use crate::delimiter::DelimiterChoice;
use crate::filter::{RowMatcher, SearchFilter};
use crate::source::TableSource;
use crate::table::Result;
use tracing::debug;

/// Count command configuration.
#[derive(Debug, Clone, Default)]
pub struct CountCommand {
    pub delimiter: DelimiterChoice,
    pub filter: SearchFilter,
    ragged_policy: Option<RaggedRowPolicy>,
}

impl CountCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<DelimiterChoice>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_filter(mut self, filter: SearchFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Override the process-wide ragged row policy.
    pub fn with_ragged_policy(mut self, policy: RaggedRowPolicy) -> Self {
        self.ragged_policy = Some(policy);
        self
    }

    /// Number of data rows, ignoring the filter.
    pub fn row_count<S: TableSource>(&self, source: &S) -> Result<u64> {
        let delimiter = resolve_delimiter(source, self.delimiter)?;
        let reader = open_reader(source, delimiter, self.ragged_policy)?;
        let count = reader.count_rows().map_err(|e| e.in_source(source.id()))?;
        debug!(source = source.id(), rows = count, "counted rows");
        Ok(count)
    }

    /// Number of data rows passing the filter.
    ///
    /// Equals [`row_count`](Self::row_count) for the identity filter.
    pub fn count_filtered<S: TableSource>(&self, source: &S) -> Result<u64> {
        if self.filter.is_identity() {
            return self.row_count(source);
        }

        let delimiter = resolve_delimiter(source, self.delimiter)?;
        let mut reader = open_reader(source, delimiter, self.ragged_policy)?;
        let header = reader
            .header()
            .map_err(|e| e.in_source(source.id()))?
            .to_vec();
        let matcher = RowMatcher::new(&self.filter, &header);

        let mut count = 0u64;
        for row in reader.rows() {
            let row = row.map_err(|e| e.in_source(source.id()))?;
            if matcher.matches(&row) {
                count += 1;
            }
        }
        debug!(source = source.id(), rows = count, "counted filtered rows");
        Ok(count)
    }
}
