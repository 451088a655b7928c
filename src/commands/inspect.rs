//! Table metadata: delimiter, columns and row count.

use crate::commands::{read_columns, resolve_delimiter, CountCommand};
use crate::config::RaggedRowPolicy;
use crate::delimiter::{Delimiter, DelimiterChoice};
use crate::source::TableSource;
use crate::table::Result;
use std::fmt;
use tracing::info;

/// Summary of a table source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableMetadata {
    pub source_id: String,
    pub delimiter: Delimiter,
    pub columns: Vec<String>,
    pub row_count: u64,
    pub size_bytes: Option<u64>,
}

impl TableMetadata {
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl fmt::Display for TableMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "source\t{}", self.source_id)?;
        writeln!(f, "delimiter\t{}", self.delimiter.name())?;
        if let Some(size) = self.size_bytes {
            writeln!(f, "bytes\t{}", size)?;
        }
        writeln!(f, "rows\t{}", self.row_count)?;
        writeln!(f, "columns\t{}", self.column_count())?;
        for (i, name) in self.columns.iter().enumerate() {
            writeln!(f, "{}\t{}", i, name)?;
        }
        Ok(())
    }
}

/// Inspect command configuration.
#[derive(Debug, Clone, Default)]
pub struct InspectCommand {
    pub delimiter: DelimiterChoice,
    ragged_policy: Option<RaggedRowPolicy>,
}

impl InspectCommand {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<DelimiterChoice>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_ragged_policy(mut self, policy: RaggedRowPolicy) -> Self {
        self.ragged_policy = Some(policy);
        self
    }

    /// Detect the delimiter once, then read the header and count rows.
    pub fn execute<S: TableSource>(&self, source: &S) -> Result<TableMetadata> {
        let delimiter = resolve_delimiter(source, self.delimiter)?;
        let columns = read_columns(source, delimiter)?;

        let mut counter = CountCommand::new().with_delimiter(delimiter);
        if let Some(policy) = self.ragged_policy {
            counter = counter.with_ragged_policy(policy);
        }
        let row_count = counter.row_count(source)?;

        info!(
            source = source.id(),
            rows = row_count,
            columns = columns.len(),
            "inspected table"
        );
        Ok(TableMetadata {
            source_id: source.id().to_string(),
            delimiter,
            columns,
            row_count,
            size_bytes: source.size_bytes(),
        })
    }
}
