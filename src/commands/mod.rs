//! Query orchestration over table sources.
//!
//! Every command opens its own streams from a [`TableSource`]; nothing is
//! cached between calls, so commands can run concurrently over one source.

pub mod count;
pub mod inspect;
pub mod query;

pub use count::CountCommand;
pub use inspect::{InspectCommand, TableMetadata};
pub use query::{QueryCommand, QueryResult, ScanStats};

use crate::config::RaggedRowPolicy;
use crate::delimiter::{detect_reader, Delimiter, DelimiterChoice};
use crate::source::TableSource;
use crate::table::{Result, RowReader, TableError};
use tracing::info;

/// Use the given delimiter, or detect it over a freshly opened stream.
pub fn resolve_delimiter<S: TableSource>(source: &S, choice: DelimiterChoice) -> Result<Delimiter> {
    match choice {
        DelimiterChoice::Fixed(delimiter) => Ok(delimiter),
        DelimiterChoice::Detect => {
            let reader = open_stream(source)?;
            let delimiter = detect_reader(reader)
                .map_err(|e| TableError::Io(e).in_source(source.id()))?;
            info!(source = source.id(), delimiter = %delimiter, "detected delimiter");
            Ok(delimiter)
        }
    }
}

/// Read the header row of a source.
pub fn read_columns<S: TableSource>(source: &S, delimiter: Delimiter) -> Result<Vec<String>> {
    let mut reader = open_reader(source, delimiter, None)?;
    let columns = reader.header().map_err(|e| e.in_source(source.id()))?;
    Ok(columns.to_vec())
}

fn open_stream<S: TableSource>(source: &S) -> Result<S::Reader> {
    source
        .open()
        .map_err(|e| TableError::Io(e).in_source(source.id()))
}

fn open_reader<S: TableSource>(
    source: &S,
    delimiter: Delimiter,
    policy: Option<RaggedRowPolicy>,
) -> Result<RowReader<S::Reader>> {
    let reader = RowReader::new(open_stream(source)?, delimiter);
    Ok(match policy {
        Some(policy) => reader.with_ragged_policy(policy),
        None => reader,
    })
}
