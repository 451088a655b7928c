//! tabscan: streaming queries over delimited text tables
//!
//! This library reads CSV-like files (comma, semicolon, tab or pipe
//! separated), detects their delimiter and answers filtered, sorted,
//! paginated queries without loading more rows than the result needs.
//!
//! # Features
//!
//! - **Delimiter detection**: quote-aware consistency heuristic over a sample
//! - **Streaming I/O**: one row in memory at a time for counts and unsorted pages
//! - **Parallel sorting**: Rayon-backed stable merge sort for large results
//!
//! # Example
//!
//! ```rust,no_run
//! use tabscan::prelude::*;
//!
//! let source = FileSource::open("people.csv").unwrap();
//! let result = QueryCommand::new()
//!     .with_filter(SearchFilter::new().with_global("jo"))
//!     .with_sort(SortSpec::ascending("Age"))
//!     .with_page(PageRequest::new(0, 20).unwrap())
//!     .execute(&source)
//!     .unwrap();
//! println!("{} matching rows", result.total_filtered_rows);
//! ```

pub mod commands;
pub mod config;
pub mod delimiter;
pub mod filter;
pub mod page;
pub mod sort;
pub mod source;
pub mod streaming;
pub mod table;

// Re-export commonly used types
pub use delimiter::{detect, detect_reader, Delimiter, DelimiterChoice};
pub use table::{parse_table, read_header, row_count, Row, RowReader, TableError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::commands::{
        CountCommand, InspectCommand, QueryCommand, QueryResult, TableMetadata,
    };
    pub use crate::delimiter::{Delimiter, DelimiterChoice};
    pub use crate::filter::SearchFilter;
    pub use crate::page::PageRequest;
    pub use crate::sort::SortSpec;
    pub use crate::source::{FileSource, MemorySource, TableSource};
    pub use crate::table::{Row, RowReader, TableError};
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn test_basic_workflow() {
        let content = "Name;Age;City\nJohn;30;NY\nJane;25;LA\nBob;35;Chi\n";
        let source = MemorySource::new("people.csv", content.as_bytes().to_vec());

        let meta = InspectCommand::new().execute(&source).unwrap();
        assert_eq!(meta.delimiter, Delimiter::Semicolon);
        assert_eq!(meta.row_count, 3);

        let result = QueryCommand::new()
            .with_sort(SortSpec::descending("Age"))
            .execute(&source)
            .unwrap();
        assert_eq!(result.rows[0], vec!["Bob", "35", "Chi"]);
        assert_eq!(result.total_filtered_rows, meta.row_count);
    }

    #[test]
    fn test_count_agrees_with_query() {
        let content = "id,tag\n1,red\n2,blue\n3,red\n4,green\n";
        let source = MemorySource::new("tags.csv", content.as_bytes().to_vec());
        let filter = SearchFilter::new().with_column("tag", "RE");

        let count = CountCommand::new()
            .with_filter(filter.clone())
            .count_filtered(&source)
            .unwrap();
        let result = QueryCommand::new()
            .with_filter(filter)
            .with_page(PageRequest::new(0, 1).unwrap())
            .execute(&source)
            .unwrap();

        assert_eq!(count, 3);
        assert_eq!(result.total_filtered_rows, 3);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.rows, vec![vec!["1", "red"]]);
    }
}
