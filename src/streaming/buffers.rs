//! Buffer size constants for streaming operations.
//!
//! These constants control memory usage vs I/O throughput tradeoffs.

/// Default output buffer size (256 KB).
/// Query pages are small; large exports still flush in reasonable chunks.
pub const DEFAULT_OUTPUT_BUFFER: usize = 256 * 1024;

/// Default input buffer size (256 KB).
/// Good balance for scanning large delimited files.
pub const DEFAULT_INPUT_BUFFER: usize = 256 * 1024;

/// Default line buffer capacity (1 KB).
/// Sufficient for most sampled lines during delimiter detection.
pub const DEFAULT_LINE_BUFFER: usize = 1024;

/// Minimum file size to memory-map a file source (smaller files use buffered I/O).
pub const MMAP_THRESHOLD: u64 = 64 * 1024;

