//! tabscan: query delimited text tables from the command line
//!
//! Usage: tabscan <COMMAND> [OPTIONS]

use clap::{Parser, Subcommand};
use std::io::{self, Cursor, Read};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

use tabscan::commands::{read_columns, resolve_delimiter, CountCommand, InspectCommand, QueryCommand};
use tabscan::delimiter::DelimiterChoice;
use tabscan::filter::SearchFilter;
use tabscan::page::{PageRequest, DEFAULT_PAGE_SIZE};
use tabscan::sort::SortSpec;
use tabscan::source::{FileReader, FileSource, MemorySource, SharedBytes, TableSource};
use tabscan::streaming::RowWriter;
use tabscan::table::{Result, TableError};

#[derive(Parser)]
#[command(name = "tabscan")]
#[command(version = tabscan::VERSION)]
#[command(about = "tabscan: search, sort and page through CSV-like tables", long_about = None)]
struct Cli {
    /// Number of threads to use for sorting (default: number of CPUs)
    #[arg(long, short = 't', global = true)]
    threads: Option<usize>,

    /// Fail on rows with fewer cells than the header instead of padding them
    #[arg(long, global = true)]
    strict_columns: bool,

    /// Print scan statistics to stderr
    #[arg(long, global = true)]
    stats: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the detected delimiter
    Detect {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Print the column names, one per line
    Header {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Delimiter: auto, comma, semicolon, tab or pipe
        #[arg(short, long, default_value = "auto")]
        delimiter: DelimiterChoice,
    },

    /// Count data rows, optionally filtered
    Count {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Delimiter: auto, comma, semicolon, tab or pipe
        #[arg(short, long, default_value = "auto")]
        delimiter: DelimiterChoice,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Filter, sort and page through rows
    Query {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Delimiter: auto, comma, semicolon, tab or pipe
        #[arg(short, long, default_value = "auto")]
        delimiter: DelimiterChoice,

        #[command(flatten)]
        filter: FilterArgs,

        /// Column to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long)]
        desc: bool,

        /// Zero-based page number
        #[arg(long, default_value = "0")]
        page: u64,

        /// Rows per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u64,

        /// Return every matching row instead of one page
        #[arg(long, conflicts_with_all = ["page", "page_size"])]
        all: bool,
    },

    /// Print delimiter, columns and row count
    Inspect {
        /// Input file (use - for stdin)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Delimiter: auto, comma, semicolon, tab or pipe
        #[arg(short, long, default_value = "auto")]
        delimiter: DelimiterChoice,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Keep rows where any cell contains TERM (case-insensitive)
    #[arg(short = 's', long = "search", value_name = "TERM")]
    search: Option<String>,

    /// Keep rows where column NAME contains PATTERN (repeatable)
    #[arg(short = 'c', long = "column", value_name = "NAME=PATTERN", value_parser = parse_column_term)]
    columns: Vec<(String, String)>,

    /// Invert the match decision
    #[arg(long)]
    inverse: bool,
}

impl FilterArgs {
    fn into_filter(self) -> SearchFilter {
        let mut filter = SearchFilter::new().with_inverse(self.inverse);
        if let Some(term) = self.search {
            filter = filter.with_global(term);
        }
        for (name, term) in self.columns {
            filter = filter.with_column(name, term);
        }
        filter
    }
}

fn parse_column_term(arg: &str) -> Result<(String, String)> {
    match arg.split_once('=') {
        Some((name, term)) if !name.is_empty() => Ok((name.to_string(), term.to_string())),
        _ => Err(TableError::InvalidArgument(format!(
            "column search '{}' must look like NAME=PATTERN",
            arg
        ))),
    }
}

/// A file on disk or stdin buffered into memory.
enum Input {
    File(FileSource),
    Memory(MemorySource),
}

enum InputReader {
    File(FileReader),
    Memory(Cursor<SharedBytes>),
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            InputReader::File(reader) => reader.read(buf),
            InputReader::Memory(reader) => reader.read(buf),
        }
    }
}

impl TableSource for Input {
    type Reader = InputReader;

    fn id(&self) -> &str {
        match self {
            Input::File(source) => source.id(),
            Input::Memory(source) => source.id(),
        }
    }

    fn open(&self) -> io::Result<Self::Reader> {
        match self {
            Input::File(source) => source.open().map(InputReader::File),
            Input::Memory(source) => source.open().map(InputReader::Memory),
        }
    }

    fn size_bytes(&self) -> Option<u64> {
        match self {
            Input::File(source) => source.size_bytes(),
            Input::Memory(source) => source.size_bytes(),
        }
    }
}

fn open_input(input: Option<PathBuf>) -> Result<Input> {
    match input {
        Some(path) if path.to_string_lossy() != "-" => {
            let id = path.display().to_string();
            FileSource::open(&path)
                .map(Input::File)
                .map_err(|e| TableError::Io(e).in_source(&id))
        }
        // Several passes are needed, so stdin is buffered in full
        _ => MemorySource::from_reader("stdin", io::stdin().lock())
            .map(Input::Memory)
            .map_err(|e| TableError::Io(e).in_source("stdin")),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    // Must be set before any reader is created
    tabscan::config::set_strict_columns(cli.strict_columns);

    if let Some(n) = cli.threads {
        if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
            eprintln!("Error: failed to initialize thread pool: {}", e);
            process::exit(1);
        }
    }

    let print_stats = cli.stats;
    let result = match cli.command {
        Commands::Detect { input } => run_detect(input),
        Commands::Header { input, delimiter } => run_header(input, delimiter),
        Commands::Count {
            input,
            delimiter,
            filter,
        } => run_count(input, delimiter, filter, print_stats),
        Commands::Query {
            input,
            delimiter,
            filter,
            sort,
            desc,
            page,
            page_size,
            all,
        } => run_query(input, delimiter, filter, sort, desc, page, page_size, all, print_stats),
        Commands::Inspect { input, delimiter } => run_inspect(input, delimiter),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_detect(input: Option<PathBuf>) -> Result<()> {
    let source = open_input(input)?;
    let delimiter = resolve_delimiter(&source, DelimiterChoice::Detect)?;
    let mut writer = RowWriter::new(io::stdout().lock());
    writer.write_line(delimiter.name())?;
    writer.flush()
}

fn run_header(input: Option<PathBuf>, delimiter: DelimiterChoice) -> Result<()> {
    let source = open_input(input)?;
    let delimiter = resolve_delimiter(&source, delimiter)?;
    let columns = read_columns(&source, delimiter)?;
    let mut writer = RowWriter::new(io::stdout().lock());
    for name in &columns {
        writer.write_line(name)?;
    }
    writer.flush()
}

fn run_count(
    input: Option<PathBuf>,
    delimiter: DelimiterChoice,
    filter: FilterArgs,
    print_stats: bool,
) -> Result<()> {
    let source = open_input(input)?;
    let delimiter = resolve_delimiter(&source, delimiter)?;
    let cmd = CountCommand::new()
        .with_delimiter(delimiter)
        .with_filter(filter.into_filter());
    let count = cmd.count_filtered(&source)?;

    if print_stats {
        eprintln!("Count stats: source={}, delimiter={}, rows={}", source.id(), delimiter, count);
    }

    let mut writer = RowWriter::new(io::stdout().lock());
    writer.write_count(count)?;
    writer.flush()
}

#[allow(clippy::too_many_arguments)]
fn run_query(
    input: Option<PathBuf>,
    delimiter: DelimiterChoice,
    filter: FilterArgs,
    sort: Option<String>,
    desc: bool,
    page: u64,
    page_size: u64,
    all: bool,
    print_stats: bool,
) -> Result<()> {
    let source = open_input(input)?;
    let sort = match sort {
        Some(column) if desc => SortSpec::descending(column),
        Some(column) => SortSpec::ascending(column),
        None => SortSpec::none(),
    };

    let mut cmd = QueryCommand::new()
        .with_delimiter(delimiter)
        .with_filter(filter.into_filter())
        .with_sort(sort);
    cmd = if all {
        cmd.all_rows()
    } else {
        cmd.with_page(PageRequest::new(page, page_size)?)
    };

    let stats = cmd.run(&source, &mut io::stdout().lock())?;
    if print_stats {
        eprintln!("Query stats: {}", stats);
    }
    Ok(())
}

fn run_inspect(input: Option<PathBuf>, delimiter: DelimiterChoice) -> Result<()> {
    let source = open_input(input)?;
    let metadata = InspectCommand::new()
        .with_delimiter(delimiter)
        .execute(&source)?;
    let mut writer = RowWriter::new(io::stdout().lock());
    for line in metadata.to_string().lines() {
        writer.write_line(line)?;
    }
    writer.flush()
}
