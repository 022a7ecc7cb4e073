/// pullbuf command-line tool: stream a file (or stdin) through a
/// `BufferedSource` and decode lines, numbers, or byte patterns.
///
/// # Command overview
///
/// ```text
/// pullbuf <COMMAND> [OPTIONS] [FILE]
///
/// Commands:
///   lines      Print each line, optionally numbered or length-limited
///   find       Print offsets of a byte sequence
///   numbers    Decode whitespace- or comma-separated integers
///   stats      Count bytes, lines, and code points
///   help       Print help information
///
/// Global options:
///   -v, --verbose         Log pulls and end-of-input to stderr
///   --chunk-size <BYTES>  Bytes requested per pull (default 8192)
///   -h, --help            Print help
///   -V, --version         Print version
/// ```
///
/// `FILE` defaults to stdin; `-` also means stdin.
///
/// # Exit codes
///
/// | Code | Meaning                                          |
/// |------|--------------------------------------------------|
/// | 0    | Success                                          |
/// | 1    | Error (I/O failure, malformed input, no match)   |
///
/// All error details are written to stderr so stdout can be piped cleanly.
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use pullbuf_decoder::SourceConfig;

mod cmd_find;
mod cmd_lines;
mod cmd_numbers;
mod cmd_stats;
mod input;

// ── CLI root ──────────────────────────────────────────────────────────────────

/// Pull-based stream decoding from the command line.
#[derive(Parser)]
#[command(name = "pullbuf", version, about = "Buffered pull-based stream decoder")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log pull activity at debug level (overridden by `RUST_LOG`).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum bytes requested from the input per pull.
    #[arg(long, global = true, default_value_t = pullbuf_decoder::SourceConfig::default().chunk_size)]
    chunk_size: usize,
}

// ── Sub-commands ──────────────────────────────────────────────────────────────

#[derive(Subcommand)]
enum Commands {
    /// Print each line without its terminator.
    Lines(LinesArgs),
    /// Print the offset of a byte sequence.
    Find(FindArgs),
    /// Decode ASCII integers separated by whitespace or commas.
    Numbers(NumbersArgs),
    /// Print byte, line, and code point counts.
    Stats(StatsArgs),
}

// ── Argument structs ──────────────────────────────────────────────────────────

/// Arguments for `pullbuf lines`.
///
/// ```text
/// ┌──────────────────┬──────────────────────────────────────────────────┐
/// │ Flag             │ Effect                                           │
/// ├──────────────────┼──────────────────────────────────────────────────┤
/// │ --strict-limit N │ Every line needs a terminator within N bytes     │
/// │ --number         │ Prefix each line with its 1-based number         │
/// └──────────────────┴──────────────────────────────────────────────────┘
/// ```
#[derive(clap::Args)]
pub struct LinesArgs {
    /// Input file; stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Fail on a line longer than this many bytes or without a terminator.
    #[arg(long)]
    pub strict_limit: Option<usize>,

    /// Prefix each line with its line number.
    #[arg(short, long)]
    pub number: bool,
}

/// Arguments for `pullbuf find`.
///
/// Offsets are absolute positions in the input, starting at 0. Matches may
/// overlap when `--all` is set.
#[derive(clap::Args)]
pub struct FindArgs {
    /// Byte sequence to search for (UTF-8 text, or hex with `--hex`).
    pub pattern: String,

    /// Input file; stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Interpret PATTERN as hex digits, e.g. `0d0a`.
    #[arg(long)]
    pub hex: bool,

    /// Print every match instead of the first.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for `pullbuf numbers`.
#[derive(clap::Args)]
pub struct NumbersArgs {
    /// Input file; stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Parse unsigned hexadecimal numerals instead of signed decimals.
    #[arg(long)]
    pub hex: bool,
}

/// Arguments for `pullbuf stats`.
#[derive(clap::Args)]
pub struct StatsArgs {
    /// Input file; stdin when omitted or `-`.
    pub file: Option<PathBuf>,

    /// Emit the report as JSON.
    #[arg(long)]
    pub json: bool,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    let config = SourceConfig::new().with_chunk_size(cli.chunk_size);

    let result = match cli.command {
        Commands::Lines(args) => cmd_lines::run(&args, config),
        Commands::Find(args) => cmd_find::run(&args, config),
        Commands::Numbers(args) => cmd_numbers::run(&args, config),
        Commands::Stats(args) => cmd_stats::run(&args, config),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}
