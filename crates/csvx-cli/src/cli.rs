//! CLI argument definitions for `csvx`.

use std::path::PathBuf;

use chrono::FixedOffset;
use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

use csvx_cli::types::{ColumnSpec, parse_offset};

#[derive(Parser)]
#[command(
    name = "csvx",
    version,
    about = "Inspect and type-check CSV files",
    long_about = "Inspect and type-check CSV files.\n\n\
                  Reads plain or gzip-compressed (.gz) files one row at a time.\n\
                  Cells are trimmed before they are converted."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the header row as a table of column indexes and names.
    Header(InputArgs),

    /// Count data rows.
    Count(CountArgs),

    /// Look up columns by name (case, spaces, and underscores are ignored).
    Find(FindArgs),

    /// Check that every row converts to the declared column types.
    Check(CheckArgs),
}

/// Options shared by every command that reads a file.
#[derive(Args)]
pub struct InputArgs {
    /// CSV file to read (`.gz` files are decompressed).
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Field delimiter.
    #[arg(long = "delimiter", short = 'd', default_value_t = ',')]
    pub delimiter: char,

    /// Accept rows whose length differs from the header.
    #[arg(long = "flexible")]
    pub flexible: bool,
}

#[derive(Args)]
pub struct CountArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Show read progress on stderr.
    #[arg(long = "progress")]
    pub progress: bool,
}

#[derive(Args)]
pub struct FindArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Column names to look up.
    #[arg(value_name = "NAME", required = true)]
    pub names: Vec<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Column types as COL:KIND pairs, e.g. `id:int,total:float?`.
    ///
    /// Kinds: text, int, int?, float, float?, timestamp, timestamp?, date,
    /// date?, bool, skip. A `?` suffix accepts empty cells.
    #[arg(
        long = "types",
        short = 't',
        value_name = "COL:KIND",
        value_delimiter = ',',
        required = true
    )]
    pub types: Vec<ColumnSpec>,

    /// UTC offset for timestamps without one (e.g. +10:00). Defaults to UTC.
    #[arg(long = "tz", value_name = "OFFSET", value_parser = parse_offset)]
    pub tz: Option<FixedOffset>,

    /// Maximum number of failing rows to list.
    #[arg(long = "max-errors", value_name = "N", default_value_t = 20)]
    pub max_errors: usize,

    /// Show read progress on stderr.
    #[arg(long = "progress")]
    pub progress: bool,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
