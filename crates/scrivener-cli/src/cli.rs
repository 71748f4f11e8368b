//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scrivener - classify office documents and extract their fields into Excel workbooks.
#[derive(Debug, Parser)]
#[command(name = "scrivener")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true, default_value = "table")]
    pub format: CliFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SCRIVENER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only warnings and errors in the log
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Default log filter implied by `--verbose` / `--quiet`
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        }
    }
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (minimal)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Process every document in the input directory
    Run(RunArgs),

    /// Show the field schemas
    Schema(SchemaArgs),

    /// Show row counts per workbook
    Stats,

    /// Print the effective configuration
    Config,
}

/// Arguments for the run command.
#[derive(Debug, Default, Parser)]
pub struct RunArgs {
    /// Input directory
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Output directory for workbooks
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Template directory for new workbooks
    #[arg(long)]
    pub template_dir: Option<PathBuf>,

    /// Run log file
    #[arg(long)]
    pub run_log: Option<PathBuf>,

    /// Files processed concurrently
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Descend into subdirectories
    #[arg(short, long)]
    pub recursive: bool,
}

/// Arguments for the schema command.
#[derive(Debug, Parser)]
pub struct SchemaArgs {
    /// Category label or key (e.g. PolicyDocument, policy_document)
    pub category: Option<String>,
}
