//! Scrivener CLI library.
//!
//! Configuration layering, the run log, output formatting and the
//! implementations of the `scrivener` subcommands.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod run_log;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use run_log::RunLog;
