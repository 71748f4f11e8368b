//! Config command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command: print the effective configuration as TOML.
pub fn execute_config(config: &Config, source: Option<&Path>, formatter: &Formatter) -> Result<()> {
    let origin = match source {
        Some(path) => format!("Configuration from {} (environment applied)", path.display()),
        None => "Built-in defaults (environment applied)".to_string(),
    };
    eprintln!("{}", formatter.info(&origin));
    print!("{}", config.redacted().to_toml()?);
    Ok(())
}
