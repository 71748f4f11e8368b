//! Schema command implementation.

use crate::cli::SchemaArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use scrivener_domain::Category;

/// Execute the schema command.
pub fn execute_schema(args: SchemaArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let registry = config.registry()?;
    let schemas = match args.category.as_deref() {
        None => registry.schemas().collect::<Vec<_>>(),
        Some(name) => {
            let category = Category::parse(name)
                .ok_or_else(|| CliError::InvalidInput(format!("unknown category '{}'", name)))?;
            let schema = registry
                .schema_for(category)
                .ok_or_else(|| CliError::InvalidInput(format!("{} has no schema", category)))?;
            vec![schema]
        }
    };
    println!("{}", formatter.format_schemas(&schemas)?);
    Ok(())
}
