//! Stats command implementation.

use crate::config::Config;
use crate::error::Result;
use crate::output::{Formatter, WorkbookStat};
use scrivener_domain::Category;
use scrivener_store::WorkbookStore;
use std::sync::Arc;

/// Row counts of every category's workbook.
pub fn collect_stats(config: &Config) -> Result<Vec<WorkbookStat>> {
    let store = WorkbookStore::new(config.layout()?, Arc::new(config.registry()?));
    let mut stats = Vec::new();
    for category in Category::KNOWN {
        let path = store
            .layout()
            .path_for(category)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        stats.push(WorkbookStat {
            category: category.as_str().to_string(),
            path,
            rows: store.row_count(category)?,
        });
    }
    Ok(stats)
}

/// Execute the stats command.
pub fn execute_stats(config: &Config, formatter: &Formatter) -> Result<()> {
    let stats = collect_stats(config)?;
    println!("{}", formatter.format_stats(&stats)?);
    Ok(())
}
