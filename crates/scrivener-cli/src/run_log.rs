//! Append-only run log: one line per file and a summary block per run.

use chrono::Local;
use scrivener_domain::FileOutcome;
use scrivener_pipeline::RunReport;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S";

/// Handle on the run log file.
pub struct RunLog {
    path: PathBuf,
    file: File,
}

impl RunLog {
    /// Open (creating parents) for appending.
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    /// Log file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mark the start of a run.
    pub fn start(&mut self, input: &Path) -> io::Result<()> {
        writeln!(self.file, "=== run started {} input={} ===", now(), input.display())
    }

    /// Append the line for one file.
    pub fn record(&mut self, outcome: &FileOutcome) -> io::Result<()> {
        writeln!(self.file, "{}", outcome_line(&now(), outcome))
    }

    /// Append the run summary.
    pub fn finish(&mut self, report: &RunReport) -> io::Result<()> {
        writeln!(self.file, "--- run finished {} ---", now())?;
        writeln!(self.file, "{}", report.summary_text())?;
        writeln!(self.file)?;
        self.file.flush()
    }
}

fn now() -> String {
    Local::now().format(TIMESTAMP).to_string()
}

/// Render one outcome as a log line.
pub fn outcome_line(timestamp: &str, outcome: &FileOutcome) -> String {
    let category = outcome.category.map(|c| c.as_str()).unwrap_or("-");
    let mut line = format!("{} | {} | {} | {}", timestamp, outcome.source, category, outcome.status);
    if let Some(message) = &outcome.message {
        line.push_str(" | ");
        line.push_str(&message.replace('\n', " "));
    }
    if !outcome.flagged.is_empty() {
        line.push_str(" | flagged: ");
        line.push_str(&outcome.flagged.join(", "));
    }
    line
}
