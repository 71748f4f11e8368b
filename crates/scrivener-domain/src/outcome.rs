//! Per-file outcomes and run totals

use crate::{Category, SourceId};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Result of persisting one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistResult {
    /// Row appended at this 1-based sheet row (the header is row 1)
    Appended {
        /// Row number of the new row
        row: usize,
    },
    /// Source identity already present; nothing written
    Duplicate,
    /// Workbook could not be read or written
    Failed(String),
}

/// Furthest pipeline stage a file reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Found in the input directory
    Discovered,
    /// Text read from the file
    TextExtracted,
    /// Category assigned
    Classified,
    /// Fields extracted
    Extracted,
    /// Persister returned
    Persisted,
}

impl Stage {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discovered => "discovered",
            Stage::TextExtracted => "text_extracted",
            Stage::Classified => "classified",
            Stage::Extracted => "extracted",
            Stage::Persisted => "persisted",
        }
    }
}

/// Terminal status of one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileStatus {
    /// New row written
    Appended,
    /// Already present in the workbook
    Duplicate,
    /// Classified as Unknown; not extracted
    SkippedUnknown,
    /// Model reply unusable or transport exhausted
    ExtractionFailed,
    /// Workbook I/O failed
    PersistFailed,
    /// Text could not be read from the file
    FormatError,
    /// Run ended before the file was started
    NotStarted,
}

impl FileStatus {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Appended => "appended",
            FileStatus::Duplicate => "duplicate",
            FileStatus::SkippedUnknown => "skipped_unknown",
            FileStatus::ExtractionFailed => "extraction_failed",
            FileStatus::PersistFailed => "persist_failed",
            FileStatus::FormatError => "format_error",
            FileStatus::NotStarted => "not_started",
        }
    }

    /// Whether the file counts as succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, FileStatus::Appended | FileStatus::Duplicate)
    }

    /// Whether the file counts as failed
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            FileStatus::ExtractionFailed | FileStatus::PersistFailed | FileStatus::FormatError
        )
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened to one input file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOutcome {
    /// Path of the file
    pub path: PathBuf,
    /// Source identity
    pub source: SourceId,
    /// Category, once classified
    pub category: Option<Category>,
    /// Terminal status
    pub status: FileStatus,
    /// Furthest stage reached
    pub stage: Stage,
    /// Error or rationale text
    pub message: Option<String>,
    /// Fields carrying validation flags (`name:issue`)
    pub flagged: Vec<String>,
}

impl FileOutcome {
    /// Outcome with no category, message or flags
    pub fn new(path: PathBuf, source: SourceId, status: FileStatus, stage: Stage) -> Self {
        Self {
            path,
            source,
            category: None,
            status,
            stage,
            message: None,
            flagged: Vec::new(),
        }
    }

    /// Set the category
    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Set the message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Set the flagged field list
    pub fn with_flagged(mut self, flagged: Vec<String>) -> Self {
        self.flagged = flagged;
        self
    }
}

/// Counts accumulated over one run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Work items found in the input directory
    pub discovered: usize,
    /// Files that reached a terminal state other than not-started
    pub processed: usize,
    /// Rows written
    pub appended: usize,
    /// Files already present in their workbook
    pub duplicates: usize,
    /// Files classified as Unknown
    pub skipped_unknown: usize,
    /// Files whose extraction failed
    pub extraction_failed: usize,
    /// Files whose persist failed
    pub persist_failed: usize,
    /// Files whose text could not be read
    pub format_errors: usize,
    /// Files never started (cancelled or halted)
    pub not_started: usize,
    /// Rows written per category
    pub appended_by_category: BTreeMap<Category, usize>,
}

impl RunSummary {
    /// Summary for `discovered` work items, nothing processed yet
    pub fn new(discovered: usize) -> Self {
        Self {
            discovered,
            ..Self::default()
        }
    }

    /// Count one outcome
    pub fn record(&mut self, outcome: &FileOutcome) {
        if outcome.status != FileStatus::NotStarted {
            self.processed += 1;
        }
        match outcome.status {
            FileStatus::Appended => {
                self.appended += 1;
                if let Some(category) = outcome.category {
                    *self.appended_by_category.entry(category).or_insert(0) += 1;
                }
            }
            FileStatus::Duplicate => self.duplicates += 1,
            FileStatus::SkippedUnknown => self.skipped_unknown += 1,
            FileStatus::ExtractionFailed => self.extraction_failed += 1,
            FileStatus::PersistFailed => self.persist_failed += 1,
            FileStatus::FormatError => self.format_errors += 1,
            FileStatus::NotStarted => self.not_started += 1,
        }
    }

    /// Appended plus duplicates
    pub fn succeeded(&self) -> usize {
        self.appended + self.duplicates
    }

    /// Files classified as Unknown
    pub fn skipped(&self) -> usize {
        self.skipped_unknown
    }

    /// Extraction, persist and format failures
    pub fn failed(&self) -> usize {
        self.extraction_failed + self.persist_failed + self.format_errors
    }

    /// Multi-line human readable report
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Run Summary".to_string(),
            "===========".to_string(),
            format!("Discovered: {}", self.discovered),
            format!("Processed: {}", self.processed),
            format!("Succeeded: {} (appended {}, duplicates {})", self.succeeded(), self.appended, self.duplicates),
            format!("Skipped: {} (unknown category)", self.skipped()),
            format!(
                "Failed: {} (extraction {}, persist {}, format {})",
                self.failed(),
                self.extraction_failed,
                self.persist_failed,
                self.format_errors
            ),
        ];
        if self.not_started > 0 {
            lines.push(format!("Not started: {}", self.not_started));
        }
        if !self.appended_by_category.is_empty() {
            lines.push(String::new());
            lines.push("Rows appended by category:".to_string());
            for (category, count) in &self.appended_by_category {
                lines.push(format!("  {}: {}", category, count));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(status: FileStatus) -> FileOutcome {
        FileOutcome::new(PathBuf::from("a.docx"), SourceId::new("a.docx"), status, Stage::Discovered)
    }

    #[test]
    fn test_summary_totals() {
        let mut summary = RunSummary::new(8);
        for status in [
            FileStatus::Appended,
            FileStatus::Duplicate,
            FileStatus::SkippedUnknown,
            FileStatus::ExtractionFailed,
            FileStatus::PersistFailed,
            FileStatus::FormatError,
            FileStatus::NotStarted,
            FileStatus::NotStarted,
        ] {
            summary.record(&outcome(status));
        }
        assert_eq!(summary.processed, 6);
        assert_eq!(summary.succeeded(), 2);
        assert_eq!(summary.skipped(), 1);
        assert_eq!(summary.failed(), 3);
        assert_eq!(summary.not_started, 2);
        assert_eq!(summary.processed + summary.not_started, summary.discovered);
    }

    #[test]
    fn test_appended_by_category() {
        let mut summary = RunSummary::new(2);
        summary.record(&outcome(FileStatus::Appended).with_category(Category::PolicyDocument));
        summary.record(&outcome(FileStatus::Appended).with_category(Category::PolicyDocument));
        assert_eq!(summary.appended_by_category.get(&Category::PolicyDocument), Some(&2));
        assert!(summary.summary().contains("PolicyDocument: 2"));
    }

    #[test]
    fn test_status_classes() {
        assert!(FileStatus::Duplicate.is_success());
        assert!(!FileStatus::SkippedUnknown.is_success());
        assert!(!FileStatus::SkippedUnknown.is_failure());
        assert!(FileStatus::FormatError.is_failure());
        assert!(!FileStatus::NotStarted.is_failure());
    }
}
