//! Scrivener Ingest Layer
//!
//! Finds work items in the input directory and turns each into plain text.
//!
//! | Extension | Reader |
//! |-----------|--------|
//! | `.docx`   | zip container + `word/document.xml` |
//! | `.pdf`    | `pdf-extract` text layer |
//! | `.doc`    | external `antiword` tool |
//!
//! Every error is per-file recoverable: the pipeline records it as a
//! format error and moves on.

#![warn(missing_docs)]

pub mod doc;
pub mod docx;
pub mod pdf;

use scrivener_domain::TextExtractor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default name of the antiword executable
pub const DEFAULT_ANTIWORD: &str = "antiword";

/// Errors that can occur while reading documents
#[derive(Error, Debug)]
pub enum IngestError {
    /// Extension is not one of the supported formats
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File could not be parsed
    #[error("Corrupt document {path}: {reason}")]
    CorruptDocument {
        /// File path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// File parsed but contained no text
    #[error("No text in {0}")]
    Empty(PathBuf),

    /// External converter is not installed
    #[error("External tool not found: {0}")]
    ToolMissing(String),

    /// Input directory does not exist or is not a directory
    #[error("Input directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl IngestError {
    pub(crate) fn corrupt(path: &Path, reason: impl Into<String>) -> Self {
        IngestError::CorruptDocument {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        IngestError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Supported document formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    /// Office Open XML word processing document
    Docx,
    /// Legacy Word binary document
    Doc,
    /// Portable Document Format
    Pdf,
}

impl DocumentFormat {
    /// Detect the format from the file extension, case-insensitively
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(DocumentFormat::Docx),
            "doc" => Some(DocumentFormat::Doc),
            "pdf" => Some(DocumentFormat::Pdf),
            _ => None,
        }
    }
}

/// Whether a file name marks a hidden file or an Office lock file
fn is_ignored_name(name: &str) -> bool {
    name.starts_with('.') || name.starts_with("~$")
}

/// List the work items under `root`, sorted by path
///
/// Only the top level is scanned unless `recursive` is set. Hidden entries
/// and Office lock files (`~$report.docx`) are skipped, as is anything
/// without a supported extension.
pub fn scan_documents(root: &Path, recursive: bool) -> Result<Vec<PathBuf>, IngestError> {
    if !root.is_dir() {
        return Err(IngestError::MissingDirectory(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_name(&e.file_name().to_string_lossy()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Skipping unreadable directory entry");
                continue;
            }
        };
        if entry.file_type().is_file() && DocumentFormat::from_path(entry.path()).is_some() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    info!(count = files.len(), root = %root.display(), "Scanned input directory");
    Ok(files)
}

/// Normalise extracted text
///
/// Line endings become `\n`, every line is trimmed and blank lines are
/// dropped.
pub fn preprocess_text(text: &str) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Text extractor for Word and PDF files
#[derive(Debug, Clone)]
pub struct DocumentReader {
    antiword: PathBuf,
}

impl DocumentReader {
    /// Reader using `antiword` from `PATH`
    pub fn new() -> Self {
        Self {
            antiword: PathBuf::from(DEFAULT_ANTIWORD),
        }
    }

    /// Use a specific antiword executable
    pub fn with_antiword(mut self, path: impl Into<PathBuf>) -> Self {
        self.antiword = path.into();
        self
    }

    /// Whether the antiword executable can be started
    pub fn antiword_available(&self) -> bool {
        doc::tool_available(&self.antiword)
    }

    fn read_raw(&self, path: &Path, format: DocumentFormat) -> Result<String, IngestError> {
        match format {
            DocumentFormat::Docx => docx::read_docx(path),
            DocumentFormat::Pdf => pdf::read_pdf(path),
            DocumentFormat::Doc => doc::read_doc(&self.antiword, path),
        }
    }
}

impl Default for DocumentReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractor for DocumentReader {
    type Error = IngestError;

    fn extract_text(&self, path: &Path) -> Result<String, Self::Error> {
        let format = DocumentFormat::from_path(path).ok_or_else(|| {
            IngestError::UnsupportedFormat(
                path.extension()
                    .map(|e| e.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "<none>".to_string()),
            )
        })?;

        let raw = self.read_raw(path, format)?;
        let text = preprocess_text(&raw);
        if text.is_empty() {
            return Err(IngestError::Empty(path.to_path_buf()));
        }

        debug!(path = %path.display(), ?format, chars = text.chars().count(), "Extracted text");
        Ok(text)
    }

    fn supports(&self, path: &Path) -> bool {
        DocumentFormat::from_path(path).is_some()
    }
}
