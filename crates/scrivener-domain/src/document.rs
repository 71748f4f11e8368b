//! Document module - a source file and its extracted text

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

/// Stable identity of a source document
///
/// The path of the file relative to the input directory, with `/`
/// separators regardless of platform. Used as the duplicate key in every
/// workbook, so it must not depend on where the input directory lives.
///
/// # Examples
///
/// ```
/// use scrivener_domain::SourceId;
/// use std::path::Path;
///
/// let id = SourceId::from_paths(Path::new("/data/in"), Path::new("/data/in/sub/a.docx")).unwrap();
/// assert_eq!(id.as_str(), "sub/a.docx");
/// assert_eq!(id.file_stem(), "a");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceId(String);

impl SourceId {
    /// Wrap an already normalised identity (as read back from a workbook)
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Derive the identity of `path` relative to `root`
    ///
    /// Returns `None` when `path` is not inside `root` or has no file name.
    pub fn from_paths(root: &Path, path: &Path) -> Option<Self> {
        let relative = path.strip_prefix(root).ok()?;
        let mut parts = Vec::new();
        for component in relative.components() {
            match component {
                Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
                Component::CurDir => {}
                _ => return None,
            }
        }
        if parts.is_empty() {
            return None;
        }
        Some(Self(parts.join("/")))
    }

    /// Identity as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Final path segment without its extension
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A document read from the input directory
///
/// Immutable once read.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Absolute or working-directory-relative path of the file
    pub path: PathBuf,

    /// Identity used for duplicate detection
    pub source: SourceId,

    /// Preprocessed text content
    pub text: String,

    /// File size in bytes
    pub size: u64,

    /// Last modification time, when the platform reports one
    pub modified: Option<SystemTime>,
}

impl Document {
    /// Create a document from its parts
    pub fn new(path: PathBuf, source: SourceId, text: String, size: u64, modified: Option<SystemTime>) -> Self {
        Self {
            path,
            source,
            text,
            size,
            modified,
        }
    }

    /// Length of the text in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_id_is_relative_with_forward_slashes() {
        let root = Path::new("in");
        let path = root.join("2024").join("report.pdf");
        let id = SourceId::from_paths(root, &path).unwrap();
        assert_eq!(id.as_str(), "2024/report.pdf");
        assert_eq!(id.file_name(), "report.pdf");
        assert_eq!(id.file_stem(), "report");
    }

    #[test]
    fn test_source_id_outside_root() {
        assert!(SourceId::from_paths(Path::new("in"), Path::new("out/a.docx")).is_none());
        assert!(SourceId::from_paths(Path::new("in"), Path::new("in")).is_none());
    }

    #[test]
    fn test_file_stem_edge_cases() {
        assert_eq!(SourceId::new("a.b.docx").file_stem(), "a.b");
        assert_eq!(SourceId::new("noext").file_stem(), "noext");
        assert_eq!(SourceId::new(".hidden").file_stem(), ".hidden");
        assert_eq!(SourceId::new("关于印发方案的通知.doc").file_stem(), "关于印发方案的通知");
    }

    #[test]
    fn test_char_len_counts_characters() {
        let doc = Document::new(
            PathBuf::from("a.docx"),
            SourceId::new("a.docx"),
            "会议纪要".to_string(),
            12,
            None,
        );
        assert_eq!(doc.char_len(), 4);
    }
}
