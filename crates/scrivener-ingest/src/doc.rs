//! Legacy `.doc` reader
//!
//! The binary Word format is converted by the external `antiword` tool.

use crate::IngestError;
use std::io::ErrorKind;
use std::path::Path;
use std::process::{Command, Stdio};

/// Run antiword on `path` and return its stdout
pub fn read_doc(antiword: &Path, path: &Path) -> Result<String, IngestError> {
    let output = Command::new(antiword)
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => IngestError::ToolMissing(antiword.display().to_string()),
            _ => IngestError::io(path, e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(IngestError::corrupt(
            path,
            format!("antiword exited with {}: {}", output.status, stderr.trim()),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Whether `antiword` can be started at all
pub fn tool_available(antiword: &Path) -> bool {
    Command::new(antiword)
        .arg("-h")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool() {
        let tool = Path::new("/nonexistent/bin/antiword");
        assert!(!tool_available(tool));
        let result = read_doc(tool, Path::new("a.doc"));
        assert!(matches!(result, Err(IngestError::ToolMissing(_))));
    }
}
