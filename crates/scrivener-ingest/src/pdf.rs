//! `.pdf` reader backed by pdf-extract

use crate::IngestError;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tracing::warn;

/// Read the text layer of a PDF
///
/// Scanned PDFs without a text layer come back empty and are reported as
/// such by the caller. pdf-extract can panic on malformed input; a panic is
/// reported as a corrupt document.
pub fn read_pdf(path: &Path) -> Result<String, IngestError> {
    let bytes = std::fs::read(path).map_err(|e| IngestError::io(path, e))?;
    if !bytes.starts_with(b"%PDF-") {
        return Err(IngestError::corrupt(path, "missing %PDF- header"));
    }

    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(&bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(IngestError::corrupt(path, format!("pdf-extract failed: {}", e))),
        Err(_) => {
            warn!(path = %path.display(), "pdf-extract panicked");
            Err(IngestError::corrupt(path, "pdf-extract panicked while parsing"))
        }
    }
}
