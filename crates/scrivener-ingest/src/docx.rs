//! `.docx` reader
//!
//! Reads `word/document.xml` out of the zip container and walks it with
//! quick-xml. Paragraphs become lines; `<w:tab/>` and `<w:br/>` become a
//! tab and a line break; table rows become one line of non-empty cells
//! joined by ` | `.

use crate::IngestError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::Read;
use std::path::Path;

const DOCUMENT_PART: &str = "word/document.xml";

/// Read the text of a `.docx` file
pub fn read_docx(path: &Path) -> Result<String, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::io(path, e))?;
    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| IngestError::corrupt(path, format!("not a zip container: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| IngestError::corrupt(path, format!("missing {}: {}", DOCUMENT_PART, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| IngestError::corrupt(path, format!("unreadable {}: {}", DOCUMENT_PART, e)))?;

    parse_document_xml(&xml).map_err(|reason| IngestError::corrupt(path, reason))
}

#[derive(Default)]
struct TableState {
    cell: String,
    row: Vec<String>,
}

/// Extract text from the body of a WordprocessingML document
pub fn parse_document_xml(xml: &str) -> Result<String, String> {
    let mut reader = Reader::from_str(xml);
    let mut lines: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut tables: Vec<TableState> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"t" => in_text = true,
                b"p" => paragraph.clear(),
                b"tbl" => tables.push(TableState::default()),
                b"tc" => {
                    if let Some(table) = tables.last_mut() {
                        table.cell.clear();
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| format!("bad text at {}: {}", reader.buffer_position(), e))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    let text = paragraph.trim();
                    match tables.last_mut() {
                        Some(table) if !text.is_empty() => {
                            if !table.cell.is_empty() {
                                table.cell.push(' ');
                            }
                            table.cell.push_str(text);
                        }
                        Some(_) => {}
                        None if !text.is_empty() => lines.push(text.to_string()),
                        None => {}
                    }
                    paragraph.clear();
                }
                b"tc" => {
                    if let Some(table) = tables.last_mut() {
                        let cell = std::mem::take(&mut table.cell);
                        if !cell.trim().is_empty() {
                            table.row.push(cell.trim().to_string());
                        }
                    }
                }
                b"tr" => {
                    if let Some(table) = tables.last_mut() {
                        let row = std::mem::take(&mut table.row);
                        if !row.is_empty() {
                            let line = row.join(" | ");
                            // A nested table's rows land inside the enclosing cell
                            if tables.len() > 1 {
                                let outer = tables.len() - 2;
                                if !tables[outer].cell.is_empty() {
                                    tables[outer].cell.push(' ');
                                }
                                tables[outer].cell.push_str(&line);
                            } else {
                                lines.push(line);
                            }
                        }
                    }
                }
                b"tbl" => {
                    tables.pop();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("XML error at {}: {}", reader.buffer_position(), e)),
        }
    }

    Ok(lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn body(inner: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            inner
        )
    }

    #[test]
    fn test_paragraphs_and_runs() {
        let xml = body(
            "<w:p><w:r><w:t>关于印发</w:t></w:r><w:r><w:t xml:space=\"preserve\">实施方案 </w:t></w:r><w:r><w:t>的通知</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t>A</w:t><w:tab/><w:t>B</w:t><w:br/><w:t>C &amp; D</w:t></w:r></w:p>",
        );
        let text = parse_document_xml(&xml).unwrap();
        assert_eq!(text, "关于印发实施方案 的通知\nA\tB\nC & D");
    }

    #[test]
    fn test_table_rows_are_joined() {
        let xml = body(
            "<w:p><w:r><w:t>Intro</w:t></w:r></w:p>\
             <w:tbl>\
               <w:tr><w:tc><w:p><w:r><w:t>序号</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>单位</w:t></w:r></w:p></w:tc></w:tr>\
               <w:tr><w:tc><w:p><w:r><w:t>1</w:t></w:r></w:p></w:tc><w:tc><w:p/></w:tc><w:tc><w:p><w:r><w:t>区政府</w:t></w:r></w:p></w:tc></w:tr>\
             </w:tbl>\
             <w:p><w:r><w:t>Outro</w:t></w:r></w:p>",
        );
        let text = parse_document_xml(&xml).unwrap();
        assert_eq!(text, "Intro\n序号 | 单位\n1 | 区政府\nOutro");
    }

    #[test]
    fn test_malformed_xml() {
        assert!(parse_document_xml("<w:document><w:body><w:p></w:body>").is_err());
    }

    #[test]
    fn test_read_docx_from_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.docx");
        let mut writer = zip::ZipWriter::new(File::create(&path).unwrap());
        writer.start_file(DOCUMENT_PART, SimpleFileOptions::default()).unwrap();
        writer
            .write_all(body("<w:p><w:r><w:t>会议纪要</w:t></w:r></w:p>").as_bytes())
            .unwrap();
        writer.finish().unwrap();

        assert_eq!(read_docx(&path).unwrap(), "会议纪要");
    }

    #[test]
    fn test_read_docx_rejects_non_zip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.docx");
        std::fs::write(&path, b"plain text pretending to be docx").unwrap();
        assert!(matches!(read_docx(&path), Err(IngestError::CorruptDocument { .. })));
    }
}
