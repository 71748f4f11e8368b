//! In-memory workbook model plus calamine reading and rust_xlsxwriter writing

use crate::StoreError;
use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use rust_xlsxwriter::{Format, Formula, Workbook};
use std::path::Path;

/// One cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// No value
    Empty,
    /// Text
    Text(String),
    /// Number
    Number(f64),
    /// Boolean
    Bool(bool),
    /// Date or date-time as an Excel serial number
    DateTime(f64),
    /// Elapsed time as an Excel serial number
    Duration(f64),
    /// Formula text (without the leading `=`) and its last computed value
    Formula {
        /// Formula text
        formula: String,
        /// Value computed when the file was last saved
        cached: Box<Cell>,
    },
}

impl Cell {
    /// Cell as text, numbers printed without a trailing `.0`
    pub fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.clone(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::Bool(b) => b.to_string(),
            Cell::DateTime(n) | Cell::Duration(n) => n.to_string(),
            Cell::Formula { cached, .. } => cached.as_text(),
        }
    }

    /// Whether the cell holds nothing visible
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Formula { formula, cached } => formula.trim().is_empty() && cached.is_blank(),
            _ => false,
        }
    }

    /// Integer value of a numeric or numeric-text cell
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Cell::Number(n) if n.is_finite() => Some(*n as i64),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Formula { cached, .. } => cached.as_integer(),
            _ => None,
        }
    }
}

impl Cell {
    /// Value cell combined with the formula stored at the same position
    fn with_formula(self, formula: Option<&String>) -> Self {
        match formula {
            Some(f) if !f.trim().is_empty() => Cell::Formula {
                formula: f.clone(),
                cached: Box::new(self),
            },
            _ => self,
        }
    }
}

impl From<&Data> for Cell {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => Cell::Empty,
            Data::String(s) => Cell::Text(s.clone()),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Float(f) => Cell::Number(*f),
            Data::Bool(b) => Cell::Bool(*b),
            Data::DateTime(dt) if dt.is_duration() => Cell::Duration(dt.as_f64()),
            Data::DateTime(dt) => Cell::DateTime(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Error(e) => Cell::Text(e.to_string()),
        }
    }
}

/// Column key of a header cell
///
/// A header such as `PolicyCategory(文件类别)` has key `PolicyCategory`;
/// both ASCII and full-width brackets start the annotation.
pub fn header_key(header: &str) -> &str {
    let end = header.find(['(', '（']).unwrap_or(header.len());
    header[..end].trim()
}

/// A sheet as a dense grid anchored at A1
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Header keys, empty when the first row is blank or missing
    pub fn header_keys(&self) -> Vec<String> {
        match self.rows.first() {
            Some(row) if row.iter().any(|c| !c.is_blank()) => {
                row.iter().map(|c| header_key(&c.as_text()).to_string()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Drop blank rows below the last row with content
    pub fn trim_trailing_blank_rows(&mut self) {
        while self.rows.len() > 1 && self.rows.last().is_some_and(|r| r.iter().all(Cell::is_blank)) {
            self.rows.pop();
        }
    }

    /// Data rows (everything below the header)
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.rows.get(1..).unwrap_or(&[])
    }
}

/// Read every sheet of an `.xlsx` file
pub(crate) fn read_workbook(path: &Path) -> Result<Vec<Sheet>, StoreError> {
    let read_err = |reason: String| StoreError::Read {
        path: path.to_path_buf(),
        reason,
    };

    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|e| read_err(format!("{}", e)))?;
    let mut sheets = Vec::new();

    for name in workbook.sheet_names() {
        let range = workbook
            .worksheet_range(&name)
            .map_err(|e| read_err(format!("sheet '{}': {}", name, e)))?;

        let formulas = workbook
            .worksheet_formula(&name)
            .map_err(|e| read_err(format!("sheet '{}' formulas: {}", name, e)))?;

        let mut sheet = Sheet::new(name);
        if let Some((start_row, start_col)) = range.start() {
            sheet.rows.extend(std::iter::repeat_with(Vec::new).take(start_row as usize));
            for (offset, row) in range.rows().enumerate() {
                let r = start_row + offset as u32;
                let mut cells = vec![Cell::Empty; start_col as usize];
                cells.extend(row.iter().enumerate().map(|(i, data)| {
                    let c = start_col + i as u32;
                    Cell::from(data).with_formula(formula_at(&formulas, r, c))
                }));
                sheet.rows.push(cells);
            }
        }
        sheets.push(sheet);
    }

    Ok(sheets)
}

fn formula_at(formulas: &Range<String>, row: u32, col: u32) -> Option<&String> {
    if formulas.is_empty() {
        return None;
    }
    formulas.get_value((row, col))
}

/// Write sheets to `path`, replacing any existing file
pub(crate) fn write_workbook(path: &Path, sheets: &[Sheet]) -> Result<(), StoreError> {
    let write_err = |reason: String| StoreError::Write {
        path: path.to_path_buf(),
        reason,
    };

    let date = Format::new().set_num_format("yyyy-mm-dd");
    let date_time = Format::new().set_num_format("yyyy-mm-dd hh:mm:ss");
    let duration = Format::new().set_num_format("[h]:mm:ss");

    let mut workbook = Workbook::new();
    for sheet in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&sheet.name)
            .map_err(|e| write_err(format!("sheet name '{}': {}", sheet.name, e)))?;

        for (r, row) in sheet.rows.iter().enumerate() {
            let r = u32::try_from(r).map_err(|_| write_err("too many rows".to_string()))?;
            for (c, cell) in row.iter().enumerate() {
                let c = u16::try_from(c).map_err(|_| write_err("too many columns".to_string()))?;
                let result = match cell {
                    Cell::Empty => continue,
                    Cell::Text(s) => worksheet.write_string(r, c, s).map(|_| ()),
                    Cell::Number(n) => worksheet.write_number(r, c, *n).map(|_| ()),
                    Cell::Bool(b) => worksheet.write_boolean(r, c, *b).map(|_| ()),
                    Cell::DateTime(n) => {
                        let format = if n.fract() == 0.0 { &date } else { &date_time };
                        worksheet.write_number_with_format(r, c, *n, format).map(|_| ())
                    }
                    Cell::Duration(n) => worksheet.write_number_with_format(r, c, *n, &duration).map(|_| ()),
                    Cell::Formula { formula, cached } => {
                        let formula = Formula::new(formula.as_str()).set_result(cached.as_text());
                        worksheet.write_formula(r, c, formula).map(|_| ())
                    }
                };
                result.map_err(|e| write_err(format!("cell ({}, {}): {}", r, c, e)))?;
            }
        }
    }

    workbook.save(path).map_err(|e| write_err(e.to_string()))
}
