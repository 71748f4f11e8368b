//! Append-only workbook store

use crate::layout::WorkbookLayout;
use crate::sheet::{read_workbook, write_workbook, Cell, Sheet};
use crate::StoreError;
use scrivener_domain::{
    Category, ExtractionRecord, FieldKind, FieldSchema, PersistResult, SchemaRegistry, SOURCE_COLUMN,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

const ID_COLUMN: &str = "ID";
const OP_COLUMN: &str = "op";
const OP_INSERT: &str = "insert";

/// Persists extraction records into one workbook per category
///
/// Duplicate check and append happen under a per-category lock, so
/// concurrent workers never write the same workbook at once while
/// different categories proceed in parallel.
pub struct WorkbookStore {
    layout: WorkbookLayout,
    registry: Arc<SchemaRegistry>,
    locks: Mutex<HashMap<Category, Arc<Mutex<()>>>>,
}

impl WorkbookStore {
    /// Create a store; nothing is touched on disk until the first write
    pub fn new(layout: WorkbookLayout, registry: Arc<SchemaRegistry>) -> Self {
        Self {
            layout,
            registry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Workbook layout
    pub fn layout(&self) -> &WorkbookLayout {
        &self.layout
    }

    /// Append `record` to its category's workbook
    ///
    /// Blocking; async callers run it on the blocking pool. Never panics:
    /// every failure is reported as [`PersistResult::Failed`] and leaves the
    /// existing workbook as it was.
    pub fn persist(&self, record: &ExtractionRecord) -> PersistResult {
        match self.try_persist(record) {
            Ok(result) => result,
            Err(e) => {
                warn!(source = %record.source, category = %record.category, "persist failed: {}", e);
                PersistResult::Failed(e.to_string())
            }
        }
    }

    /// Number of data rows in a category's workbook; `None` if not created yet
    pub fn row_count(&self, category: Category) -> Result<Option<usize>, StoreError> {
        let path = self.path_for(category)?;
        if !path.exists() {
            return Ok(None);
        }
        let category_lock = self.lock_for(category);
        let _guard = lock(&category_lock);
        let sheets = read_workbook(&path)?;
        Ok(Some(match self.target_sheet(&sheets) {
            Some(index) => sheets[index]
                .data_rows()
                .iter()
                .filter(|row| row.iter().any(|c| !c.is_blank()))
                .count(),
            None => 0,
        }))
    }

    /// Source identities already stored for a category, in row order
    pub fn source_ids(&self, category: Category) -> Result<Vec<String>, StoreError> {
        let path = self.path_for(category)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let category_lock = self.lock_for(category);
        let _guard = lock(&category_lock);
        let sheets = read_workbook(&path)?;
        let Some(sheet) = self.target_sheet(&sheets).map(|i| &sheets[i]) else {
            return Ok(Vec::new());
        };
        let Some(column) = column_of(&sheet.header_keys(), SOURCE_COLUMN) else {
            return Ok(Vec::new());
        };
        Ok(sheet
            .data_rows()
            .iter()
            .filter_map(|row| row.get(column))
            .map(Cell::as_text)
            .filter(|s| !s.trim().is_empty())
            .collect())
    }

    fn try_persist(&self, record: &ExtractionRecord) -> Result<PersistResult, StoreError> {
        let category = record.category;
        let path = self.path_for(category)?;
        let schema = self
            .registry
            .schema_for(category)
            .ok_or(StoreError::NoSchema(category))?;

        let category_lock = self.lock_for(category);
        let _guard = lock(&category_lock);

        let mut sheets = self.load(category, &path)?;
        let index = match self.target_sheet(&sheets) {
            Some(index) => index,
            None => {
                sheets.push(Sheet::new(self.layout.sheet_name()));
                sheets.len() - 1
            }
        };
        let sheet = &mut sheets[index];

        let keys = ensure_header(sheet, schema, &path);
        let source_col = column_of(&keys, SOURCE_COLUMN).ok_or_else(|| StoreError::Write {
            path: path.clone(),
            reason: format!("header has no {} column", SOURCE_COLUMN),
        })?;

        let source = record.source.as_str();
        let duplicate = sheet
            .data_rows()
            .iter()
            .any(|row| row.get(source_col).is_some_and(|c| c.as_text().trim() == source));
        if duplicate {
            debug!(source, path = %path.display(), "source already present");
            return Ok(PersistResult::Duplicate);
        }

        let row = build_row(sheet, &keys, schema, record);
        sheet.trim_trailing_blank_rows();
        sheet.rows.push(row);
        let row_number = sheet.rows.len();

        self.commit(&path, &sheets)?;
        info!(source, row = row_number, path = %path.display(), "row appended");
        Ok(PersistResult::Appended { row: row_number })
    }

    /// Existing workbook, else the template, else nothing
    fn load(&self, category: Category, path: &Path) -> Result<Vec<Sheet>, StoreError> {
        if path.exists() {
            return read_workbook(path);
        }
        if let Some(template) = self.layout.template_for(category).filter(|t| t.is_file()) {
            info!(template = %template.display(), "seeding workbook from template");
            return read_workbook(&template);
        }
        info!(path = %path.display(), "creating workbook");
        Ok(Vec::new())
    }

    /// Write to a temporary file beside `path`, then rename over it
    fn commit(&self, path: &Path, sheets: &[Sheet]) -> Result<(), StoreError> {
        let dir = self.layout.output_dir();
        std::fs::create_dir_all(dir)?;

        let temp = tempfile::Builder::new()
            .prefix(".scrivener-")
            .suffix(".xlsx")
            .tempfile_in(dir)?
            .into_temp_path();
        write_workbook(&temp, sheets)?;
        temp.persist(path).map_err(|e| StoreError::Write {
            path: path.to_path_buf(),
            reason: e.error.to_string(),
        })
    }

    fn target_sheet(&self, sheets: &[Sheet]) -> Option<usize> {
        sheets
            .iter()
            .position(|s| s.name == self.layout.sheet_name())
            .or_else(|| (!sheets.is_empty()).then_some(0))
    }

    fn path_for(&self, category: Category) -> Result<PathBuf, StoreError> {
        self.layout.path_for(category).ok_or(StoreError::NoWorkbook(category))
    }

    fn lock_for(&self, category: Category) -> Arc<Mutex<()>> {
        lock(&self.locks).entry(category).or_default().clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn column_of(keys: &[String], key: &str) -> Option<usize> {
    keys.iter().position(|k| k == key)
}

/// Write the header if the sheet has none, append any missing schema
/// columns otherwise; returns the header keys
fn ensure_header(sheet: &mut Sheet, schema: &FieldSchema, path: &Path) -> Vec<String> {
    let expected = schema.header();
    let mut keys = sheet.header_keys();

    if keys.is_empty() {
        let header = expected.iter().cloned().map(Cell::Text).collect();
        match sheet.rows.first_mut() {
            Some(first) => *first = header,
            None => sheet.rows.push(header),
        }
        return expected;
    }

    let header = &mut sheet.rows[0];
    while header.last().is_some_and(Cell::is_blank) {
        header.pop();
        keys.pop();
    }
    let missing: Vec<String> = expected.into_iter().filter(|name| !keys.contains(name)).collect();
    if !missing.is_empty() {
        info!(path = %path.display(), columns = ?missing, "adding columns to workbook header");
        for name in missing {
            header.push(Cell::Text(name.clone()));
            keys.push(name);
        }
    }
    keys
}

fn build_row(sheet: &Sheet, keys: &[String], schema: &FieldSchema, record: &ExtractionRecord) -> Vec<Cell> {
    keys.iter()
        .enumerate()
        .map(|(col, key)| {
            if key == SOURCE_COLUMN {
                return Cell::Text(record.source.as_str().to_string());
            }
            if let Some(spec) = schema.field(key) {
                let value = record.get(key).map(|v| v.value.as_str()).unwrap_or_default();
                return match spec.kind {
                    FieldKind::Number if !value.is_empty() => {
                        value.parse::<f64>().map(Cell::Number).unwrap_or_else(|_| Cell::Text(value.to_string()))
                    }
                    _ if value.is_empty() => Cell::Empty,
                    _ => Cell::Text(value.to_string()),
                };
            }
            if key == ID_COLUMN {
                return Cell::Number(next_id(sheet, col) as f64);
            }
            if key.eq_ignore_ascii_case(OP_COLUMN) {
                return Cell::Text(OP_INSERT.to_string());
            }
            Cell::Empty
        })
        .collect()
}

fn next_id(sheet: &Sheet, col: usize) -> i64 {
    sheet
        .data_rows()
        .iter()
        .filter_map(|row| row.get(col).and_then(Cell::as_integer))
        .max()
        .unwrap_or(0)
        .max(0)
        + 1
}
