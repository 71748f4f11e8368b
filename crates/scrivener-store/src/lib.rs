//! Scrivener Storage Layer
//!
//! Appends extraction records to one Excel workbook per category.
//!
//! # Architecture
//!
//! - One `.xlsx` file per known category, inside the output directory
//! - Header row = schema field names + `SourceDocument`
//! - Source identity is unique per workbook; re-persisting is a no-op
//! - Every write reads the whole workbook, appends one row, writes a
//!   temporary file next to the target and renames it into place
//!
//! # Examples
//!
//! ```no_run
//! use scrivener_domain::SchemaRegistry;
//! use scrivener_store::{WorkbookLayout, WorkbookStore};
//! use std::sync::Arc;
//!
//! let layout = WorkbookLayout::new("output");
//! let store = WorkbookStore::new(layout, Arc::new(SchemaRegistry::builtin()));
//! // store.persist(&record) appends or reports a duplicate
//! ```

#![warn(missing_docs)]

mod layout;
mod sheet;
mod store;

use scrivener_domain::Category;
use std::path::PathBuf;
use thiserror::Error;

pub use layout::{WorkbookLayout, DEFAULT_SHEET_NAME};
pub use sheet::{header_key, Cell};
pub use store::WorkbookStore;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Category has no workbook (Unknown)
    #[error("No workbook for category {0}")]
    NoWorkbook(Category),

    /// Category has no schema
    #[error("No schema for category {0}")]
    NoSchema(Category),

    /// Existing workbook or template could not be read
    #[error("Failed to read {path}: {reason}")]
    Read {
        /// Workbook path
        path: PathBuf,
        /// Parser message
        reason: String,
    },

    /// Workbook could not be written or moved into place
    #[error("Failed to write {path}: {reason}")]
    Write {
        /// Workbook path
        path: PathBuf,
        /// Writer message
        reason: String,
    },

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
