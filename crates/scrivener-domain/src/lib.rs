//! Scrivener Domain Layer
//!
//! Core vocabulary of the classify-then-extract pipeline. This crate has no
//! external dependencies; the other crates depend on it for the shared types
//! and for the trait seams infrastructure implements.
//!
//! ## Key Concepts
//!
//! - **Category**: closed set of document kinds, plus `Unknown`
//! - **FieldSchema**: ordered, typed field list for one category
//! - **Document**: a source file's identity and text
//! - **ExtractionRecord**: validated field values in schema order
//! - **FileOutcome / RunSummary**: what happened to each file and the run

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod category;
pub mod document;
pub mod outcome;
pub mod record;
pub mod schema;
pub mod traits;

// Re-exports for convenience
pub use category::Category;
pub use document::{Document, SourceId};
pub use outcome::{FileOutcome, FileStatus, PersistResult, RunSummary, Stage};
pub use record::{ExtractionRecord, FieldIssue, FieldValue};
pub use schema::{FieldKind, FieldSchema, FieldSpec, SchemaRegistry, SOURCE_COLUMN};
pub use traits::TextExtractor;
