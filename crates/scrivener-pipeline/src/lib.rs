//! Scrivener Pipeline
//!
//! Runs a directory of documents through classification, field extraction
//! and workbook persistence.
//!
//! # Overview
//!
//! For every work item the [`Orchestrator`] walks one path through the
//! per-file states:
//!
//! | From | To | Trigger |
//! |------|----|---------|
//! | Discovered | TextExtracted | text read and preprocessed |
//! | Discovered | FormatError | unreadable, empty or unsupported document |
//! | TextExtracted | Classified | classifier returned a category |
//! | Classified | SkippedUnknown | category is Unknown |
//! | Classified | Extracted / ExtractionFailed | field extraction result |
//! | Extracted | Appended / Duplicate / PersistFailed | workbook write result |
//!
//! Outcomes are collected into a [`RunReport`] in discovery order. Only
//! an authentication failure stops a run early.
//!
//! # Concurrency
//!
//! `workers` files are in flight at once (default 1). Text extraction and
//! workbook writes run on the blocking pool; model calls are async and
//! bounded by the extractor's timeout. Cancellation is checked before each
//! file starts.

#![warn(missing_docs)]

mod config;
mod error;
mod orchestrator;
mod report;

pub use config::{PipelineConfig, MAX_WORKERS};
pub use error::PipelineError;
pub use orchestrator::Orchestrator;
pub use report::RunReport;
