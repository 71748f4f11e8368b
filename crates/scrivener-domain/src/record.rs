//! Extraction records - validated field sets ready for persistence

use crate::{Category, FieldSchema, SourceId};
use std::fmt;

/// Validation flag attached to a field value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldIssue {
    /// Required field absent or blank in the model reply
    MissingRequired,
    /// Value could not be read as a date
    InvalidDate,
    /// Value could not be read as a number
    InvalidNumber,
    /// Value is not one of the allowed options and no fallback exists
    OutOfVocabulary,
}

impl FieldIssue {
    /// Short name for logs
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldIssue::MissingRequired => "missing_required",
            FieldIssue::InvalidDate => "invalid_date",
            FieldIssue::InvalidNumber => "invalid_number",
            FieldIssue::OutOfVocabulary => "out_of_vocabulary",
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field value plus an optional validation flag
///
/// Unparsable values keep their raw text so nothing the model produced is
/// silently dropped.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FieldValue {
    /// Cell text
    pub value: String,
    /// Validation flag, if any
    pub issue: Option<FieldIssue>,
}

impl FieldValue {
    /// A clean value
    pub fn ok(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            issue: None,
        }
    }

    /// A value with a validation flag
    pub fn flagged(value: impl Into<String>, issue: FieldIssue) -> Self {
        Self {
            value: value.into(),
            issue: Some(issue),
        }
    }

    /// Whether the value carries a flag
    pub fn is_flagged(&self) -> bool {
        self.issue.is_some()
    }
}

/// Structured result of extracting one document
///
/// Holds exactly the fields of its category's schema, in schema order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionRecord {
    /// Identity of the source document
    pub source: SourceId,
    /// Category the fields were extracted for
    pub category: Category,
    fields: Vec<(String, FieldValue)>,
}

impl ExtractionRecord {
    /// Build a record from a value lookup
    ///
    /// `value_of` is called once per schema field in order, which is what
    /// guarantees the record's shape matches the schema.
    pub fn from_schema<F>(source: SourceId, schema: &FieldSchema, mut value_of: F) -> Self
    where
        F: FnMut(&crate::FieldSpec) -> FieldValue,
    {
        let fields = schema
            .fields()
            .iter()
            .map(|spec| (spec.name.clone(), value_of(spec)))
            .collect();
        Self {
            source,
            category: schema.category(),
            fields,
        }
    }

    /// Fields in schema order
    pub fn fields(&self) -> &[(String, FieldValue)] {
        &self.fields
    }

    /// Look up a field value by name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Names of fields carrying a validation flag
    pub fn flagged_fields(&self) -> Vec<String> {
        self.fields
            .iter()
            .filter(|(_, v)| v.is_flagged())
            .map(|(n, v)| format!("{}:{}", n, v.issue.map(|i| i.as_str()).unwrap_or_default()))
            .collect()
    }

    /// Whether the record's field names equal the schema's, in order
    pub fn conforms_to(&self, schema: &FieldSchema) -> bool {
        self.category == schema.category()
            && self.fields.len() == schema.len()
            && self
                .fields
                .iter()
                .zip(schema.fields())
                .all(|((name, _), spec)| *name == spec.name)
    }
}
