//! Prompt templates for classification and field extraction
//!
//! Templates use `{name}` placeholders. The document text is substituted
//! last so that braces inside documents are never mistaken for
//! placeholders.

use scrivener_domain::{Category, FieldKind, FieldSchema};
use std::borrow::Cow;
use std::collections::BTreeMap;

/// Appended to document text cut at `max_text_length`
pub const TRUNCATION_MARKER: &str = "\n[文本已截断...]";

/// Cut `text` to at most `max_chars` characters and mark the cut
///
/// Character based, so a UTF-8 code point is never split.
pub fn truncate(text: &str, max_chars: usize) -> Cow<'_, str> {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => Cow::Owned(format!("{}{}", &text[..byte_idx], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// The prompt templates used for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSet {
    classification: String,
    extraction: BTreeMap<Category, String>,
    descriptions: BTreeMap<Category, String>,
}

impl PromptSet {
    /// Replace the classification template (`{categories}`, `{content}`)
    pub fn with_classification_template(mut self, template: impl Into<String>) -> Self {
        self.classification = template.into();
        self
    }

    /// Replace one category's extraction template (`{fields}`, `{format}`, `{content}`)
    pub fn with_extraction_template(mut self, category: Category, template: impl Into<String>) -> Self {
        self.extraction.insert(category, template.into());
        self
    }

    /// Replace a category description shown to the classifier
    pub fn with_description(mut self, category: Category, description: impl Into<String>) -> Self {
        self.descriptions.insert(category, description.into());
        self
    }

    /// Check that every template carries its required placeholders
    pub fn validate(&self) -> Result<(), String> {
        for placeholder in ["{categories}", "{content}"] {
            if !self.classification.contains(placeholder) {
                return Err(format!("classification template lacks {}", placeholder));
            }
        }
        for (category, template) in &self.extraction {
            for placeholder in ["{fields}", "{content}"] {
                if !template.contains(placeholder) {
                    return Err(format!("extraction template for {} lacks {}", category, placeholder));
                }
            }
        }
        Ok(())
    }

    /// Description of a category as shown to the classifier
    pub fn description(&self, category: Category) -> &str {
        self.descriptions
            .get(&category)
            .map(String::as_str)
            .unwrap_or_else(|| category.description())
    }

    /// Build the classification prompt for already truncated text
    pub fn classification_prompt(&self, content: &str) -> String {
        let categories = Category::KNOWN
            .iter()
            .map(|c| format!("- {}: {}", c.as_str(), self.description(*c)))
            .collect::<Vec<_>>()
            .join("\n");

        self.classification
            .replace("{categories}", &categories)
            .replace("{content}", content)
    }

    /// Build the extraction prompt for already truncated text
    pub fn extraction_prompt(&self, schema: &FieldSchema, content: &str) -> String {
        let template = self
            .extraction
            .get(&schema.category())
            .map(String::as_str)
            .unwrap_or(DEFAULT_EXTRACTION_TEMPLATE);

        template
            .replace("{fields}", &field_list(schema))
            .replace("{format}", &format_skeleton(schema))
            .replace("{content}", content)
    }
}

impl Default for PromptSet {
    fn default() -> Self {
        Self {
            classification: DEFAULT_CLASSIFICATION_TEMPLATE.to_string(),
            extraction: BTreeMap::new(),
            descriptions: BTreeMap::new(),
        }
    }
}

fn field_list(schema: &FieldSchema) -> String {
    schema
        .model_fields()
        .map(|field| {
            let mut line = format!("- {}", field.name);
            if field.required {
                line.push_str(" (required)");
            }
            line.push_str(": ");
            line.push_str(&field.description);
            match &field.kind {
                FieldKind::Choice { options, .. } => {
                    line.push_str(" Allowed values: ");
                    line.push_str(&options.join("、"));
                }
                FieldKind::Date => line.push_str(" Format: YYYY-MM-DD."),
                FieldKind::Number => line.push_str(" Digits only."),
                _ => {}
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_skeleton(schema: &FieldSchema) -> String {
    let keys = schema
        .model_fields()
        .map(|f| format!("  {}: \"\"", serde_json::Value::String(f.name.clone())))
        .collect::<Vec<_>>()
        .join(",\n");
    format!("{{\n{}\n}}", keys)
}

const DEFAULT_CLASSIFICATION_TEMPLATE: &str = r#"You are a document classification expert. Read the document below and decide which one of these categories it belongs to:

{categories}

Distinguishing rules:
- A letter (函, e.g. "关于XX的函") is an OfficialDocument.
- Meeting notices and meeting minutes are MeetingMaterial.
- A general notice (通知) that does not organise a meeting is an OfficialDocument.

Document:
---
{content}
---

Reply with exactly one category name from the list above and nothing else."#;

const DEFAULT_EXTRACTION_TEMPLATE: &str = r#"You are an information extraction expert. Extract the following fields from the document below.

Fields:
{fields}

Use an empty string for any field the document does not state. Never invent values.

Document:
---
{content}
---

Return ONLY a JSON object with exactly these keys, no markdown code blocks, no explanations:
{format}"#;
