//! Parse model replies at the boundary

use scrivener_domain::Category;
use serde_json::{Map, Value};

/// Match a classification reply against the category labels
///
/// The trimmed reply must equal a label, ignoring ASCII case. Returns
/// `None` for anything else, including the config-style keys.
pub fn parse_category_reply(reply: &str) -> Option<Category> {
    let trimmed = reply.trim();
    Category::ALL
        .into_iter()
        .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
}

/// Find the JSON object in an extraction reply
///
/// Tried in order: the whole reply, the contents of the first markdown
/// code fence, the first balanced `{...}` block.
pub fn extract_json_object(reply: &str) -> Result<Map<String, Value>, String> {
    let trimmed = reply.trim();
    if trimmed.is_empty() {
        return Err("empty reply".to_string());
    }

    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return match value {
            Value::Object(map) => Ok(map),
            other => Err(format!("expected a JSON object, got {}", kind_of(&other))),
        };
    }

    if let Some(inner) = fenced_block(trimmed) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(inner.trim()) {
            return Ok(map);
        }
    }

    if let Some(block) = first_balanced_object(trimmed) {
        if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(block) {
            return Ok(map);
        }
    }

    Err(format!("no JSON object in reply: {}", trimmed.chars().take(200).collect::<String>()))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Contents of the first ``` fence, without its language tag
fn fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after = &text[start + 3..];
    let body_start = after.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

/// First `{...}` block whose braces balance, ignoring braces inside strings
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Render a reply value as cell text
///
/// Strings are kept, numbers and booleans are printed, arrays are joined
/// with `、`. `null` and blank strings count as absent.
pub fn value_to_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .filter_map(value_to_text)
            .collect::<Vec<_>>()
            .join("、"),
        Value::Object(_) => value.to_string(),
    };
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}
