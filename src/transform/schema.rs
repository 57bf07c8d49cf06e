//! Tool schema sanitizer.
//!
//! Some backends reject JSON-schema keywords they do not implement
//! (`format`, `minLength`, `minItems`). Rather than drop the constraint, each
//! removed keyword is folded into the node's `description` so the model still
//! sees it:
//!
//! ```json
//! {"type": "string", "format": "date", "description": "Start day"}
//! ```
//! becomes
//! ```json
//! {"type": "string", "description": "Start day (format is date)"}
//! ```

use serde_json::{Map, Value};

use crate::transformer::Transformer;

/// Return a sanitized copy of `schema`.
///
/// Walks `properties` of object nodes and `items` of array nodes only; every
/// other subschema (including `anyOf`/`oneOf`/`allOf`) is copied as is.
/// Non-object nodes have nowhere to put a note and come back unchanged.
pub fn sanitize_schema(schema: &Value) -> Value {
    let Value::Object(node) = schema else {
        return schema.clone();
    };

    let mut out = Map::with_capacity(node.len());
    let mut notes: Vec<String> = Vec::new();
    let node_type = node.get("type").and_then(Value::as_str);

    for (key, value) in node {
        match key.as_str() {
            "properties" if node_type == Some("object") => {
                out.insert(key.clone(), sanitize_properties(value));
            }
            "items" if node_type == Some("array") => {
                out.insert(key.clone(), sanitize_items(value));
            }
            "minItems" if node_type == Some("array") => {}
            "format" | "minLength" | "description" => {}
            _ => {
                out.insert(key.clone(), value.clone());
            }
        }
    }

    if node_type == Some("array") {
        if let Some(min_items) = node.get("minItems") {
            notes.push(format!(
                "(minimum number of items is {})",
                render(min_items)
            ));
        }
    }
    if let Some(format) = node.get("format") {
        notes.push(format!("(format is {})", render(format)));
    }
    if let Some(min_length) = node.get("minLength") {
        notes.push(format!("(minimum length is {})", render(min_length)));
    }

    match (node.get("description"), notes.is_empty()) {
        (Some(description), true) => {
            out.insert("description".to_string(), description.clone());
        }
        (description, false) => {
            // A structured description keeps its JSON text ahead of the notes.
            let mut text = match description {
                None | Some(Value::Null) => String::new(),
                Some(description) => render(description),
            };
            for note in notes {
                if !text.is_empty() {
                    text.push(' ');
                }
                text.push_str(&note);
            }
            out.insert("description".to_string(), Value::String(text));
        }
        (None, true) => {}
    }

    Value::Object(out)
}

fn sanitize_properties(properties: &Value) -> Value {
    match properties {
        Value::Object(props) => Value::Object(
            props
                .iter()
                .map(|(name, prop)| (name.clone(), sanitize_schema(prop)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn sanitize_items(items: &Value) -> Value {
    match items {
        // Tuple validation: one schema per position.
        Value::Array(schemas) => Value::Array(schemas.iter().map(sanitize_schema).collect()),
        other => sanitize_schema(other),
    }
}

/// Strings render bare, everything else as JSON.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Sanitizes `input_schema` of every entry in `tools`.
#[derive(Debug, Clone, Default)]
pub struct SchemaSanitizeTransformer;

impl Transformer for SchemaSanitizeTransformer {
    fn name(&self) -> &str {
        "schema-sanitize"
    }

    fn transform_request(&self, mut request: Value) -> Value {
        if let Some(tools) = request.get_mut("tools").and_then(Value::as_array_mut) {
            for tool in tools {
                if let Some(schema) = tool.get_mut("input_schema") {
                    *schema = sanitize_schema(schema);
                }
            }
        }
        request
    }
}
