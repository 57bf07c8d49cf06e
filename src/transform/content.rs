//! Content flattening for plain-text backends.
//!
//! Anthropic-style content may be a string or an array of typed blocks.
//! Backends that only take plain text get the concatenated `text` of the
//! text blocks; images, tool calls and other block types are dropped.

use serde_json::Value;

use crate::transformer::Transformer;

/// Flatten one content value into a string.
///
/// - string: unchanged
/// - array: in-order concatenation of `text` blocks and bare string blocks
/// - anything else: empty string
pub fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks.iter().map(block_text).collect(),
        _ => String::new(),
    }
}

fn block_text(block: &Value) -> &str {
    match block {
        Value::String(s) => s.as_str(),
        Value::Object(obj) if obj.get("type").and_then(Value::as_str) == Some("text") => {
            obj.get("text").and_then(Value::as_str).unwrap_or_default()
        }
        _ => "",
    }
}

/// Flatten `content` of every message in place. Messages without a
/// `content` key are left alone.
pub fn flatten_messages(messages: &mut [Value]) {
    for message in messages {
        if let Some(content) = message.get_mut("content") {
            if !content.is_string() {
                *content = Value::String(flatten_content(content));
            }
        }
    }
}

/// Flattens `messages[*].content` and `system`.
#[derive(Debug, Clone, Default)]
pub struct FlattenContentTransformer;

impl Transformer for FlattenContentTransformer {
    fn name(&self) -> &str {
        "flatten-content"
    }

    fn transform_request(&self, mut request: Value) -> Value {
        if let Some(messages) = request.get_mut("messages").and_then(Value::as_array_mut) {
            flatten_messages(messages);
        }
        if let Some(system) = request.get_mut("system") {
            if !system.is_string() {
                *system = Value::String(flatten_content(system));
            }
        }
        request
    }
}
