//! Rich-content flattening.
//!
//! Documents are authored as a JSON node tree (objects with an optional
//! `text` leaf and a `content` child array, the shape rich-text editors
//! persist). The mention scanner only ever sees the flattened plain text
//! produced here.

use serde_json::Value;
use thiserror::Error;

/// Node types that contribute a line break between blocks.
const BLOCK_NODE_TYPES: &[&str] = &[
    "paragraph",
    "heading",
    "scene_break",
    "list_item",
    "blockquote",
    "code_block",
];

#[derive(Error, Debug)]
pub enum FlattenError {
    #[error("content root must be a string or a node tree, got {0}")]
    UnsupportedRoot(&'static str),

    #[error("unsupported node of type {0} in content tree")]
    UnsupportedNode(&'static str),

    #[error("`text` field must be a string")]
    NonStringText,
}

/// Flatten rich content to plain text.
///
/// Text leaves are concatenated in document order; block-level nodes are
/// separated by a single newline. Plain-string content passes through
/// unchanged.
pub fn flatten_content(content: &Value) -> Result<String, FlattenError> {
    match content {
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) | Value::Array(_) => {
            let mut out = String::new();
            walk(content, &mut out)?;
            while out.ends_with('\n') {
                out.pop();
            }
            Ok(out)
        }
        other => Err(FlattenError::UnsupportedRoot(json_type_name(other))),
    }
}

fn walk(node: &Value, out: &mut String) -> Result<(), FlattenError> {
    match node {
        Value::Array(items) => {
            for item in items {
                walk(item, out)?;
            }
        }
        Value::Object(map) => {
            let is_block = map
                .get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| BLOCK_NODE_TYPES.contains(&t));
            if is_block && !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            if let Some(text) = map.get("text") {
                let s = text.as_str().ok_or(FlattenError::NonStringText)?;
                out.push_str(s);
            }
            if let Some(children) = map.get("content") {
                walk(children, out)?;
            }
        }
        Value::String(s) => out.push_str(s),
        Value::Null => {}
        other => return Err(FlattenError::UnsupportedNode(json_type_name(other))),
    }
    Ok(())
}

const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
