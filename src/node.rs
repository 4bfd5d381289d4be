use log::{debug, warn};
use serde_json::Value;

use crate::error::{Result, ViewerError};
use crate::state::AppState;
use crate::types::{unescape_pointer_token, NodePath, PathSegment, Toggle};

/// Pretty-printed JSON of exactly this subtree.
pub fn copy_string(value: &Value) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// What the "copy value" affordance of a long string offers: the raw text.
pub fn copy_text(value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        other => copy_string(other),
    }
}

/// Resolves user input to a path inside `root`.
///
/// Accepts a JSON Pointer (`/users/0/email`) or a dotted label
/// (`users.0.email`, optionally prefixed by the root label). Dotted labels are
/// matched against the actual keys, so keys containing dots still resolve.
pub fn parse_path(input: &str, root: &Value, root_label: &str) -> Result<NodePath> {
    let input = input.trim();
    let invalid = || ViewerError::InvalidPath(input.to_string());

    if let Some(pointer) = input.strip_prefix('/') {
        let tokens: Vec<String> = pointer.split('/').map(unescape_pointer_token).collect();
        return resolve_tokens(root, &tokens, false).ok_or_else(invalid);
    }

    let rest = if input.is_empty() || input == root_label {
        ""
    } else if !root_label.is_empty() && input.starts_with(&format!("{root_label}.")) {
        &input[root_label.len() + 1..]
    } else {
        input
    };
    if rest.is_empty() {
        return Ok(NodePath::root());
    }
    let tokens: Vec<String> = rest.split('.').map(str::to_string).collect();
    resolve_tokens(root, &tokens, true).ok_or_else(invalid)
}

fn resolve_tokens(root: &Value, tokens: &[String], join_dots: bool) -> Option<NodePath> {
    let mut segments = Vec::new();
    let mut current = root;
    let mut i = 0;
    while i < tokens.len() {
        match current {
            Value::Array(items) => {
                let index: usize = tokens[i].parse().ok()?;
                current = items.get(index)?;
                segments.push(PathSegment::Index(index));
                i += 1;
            }
            Value::Object(map) => {
                // shortest run of tokens forming an existing key
                let last = if join_dots { tokens.len() } else { i + 1 };
                let (key, child, next) = (i + 1..=last).find_map(|end| {
                    let key = tokens[i..end].join(".");
                    map.get(&key).map(|child| (key, child, end))
                })?;
                current = child;
                segments.push(PathSegment::Key(key));
                i = next;
            }
            _ => return None,
        }
    }
    Some(NodePath::from_segments(segments))
}

/// Compact JSON of the displayed node at `path`.
pub fn get_node_value(path: &str, state: &AppState) -> Result<String> {
    state.with_viewer(|viewer| {
        let Some(displayed) = viewer.displayed() else {
            return Ok(Value::Null.to_string());
        };
        let node_path = parse_path(path, displayed, viewer.root_label())?;
        Ok(serde_json::to_string(viewer.lookup(&node_path)?)?)
    })
}

/// The copy string for the displayed node at `path`. Long strings yield their
/// raw text when `raw` is set; everything else yields pretty-printed JSON.
pub fn node_copy_string(path: &str, raw: bool, state: &AppState) -> Result<String> {
    state.with_viewer(|viewer| {
        let Some(displayed) = viewer.displayed() else {
            return copy_string(&Value::Null);
        };
        let node_path = parse_path(path, displayed, viewer.root_label())?;
        let value = viewer.lookup(&node_path)?;
        if raw {
            copy_text(value)
        } else {
            copy_string(value)
        }
    })
}

/// Copies the displayed node at `path` to the system clipboard.
pub fn copy_node_value(path: &str, raw: bool, state: &AppState) -> Result<()> {
    let text = node_copy_string(path, raw, state)?;
    write_clipboard(text)
}

/// Copies the whole document, ignoring the current search.
pub fn copy_all(state: &AppState) -> Result<()> {
    let text = state.with_viewer(|viewer| copy_string(viewer.root()))?;
    write_clipboard(text)
}

pub fn toggle_node(path: &str, state: &AppState) -> Result<Toggle> {
    state.with_viewer(|viewer| {
        let displayed = viewer.displayed().ok_or_else(|| ViewerError::InvalidPath(path.to_string()))?;
        let node_path = parse_path(path, displayed, viewer.root_label())?;
        viewer.toggle(&node_path)
    })
}

pub fn expand_node(path: &str, state: &AppState) -> Result<()> {
    state.with_viewer(|viewer| {
        let displayed = viewer.displayed().ok_or_else(|| ViewerError::InvalidPath(path.to_string()))?;
        let node_path = parse_path(path, displayed, viewer.root_label())?;
        viewer.expand(&node_path)
    })
}

pub fn collapse_node(path: &str, state: &AppState) -> Result<()> {
    state.with_viewer(|viewer| {
        let displayed = viewer.displayed().ok_or_else(|| ViewerError::InvalidPath(path.to_string()))?;
        let node_path = parse_path(path, displayed, viewer.root_label())?;
        viewer.collapse(&node_path)
    })
}

fn write_clipboard(text: String) -> Result<()> {
    use arboard::Clipboard;
    let result = Clipboard::new().and_then(|mut cb| cb.set_text(text));
    match result {
        Ok(()) => {
            debug!("copied value to clipboard");
            Ok(())
        }
        Err(e) => {
            warn!("copy to clipboard failed: {e}");
            Err(ViewerError::Clipboard(e.to_string()))
        }
    }
}
