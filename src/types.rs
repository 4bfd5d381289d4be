use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One step from a parent node to a child: a property name or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Key(k) => f.write_str(k),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}

/// Address of a node relative to the displayed root. The root itself is the
/// empty path; a child's path is always its parent's path plus one segment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodePath(Vec<PathSegment>);

impl NodePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn from_segments(segments: Vec<PathSegment>) -> Self {
        Self(segments)
    }

    pub fn child(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments)
    }

    pub fn key(&self, key: &str) -> Self {
        self.child(PathSegment::Key(key.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.child(PathSegment::Index(index))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Nesting depth; the root sits at depth 0.
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Dotted display label, e.g. `response.items.0.id`.
    pub fn label(&self, root_label: &str) -> String {
        let mut out = String::from(root_label);
        for segment in &self.0 {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment.to_string());
        }
        out
    }

    /// RFC 6901 JSON Pointer for this path (`""` for the root).
    pub fn to_pointer(&self) -> String {
        let mut out = String::new();
        for segment in &self.0 {
            out.push('/');
            match segment {
                PathSegment::Key(k) => out.push_str(&escape_pointer_token(k)),
                PathSegment::Index(i) => out.push_str(&i.to_string()),
            }
        }
        out
    }
}

// JSON Pointer token escape (~0, ~1)
pub fn escape_pointer_token(raw: &str) -> String {
    raw.replace('~', "~0").replace('/', "~1")
}

pub fn unescape_pointer_token(raw: &str) -> String {
    raw.replace("~1", "/").replace("~0", "~")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

impl ValueKind {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }

    pub fn is_container(self) -> bool {
        matches!(self, ValueKind::Array | ValueKind::Object)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Toggle {
    Expanded,
    Collapsed,
}

/// What precedes a row's value: a (possibly highlighted) name, or an array index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum KeyLabel {
    Property {
        name: String,
        /// Byte ranges of `name` matching the search term.
        highlights: Vec<Range<usize>>,
    },
    Index { index: usize },
}

/// One rendered row of the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub path: NodePath,
    pub label: String,            // dotted key-path for display
    pub key: Option<KeyLabel>,
    pub value_type: ValueKind,
    pub toggle: Option<Toggle>,   // None for scalars and empty containers
    pub child_count: usize,
    pub preview: String,          // literal for scalars, summary for containers
    pub description: Option<String>,
    pub copy_value: bool,         // long strings offer a raw copy
}

impl Node {
    pub fn depth(&self) -> usize {
        self.path.depth()
    }
}

/// Result of executing a request, as handed over by the HTTP collaborator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    #[serde(default)]
    pub status_code: u16,
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub response_body: Value,
    #[serde(default)]
    pub raw_response: Option<String>,
    #[serde(default)]
    pub execution_time_ms: u64,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl ApiResponse {
    /// The JSON value to display. A missing body is recovered from the raw
    /// text, which is kept as a plain string when it is not valid JSON.
    pub fn body(&self) -> Value {
        match (&self.response_body, &self.raw_response) {
            (Value::Null, Some(raw)) => {
                serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()))
            }
            (body, _) => body.clone(),
        }
    }
}
