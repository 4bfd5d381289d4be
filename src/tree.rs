use serde_json::{Map, Value};

use crate::config::{DescriptionRule, ViewerConfig};
use crate::search::Highlighter;
use crate::state::ViewStates;
use crate::types::{KeyLabel, Node, NodePath, PathSegment, Toggle, ValueKind};

static NULL_PLACEHOLDER: Value = Value::Null;

/// Everything the recursion needs besides the value itself. Built once per
/// render pass and shared by reference with every node.
pub struct RenderContext<'a> {
    pub config: &'a ViewerConfig,
    pub root_label: &'a str,
    pub highlighter: Highlighter,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a ViewerConfig, root_label: &'a str, term: &str) -> Self {
        Self {
            config,
            root_label,
            highlighter: Highlighter::new(term),
        }
    }

    pub fn key_label(&self, name: &str) -> KeyLabel {
        KeyLabel::Property {
            name: name.to_string(),
            highlights: self.highlighter.ranges(name),
        }
    }
}

/// A JSON value seen as a tree node, by kind.
#[derive(Debug, Clone, Copy)]
pub enum TreeNode<'v> {
    Scalar(&'v Value),
    Object(&'v Map<String, Value>),
    Array(&'v [Value]),
}

impl<'v> TreeNode<'v> {
    /// An absent value is shown as `null`.
    pub fn new(value: Option<&'v Value>) -> Self {
        match value.unwrap_or(&NULL_PLACEHOLDER) {
            Value::Object(map) => TreeNode::Object(map),
            Value::Array(items) => TreeNode::Array(items),
            scalar => TreeNode::Scalar(scalar),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            TreeNode::Scalar(v) => ValueKind::of(v),
            TreeNode::Object(_) => ValueKind::Object,
            TreeNode::Array(_) => ValueKind::Array,
        }
    }

    pub fn child_count(&self) -> usize {
        match self {
            TreeNode::Scalar(_) => 0,
            TreeNode::Object(map) => map.len(),
            TreeNode::Array(items) => items.len(),
        }
    }

    /// Only non-empty containers can be expanded.
    pub fn is_expandable(&self) -> bool {
        self.child_count() > 0
    }

    pub fn children(&self) -> Vec<(PathSegment, &'v Value)> {
        match self {
            TreeNode::Scalar(_) => Vec::new(),
            TreeNode::Object(map) => map
                .iter()
                .map(|(k, v)| (PathSegment::Key(k.clone()), v))
                .collect(),
            TreeNode::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (PathSegment::Index(i), v))
                .collect(),
        }
    }

    /// `{2 properties}`, `{}`, `[1 item]`, `[]`, or the scalar literal.
    pub fn summary(&self, preview_limit: Option<usize>) -> String {
        match self {
            TreeNode::Object(map) => match map.len() {
                0 => "{}".into(),
                1 => "{1 property}".into(),
                n => format!("{{{n} properties}}"),
            },
            TreeNode::Array(items) => match items.len() {
                0 => "[]".into(),
                1 => "[1 item]".into(),
                n => format!("[{n} items]"),
            },
            TreeNode::Scalar(Value::String(s)) => match preview_limit {
                Some(limit) => Value::String(truncate(s, limit)).to_string(),
                None => Value::String(s.clone()).to_string(),
            },
            TreeNode::Scalar(v) => v.to_string(),
        }
    }
}

pub fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        None => s.to_string(),
        Some((cut, _)) => format!("{}…", &s[..cut]),
    }
}

/// Containers deeper than `expand_depth` start collapsed.
pub fn default_collapsed(path: &NodePath, config: &ViewerConfig) -> bool {
    path.depth() > config.expand_depth
}

/// First rule whose pattern occurs in `key`, ignoring case.
pub fn describe_key<'r>(key: &str, rules: &'r [DescriptionRule]) -> Option<&'r str> {
    let key = key.to_lowercase();
    rules
        .iter()
        .find(|rule| key.contains(&rule.pattern.to_lowercase()))
        .map(|rule| rule.description.as_str())
}

/// Flattens the displayed value into the rows currently visible, seeding view
/// state for every expandable node the first time it is reached.
pub fn build_rows(value: Option<&Value>, ctx: &RenderContext<'_>, states: &mut ViewStates) -> Vec<Node> {
    let mut rows = Vec::new();
    let key = (!ctx.root_label.is_empty()).then(|| ctx.key_label(ctx.root_label));
    walk(TreeNode::new(value), NodePath::root(), key, None, ctx, states, &mut rows);
    rows
}

fn walk(
    node: TreeNode<'_>,
    path: NodePath,
    key: Option<KeyLabel>,
    description: Option<String>,
    ctx: &RenderContext<'_>,
    states: &mut ViewStates,
    rows: &mut Vec<Node>,
) {
    let toggle = node.is_expandable().then(|| {
        let state = states.resolve(&path, || default_collapsed(&path, ctx.config));
        if state.collapsed {
            Toggle::Collapsed
        } else {
            Toggle::Expanded
        }
    });
    let copy_value = match node {
        TreeNode::Scalar(Value::String(s)) => s.chars().count() > ctx.config.long_string_threshold,
        _ => false,
    };

    rows.push(Node {
        label: path.label(ctx.root_label),
        key,
        value_type: node.kind(),
        toggle,
        child_count: node.child_count(),
        preview: node.summary(ctx.config.preview_limit),
        description,
        copy_value,
        path: path.clone(),
    });

    if toggle != Some(Toggle::Expanded) {
        return;
    }
    for (segment, child) in node.children() {
        let (key, description) = match &segment {
            PathSegment::Key(name) => (
                ctx.key_label(name),
                describe_key(name, &ctx.config.descriptions).map(str::to_string),
            ),
            PathSegment::Index(index) => (KeyLabel::Index { index: *index }, None),
        };
        walk(
            TreeNode::new(Some(child)),
            path.child(segment),
            Some(key),
            description,
            ctx,
            states,
            rows,
        );
    }
}

/// Paths of every non-empty container in `value`, parents before children.
pub fn container_paths(value: &Value) -> Vec<NodePath> {
    let mut out = Vec::new();
    let mut stack = vec![(value, NodePath::root())];
    while let Some((v, path)) = stack.pop() {
        let node = TreeNode::new(Some(v));
        if !node.is_expandable() {
            continue;
        }
        for (segment, child) in node.children().into_iter().rev() {
            stack.push((child, path.child(segment)));
        }
        out.push(path);
    }
    out
}
