use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;
use serde_json::Value;

use crate::config::ViewerConfig;
use crate::error::{Result, ViewerError};
use crate::search::filter;
use crate::tree::{build_rows, container_paths, default_collapsed, RenderContext, TreeNode};
use crate::types::{Node, NodePath, Toggle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeViewState {
    pub collapsed: bool,
}

/// Collapse state of every expandable node, keyed by path.
#[derive(Debug, Default)]
pub struct ViewStates {
    entries: HashMap<NodePath, NodeViewState>,
}

impl ViewStates {
    /// Existing state for `path`, or a new one seeded from `collapsed`.
    pub fn resolve(&mut self, path: &NodePath, collapsed: impl FnOnce() -> bool) -> NodeViewState {
        *self
            .entries
            .entry(path.clone())
            .or_insert_with(|| NodeViewState { collapsed: collapsed() })
    }

    pub fn get(&self, path: &NodePath) -> Option<NodeViewState> {
        self.entries.get(path).copied()
    }

    pub fn set(&mut self, path: &NodePath, collapsed: bool) {
        self.entries.insert(path.clone(), NodeViewState { collapsed });
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drops state for nodes that are no longer expandable in `displayed`.
    pub fn prune(&mut self, displayed: Option<&Value>) {
        let before = self.entries.len();
        self.entries.retain(|path, _| {
            displayed
                .and_then(|root| root.pointer(&path.to_pointer()))
                .is_some_and(|v| TreeNode::new(Some(v)).is_expandable())
        });
        if self.entries.len() != before {
            debug!("dropped view state for {} nodes", before - self.entries.len());
        }
    }
}

/// The currently displayed document and everything derived from it.
pub struct Viewer {
    root: Arc<Value>,
    root_label: String,
    term: String,
    // filter(root, term); None when the root itself was filtered out
    displayed: Option<Value>,
    states: ViewStates,
    config: Arc<ViewerConfig>,
}

impl Viewer {
    pub fn new(root: Value, root_label: &str, config: Arc<ViewerConfig>) -> Self {
        Self {
            displayed: Some(root.clone()),
            root: Arc::new(root),
            root_label: root_label.to_string(),
            term: String::new(),
            states: ViewStates::default(),
            config,
        }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub fn root_label(&self) -> &str {
        &self.root_label
    }

    /// The filtered value being shown.
    pub fn displayed(&self) -> Option<&Value> {
        self.displayed.as_ref()
    }

    pub fn states(&self) -> &ViewStates {
        &self.states
    }

    /// Replaces the document. All view state belongs to the old value and is discarded.
    pub fn replace_root(&mut self, root: Value, root_label: &str) {
        debug!("replacing document, discarding {} view states", self.states.len());
        self.root = Arc::new(root);
        self.root_label = root_label.to_string();
        self.states.clear();
        self.displayed = filter(&self.root, &self.term);
    }

    /// Re-filters for `term`. Repeating the current term is free.
    pub fn set_search(&mut self, term: &str) {
        if term == self.term {
            return;
        }
        debug!("search term changed to {term:?}");
        self.term = term.to_string();
        self.displayed = filter(&self.root, &self.term);
        self.states.prune(self.displayed.as_ref());
    }

    /// Visible rows for the current term and collapse state.
    pub fn rows(&mut self) -> Vec<Node> {
        let ctx = RenderContext::new(&self.config, &self.root_label, &self.term);
        build_rows(self.displayed.as_ref(), &ctx, &mut self.states)
    }

    /// Flips the collapse state of one node; no other entry is touched.
    pub fn toggle(&mut self, path: &NodePath) -> Result<Toggle> {
        self.expandable(path)?;
        let current = self
            .states
            .resolve(path, || default_collapsed(path, &self.config));
        let collapsed = !current.collapsed;
        self.states.set(path, collapsed);
        debug!("toggled {} collapsed={collapsed}", path.label(&self.root_label));
        Ok(if collapsed {
            Toggle::Collapsed
        } else {
            Toggle::Expanded
        })
    }

    /// Expands `path` and every ancestor so the node becomes visible.
    pub fn expand(&mut self, path: &NodePath) -> Result<()> {
        self.expandable(path)?;
        for depth in 0..=path.depth() {
            let prefix = NodePath::from_segments(path.segments()[..depth].to_vec());
            self.states.set(&prefix, false);
        }
        Ok(())
    }

    pub fn collapse(&mut self, path: &NodePath) -> Result<()> {
        self.expandable(path)?;
        self.states.set(path, true);
        Ok(())
    }

    pub fn expand_all(&mut self) {
        self.set_all(false);
    }

    pub fn collapse_all(&mut self) {
        self.set_all(true);
    }

    fn set_all(&mut self, collapsed: bool) {
        let Some(displayed) = &self.displayed else { return };
        for path in container_paths(displayed) {
            self.states.set(&path, collapsed);
        }
    }

    /// The displayed value at `path`.
    pub fn lookup(&self, path: &NodePath) -> Result<&Value> {
        self.displayed
            .as_ref()
            .and_then(|root| root.pointer(&path.to_pointer()))
            .ok_or_else(|| ViewerError::InvalidPath(path.label(&self.root_label)))
    }

    fn expandable(&self, path: &NodePath) -> Result<()> {
        let value = self.lookup(path)?;
        if TreeNode::new(Some(value)).is_expandable() {
            Ok(())
        } else {
            Err(ViewerError::NotAContainer(path.label(&self.root_label)))
        }
    }
}

pub struct AppState {
    pub viewer: RwLock<Option<Viewer>>,
    pub config: Arc<ViewerConfig>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            viewer: RwLock::new(None),
            config: Arc::new(config),
        }
    }

    /// Shows `root`, replacing whatever was loaded before. The search term survives.
    pub fn load(&self, root: Value, root_label: &str) {
        let mut guard = self.viewer.write();
        match &mut *guard {
            Some(viewer) => viewer.replace_root(root, root_label),
            None => *guard = Some(Viewer::new(root, root_label, self.config.clone())),
        }
    }

    pub fn with_viewer<T>(&self, f: impl FnOnce(&mut Viewer) -> Result<T>) -> Result<T> {
        let mut guard = self.viewer.write();
        let Some(viewer) = &mut *guard else { return Err(ViewerError::NoDocument); };
        f(viewer)
    }

    pub fn rows(&self) -> Result<Vec<Node>> {
        self.with_viewer(|viewer| Ok(viewer.rows()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn viewer(value: Value) -> Viewer {
        Viewer::new(value, "root", Arc::new(ViewerConfig::default()))
    }

    fn labels(rows: &[Node]) -> Vec<String> {
        rows.iter().map(|r| r.label.clone()).collect()
    }

    #[test]
    fn toggle_affects_only_its_node() {
        let mut v = viewer(json!({"a": {"x": {"k": 1}}, "b": {"y": {"k": 2}}}));
        v.rows();
        let ax = NodePath::root().key("a").key("x");
        let by = NodePath::root().key("b").key("y");
        assert_eq!(v.states().get(&ax), Some(NodeViewState { collapsed: true }));

        assert_eq!(v.toggle(&ax).unwrap(), Toggle::Expanded);
        assert_eq!(v.states().get(&by), Some(NodeViewState { collapsed: true }));
        assert!(labels(&v.rows()).contains(&"root.a.x.k".to_string()));
        assert!(!labels(&v.rows()).contains(&"root.b.y.k".to_string()));

        assert_eq!(v.toggle(&ax).unwrap(), Toggle::Collapsed);
    }

    #[test]
    fn toggle_rejects_scalars_and_unknown_paths() {
        let mut v = viewer(json!({"a": 1, "e": []}));
        assert!(matches!(v.toggle(&NodePath::root().key("a")), Err(ViewerError::NotAContainer(_))));
        assert!(matches!(v.toggle(&NodePath::root().key("e")), Err(ViewerError::NotAContainer(_))));
        assert!(matches!(v.toggle(&NodePath::root().key("zz")), Err(ViewerError::InvalidPath(_))));
    }

    #[test]
    fn collapse_state_survives_rerender() {
        let mut v = viewer(json!({"a": {"b": 1}}));
        v.rows();
        v.toggle(&NodePath::root().key("a")).unwrap();
        let rows = v.rows();
        assert_eq!(rows[1].toggle, Some(Toggle::Collapsed));
        assert_eq!(v.rows(), rows);
    }

    #[test]
    fn replacing_root_resets_state() {
        let mut v = viewer(json!({"a": {"b": 1}}));
        v.toggle(&NodePath::root().key("a")).unwrap();
        v.replace_root(json!({"a": {"c": 2}}), "response");
        assert!(v.states().is_empty());
        let rows = v.rows();
        assert_eq!(rows[1].toggle, Some(Toggle::Expanded));
        assert_eq!(rows[1].label, "response.a");
    }

    #[test]
    fn filtered_out_nodes_lose_state() {
        let mut v = viewer(json!({"keep": {"x": 1}, "drop": {"y": 2}}));
        v.toggle(&NodePath::root().key("drop")).unwrap();
        v.set_search("keep");
        assert_eq!(v.states().get(&NodePath::root().key("drop")), None);
        v.set_search("");
        let rows = v.rows();
        assert_eq!(rows[3].label, "root.drop");
        assert_eq!(rows[3].toggle, Some(Toggle::Expanded));
    }

    #[test]
    fn expand_opens_ancestors() {
        let mut v = viewer(json!({"a": {"b": {"c": {"d": 1}}}}));
        let path = NodePath::root().key("a").key("b").key("c");
        v.expand(&path).unwrap();
        assert!(labels(&v.rows()).contains(&"root.a.b.c.d".to_string()));
    }

    #[test]
    fn expand_and_collapse_all() {
        let mut v = viewer(json!({"a": {"b": {"c": [1]}}}));
        v.expand_all();
        assert_eq!(v.rows().len(), 5);
        v.collapse_all();
        assert_eq!(v.rows().len(), 1);
    }

    #[test]
    fn root_can_be_filtered_out() {
        let mut v = viewer(json!(12));
        v.set_search("9");
        assert_eq!(v.displayed(), None);
        assert_eq!(v.rows()[0].preview, "null");
    }

    #[test]
    fn app_state_requires_a_document() {
        let state = AppState::default();
        assert!(matches!(state.rows(), Err(ViewerError::NoDocument)));
        state.load(json!([1, 2]), "items");
        assert_eq!(state.rows().unwrap()[0].label, "items");
    }

    #[test]
    fn loading_keeps_search_term() {
        let state = AppState::default();
        state.load(json!({"a": 1, "b": 2}), "root");
        state.with_viewer(|v| Ok(v.set_search("a"))).unwrap();
        state.load(json!({"a": 3, "c": 4}), "root");
        let rows = state.rows().unwrap();
        assert_eq!(labels(&rows), vec!["root", "root.a"]);
    }
}
