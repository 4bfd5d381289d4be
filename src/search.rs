use std::ops::Range;

use log::{debug, warn};
use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::error;
use crate::state::AppState;
use crate::types::Node;

/// Applies a new search term to the loaded document and returns the rows to show.
pub fn search(query: &str, state: &AppState) -> error::Result<Vec<Node>> {
    state.with_viewer(|viewer| {
        viewer.set_search(query);
        Ok(viewer.rows())
    })
}

/// Applies the search term to `value`.
///
/// An empty term returns the value unchanged. Array elements are kept whole
/// when their serialized form contains the term. Object entries are kept
/// whole when the key contains the term; entries that match only through
/// their value are kept with that value filtered the same way. A scalar is
/// kept only when its serialized form matches; `None` means it was filtered
/// out.
///
/// Never fails: if the value cannot be filtered, the original is returned.
pub fn filter(value: &Value, term: &str) -> Option<Value> {
    if term.is_empty() {
        return Some(value.clone());
    }
    match filter_value(value, term) {
        Ok(filtered) => filtered,
        Err(e) => {
            warn!("search filter failed, showing unfiltered value: {e}");
            Some(value.clone())
        }
    }
}

/// Fallible core of [`filter`].
pub fn filter_value(value: &Value, term: &str) -> Result<Option<Value>, serde_json::Error> {
    prune(value, &term.to_lowercase())
}

fn prune(value: &Value, needle: &str) -> Result<Option<Value>, serde_json::Error> {
    let filtered = match value {
        Value::Array(items) => {
            let mut kept = Vec::new();
            for item in items {
                if serialized_matches(item, needle)? {
                    kept.push(item.clone());
                }
            }
            debug!("filter kept {}/{} array items", kept.len(), items.len());
            Some(Value::Array(kept))
        }
        Value::Object(map) => {
            let mut kept = Map::new();
            for (key, child) in map {
                if text_matches(key, needle) {
                    kept.insert(key.clone(), child.clone());
                } else if serialized_matches(child, needle)? {
                    // a match spanning several children prunes to nothing; keep it whole
                    let pruned = prune(child, needle)?.filter(|v| !is_empty_container(v));
                    kept.insert(key.clone(), pruned.unwrap_or_else(|| child.clone()));
                }
            }
            debug!("filter kept {}/{} properties", kept.len(), map.len());
            Some(Value::Object(kept))
        }
        scalar => serialized_matches(scalar, needle)?.then(|| scalar.clone()),
    };
    Ok(filtered)
}

fn is_empty_container(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn serialized_matches(value: &Value, needle: &str) -> Result<bool, serde_json::Error> {
    let serialized = serde_json::to_string(value)?;
    Ok(text_matches(&serialized, needle))
}

/// Case-insensitive substring test. `needle` must already be lowercased.
pub fn text_matches(text: &str, needle: &str) -> bool {
    text.to_lowercase().contains(needle)
}

/// Marks occurrences of the search term inside key labels.
#[derive(Debug, Clone, Default)]
pub struct Highlighter {
    re: Option<Regex>,
}

impl Highlighter {
    pub fn new(term: &str) -> Self {
        if term.is_empty() {
            return Self { re: None };
        }
        let re = RegexBuilder::new(&regex::escape(term))
            .case_insensitive(true)
            .build();
        match re {
            Ok(re) => Self { re: Some(re) },
            Err(e) => {
                warn!("search term cannot be highlighted: {e}");
                Self { re: None }
            }
        }
    }

    /// Byte ranges of every non-overlapping match in `text`.
    pub fn ranges(&self, text: &str) -> Vec<Range<usize>> {
        match &self.re {
            Some(re) => re.find_iter(text).map(|m| m.range()).collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn empty_term_is_identity() {
        let doc = json!({"a": [1, {"b": null}], "c": "d"});
        assert_eq!(filter(&doc, ""), Some(doc.clone()));
        assert_eq!(filter(&json!(null), ""), Some(json!(null)));
    }

    #[test]
    fn term_case_does_not_matter() {
        let doc = json!({"ID": 1, "identity": "x", "other": "Id card", "skip": 3});
        assert_eq!(filter(&doc, "ID"), filter(&doc, "id"));
        assert_eq!(
            filter(&doc, "iD"),
            Some(json!({"ID": 1, "identity": "x", "other": "Id card"}))
        );
    }

    #[test]
    fn object_entries_match_on_key_or_value() {
        let doc = json!({"userId": 1, "name": "Bob"});
        assert_eq!(filter(&doc, "user"), Some(json!({"userId": 1})));
        assert_eq!(filter(&doc, "bob"), Some(json!({"name": "Bob"})));
    }

    #[test]
    fn object_filter_keeps_insertion_order() {
        let doc = json!({"zeta": 1, "alpha": 1, "mid": 2});
        let filtered = filter(&doc, "1").unwrap();
        let keys: Vec<_> = filtered.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
    }

    #[test]
    fn array_elements_are_kept_whole() {
        let doc = json!([{"id": 1}, {"id": 2}]);
        assert_eq!(filter(&doc, "1"), Some(json!([{"id": 1}])));

        let nested = json!([{"id": 1, "tags": ["a", "b"]}]);
        assert_eq!(filter(&nested, "a"), Some(nested.clone()));
    }

    #[test]
    fn scalars_are_kept_or_omitted() {
        assert_eq!(filter(&json!("Hello"), "ell"), Some(json!("Hello")));
        assert_eq!(filter(&json!(42), "7"), None);
        assert_eq!(filter(&json!(true), "TRU"), Some(json!(true)));
        assert_eq!(filter(&json!(null), "nul"), Some(json!(null)));
    }

    #[test]
    fn nested_users_scenario() {
        let doc = json!({"users": [
            {"id": 1, "email": "a@x.com"},
            {"id": 2, "email": "b@y.com"}
        ]});
        assert_eq!(
            filter(&doc, "b@y"),
            Some(json!({"users": [{"id": 2, "email": "b@y.com"}]}))
        );
    }

    #[test]
    fn key_match_keeps_value_whole() {
        let doc = json!({"user": {"id": 1, "name": "Bob"}, "other": {"x": 1}});
        assert_eq!(
            filter(&doc, "user"),
            Some(json!({"user": {"id": 1, "name": "Bob"}}))
        );
    }

    #[test]
    fn value_match_prunes_nested_objects() {
        let doc = json!({"meta": {"owner": "alice", "size": 3}, "n": 1});
        assert_eq!(filter(&doc, "ali"), Some(json!({"meta": {"owner": "alice"}})));
    }

    #[test]
    fn match_across_children_keeps_value_whole() {
        let doc = json!({"meta": {"a": 1, "b": 2}, "other": 3});
        assert_eq!(filter(&doc, "1,\"b"), Some(json!({"meta": {"a": 1, "b": 2}})));

        let doc = json!({"list": [1, 2], "other": 3});
        assert_eq!(filter(&doc, "1,2"), Some(json!({"list": [1, 2]})));

        let doc = json!({"meta": {"a": 1}});
        assert_eq!(filter(&doc, "{"), Some(json!({"meta": {"a": 1}})));
    }

    #[test]
    fn filtering_is_deterministic() {
        let doc = json!({"a": [1, 2, 3], "b": {"c": "abc"}});
        assert_eq!(filter(&doc, "c"), filter(&doc, "c"));
    }

    #[test]
    fn search_command_refilters_loaded_document() {
        let state = AppState::default();
        assert!(search("x", &state).is_err());
        state.load(json!({"userId": 1, "name": "Bob"}), "root");
        let rows = search("user", &state).unwrap();
        let labels: Vec<_> = rows.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, vec!["root", "root.userId"]);
        assert_eq!(search("", &state).unwrap().len(), 3);
    }

    #[test]
    fn highlight_ranges_ignore_case() {
        let hl = Highlighter::new("ID");
        assert_eq!(hl.ranges("userId_id"), vec![4..6, 7..9]);
        assert!(hl.ranges("name").is_empty());
    }

    #[test]
    fn highlight_treats_term_literally() {
        let hl = Highlighter::new("a.b(");
        assert_eq!(hl.ranges("xa.b(y"), vec![1..5]);
        assert!(hl.ranges("axb(").is_empty());
        assert!(Highlighter::new("").ranges("anything").is_empty());
    }
}
