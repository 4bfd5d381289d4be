use std::ops::Range;

use crate::types::{KeyLabel, Node, Toggle};

/// How search matches inside key labels are marked in text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Marker {
    #[default]
    None,
    Brackets,
    Ansi,
}

impl Marker {
    fn wrap(self) -> (&'static str, &'static str) {
        match self {
            Marker::None => ("", ""),
            Marker::Brackets => ("[", "]"),
            Marker::Ansi => ("\x1b[7m", "\x1b[27m"),
        }
    }
}

pub fn mark(text: &str, ranges: &[Range<usize>], marker: Marker) -> String {
    let (open, close) = marker.wrap();
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for r in ranges {
        out.push_str(&text[pos..r.start]);
        out.push_str(open);
        out.push_str(&text[r.clone()]);
        out.push_str(close);
        pos = r.end;
    }
    out.push_str(&text[pos..]);
    out
}

/// One line per row, indented by depth.
pub fn render_text(rows: &[Node], indent: usize, marker: Marker) -> String {
    let mut out = String::new();
    for row in rows {
        out.push_str(&" ".repeat(row.depth() * indent));
        out.push_str(match row.toggle {
            Some(Toggle::Expanded) => "▾ ",
            Some(Toggle::Collapsed) => "▸ ",
            None => "  ",
        });
        match &row.key {
            Some(KeyLabel::Property { name, highlights }) if row.path.is_root() => {
                out.push_str(&mark(name, highlights, marker));
                out.push_str(": ");
            }
            Some(KeyLabel::Property { name, highlights }) => {
                out.push('"');
                out.push_str(&mark(name, highlights, marker));
                out.push_str("\": ");
            }
            Some(KeyLabel::Index { index }) => {
                out.push_str(&format!("[{index}]: "));
            }
            None => {}
        }
        out.push_str(&row.preview);
        if row.copy_value {
            out.push_str(" ⧉");
        }
        if let Some(desc) = &row.description {
            out.push_str("  // ");
            out.push_str(desc);
        }
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::state::ViewStates;
    use crate::tree::{build_rows, RenderContext};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn marks_ranges() {
        assert_eq!(mark("userId", &[0..4], Marker::Brackets), "[user]Id");
        assert_eq!(mark("aXa", &[0..1, 2..3], Marker::Ansi), "\x1b[7ma\x1b[27mX\x1b[7ma\x1b[27m");
        assert_eq!(mark("userId", &[0..4], Marker::None), "userId");
    }

    #[test]
    fn renders_tree() {
        let config = ViewerConfig::default();
        let ctx = RenderContext::new(&config, "response", "id");
        let doc = json!({"users": [{"id": 1}], "email": "a@x.com", "bio": "b".repeat(60), "tags": []});
        let rows = build_rows(Some(&doc), &ctx, &mut ViewStates::default());
        let expected = format!(
            "▾ response: {{4 properties}}\n\
             \x20 ▾ \"users\": [1 item]\n\
             \x20   ▸ [0]: {{1 property}}\n\
             \x20   \"email\": \"a@x.com\"  // Email address\n\
             \x20   \"bio\": \"{}\" ⧉\n\
             \x20   \"tags\": []\n",
            "b".repeat(60)
        );
        assert_eq!(render_text(&rows, 2, Marker::Brackets), expected);
    }
}
