use std::{fs::File, io::{BufReader, Read}, path::Path};

use log::{debug, warn};
use serde_json::Value;

use crate::error::{Result, ViewerError};
use crate::state::AppState;
use crate::types::{ApiResponse, Node};

/// How the payload being opened is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Payload {
    /// Any JSON document, shown as-is.
    #[default]
    Document,
    /// An `ApiResponse` envelope; its body is shown.
    Response,
}

pub fn parse_payload(text: &str, payload: Payload) -> Result<Value> {
    match payload {
        Payload::Document => Ok(serde_json::from_str(text)?),
        Payload::Response => {
            let response: ApiResponse = serde_json::from_str(text)?;
            Ok(response_body(&response))
        }
    }
}

pub fn response_body(response: &ApiResponse) -> Value {
    if let Some(err) = &response.error {
        warn!("response {} reported an error: {err}", response.status_code);
    }
    debug!(
        "response status {} in {} ms",
        response.status_code, response.execution_time_ms
    );
    response.body()
}

pub fn read_payload<R: Read>(reader: R, payload: Payload) -> Result<Value> {
    let mut text = String::new();
    BufReader::new(reader).read_to_string(&mut text)?;
    parse_payload(&text, payload)
}

/// Opens a file (or stdin for `-`) and makes it the displayed document.
pub fn open_file(path: &Path, payload: Payload, root_label: &str, state: &AppState) -> Result<Vec<Node>> {
    let root = if path == Path::new("-") {
        read_payload(std::io::stdin().lock(), payload)?
    } else {
        let f = File::open(path)?;
        debug!("reading {}", path.display());
        read_payload(f, payload)?
    };
    load_document(root, root_label, state)
}

// Load JSON from the system clipboard (expects UTF-8 text containing a JSON value).
pub fn open_clipboard(payload: Payload, root_label: &str, state: &AppState) -> Result<Vec<Node>> {
    use arboard::Clipboard;
    let text = Clipboard::new()
        .and_then(|mut cb| cb.get_text())
        .map_err(|e| ViewerError::Clipboard(e.to_string()))?;
    let root = parse_payload(&text, payload)?;
    load_document(root, root_label, state)
}

/// Replaces the displayed document and returns its first rows.
pub fn load_document(root: Value, root_label: &str, state: &AppState) -> Result<Vec<Node>> {
    state.load(root, root_label);
    state.rows()
}
