// Module declarations
pub mod config;
pub mod error;
pub mod file;
pub mod node;
pub mod render;
pub mod search;
pub mod state;
pub mod tree;
pub mod types;

pub use error::{Result, ViewerError};
pub use search::filter;
pub use state::{AppState, NodeViewState, Viewer};
pub use types::{ApiResponse, Node, NodePath, PathSegment};
