use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("No document loaded")]
    NoDocument,

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Node at {0} is not an object or array")]
    NotAContainer(String),

    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("Invalid config file: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    ConfigWrite(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ViewerError>;
