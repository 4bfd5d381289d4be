use std::{fs::create_dir_all, path::{Path, PathBuf}};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ViewerError};

const APP_DIR: &str = "snappy-tree";
const CONFIG_FILE: &str = "config.toml";

/// A `(pattern, description)` rule for annotating object properties.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptionRule {
    pub pattern: String,
    pub description: String,
}

impl DescriptionRule {
    pub fn new(pattern: &str, description: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            description: description.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub root_label: String,
    /// Containers nested deeper than this start collapsed.
    pub expand_depth: usize,
    /// Strings longer than this (in characters) offer a raw copy.
    pub long_string_threshold: usize,
    pub preview_limit: Option<usize>,
    pub indent: usize,
    pub descriptions: Vec<DescriptionRule>,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            root_label: "root".into(),
            expand_depth: 1,
            long_string_threshold: 50,
            preview_limit: None,
            indent: 2,
            descriptions: default_descriptions(),
        }
    }
}

pub fn default_descriptions() -> Vec<DescriptionRule> {
    [
        ("id", "Unique identifier"),
        ("name", "Display name"),
        ("email", "Email address"),
        ("phone", "Phone number"),
        ("address", "Physical address"),
        ("created_at", "Creation timestamp"),
        ("updated_at", "Last update timestamp"),
        ("status", "Current status"),
        ("active", "Active state"),
        ("enabled", "Enabled state"),
        ("count", "Total count"),
        ("total", "Total amount"),
        ("price", "Price value"),
        ("amount", "Amount value"),
        ("description", "Descriptive text"),
        ("url", "Web URL"),
        ("image", "Image URL or path"),
    ]
    .into_iter()
    .map(|(pattern, description)| DescriptionRule::new(pattern, description))
    .collect()
}

// Default location: <config dir>/snappy-tree/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
}

impl ViewerConfig {
    /// Loads `path` if given (it must exist), otherwise the default location
    /// if a file is present there, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => match default_config_path() {
                Some(p) if p.exists() => Self::from_file(&p),
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        debug!("loaded config from {}", path.display());
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            create_dir_all(dir)?;
        }
        let content = toml::to_string_pretty(self).map_err(ViewerError::ConfigWrite)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ViewerConfig::from_toml("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn partial_file_overrides_fields() {
        let config = ViewerConfig::from_toml(
            r#"
            root_label = "response"
            expand_depth = 0

            [[descriptions]]
            pattern = "sku"
            description = "Stock keeping unit"
            "#,
        )
        .unwrap();
        assert_eq!(config.root_label, "response");
        assert_eq!(config.expand_depth, 0);
        assert_eq!(config.long_string_threshold, 50);
        assert_eq!(config.descriptions, vec![DescriptionRule::new("sku", "Stock keeping unit")]);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(matches!(
            ViewerConfig::from_toml("expand_depth = \"deep\""),
            Err(ViewerError::Config(_))
        ));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = ViewerConfig {
            preview_limit: Some(80),
            indent: 4,
            ..Default::default()
        };
        config.save(&path).unwrap();
        assert_eq!(ViewerConfig::load(Some(&path)).unwrap(), config);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(matches!(ViewerConfig::load(Some(&missing)), Err(ViewerError::Io(_))));
    }
}
