//! Configuration parsing and management.

use screenkit_types::Locale;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

/// Main configuration struct matching the screenkit.yml schema
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub properties: PropertiesConfig,

    #[serde(default)]
    pub context: ContextConfig,

    #[serde(default)]
    pub render: RenderConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertiesConfig {
    /// Directories searched for `.properties` files, in order
    #[serde(default)]
    pub roots: Vec<PathBuf>,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_cache_size() -> usize {
    64
}

impl Default for PropertiesConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            cache_size: default_cache_size(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default)]
    pub locale: Option<String>,

    #[serde(default)]
    pub time_zone: Option<String>,

    /// Whether request contexts carry a separate global map
    #[serde(default)]
    pub global: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_content_type")]
    pub default_content_type: String,

    #[serde(default = "default_error_template")]
    pub error_template: String,
}

fn default_content_type() -> String {
    String::from("application/pdf")
}

fn default_error_template() -> String {
    String::from("component://common/widget/CommonScreens.xml#FoError")
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_content_type: default_content_type(),
            error_template: default_error_template(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Property roots, resolved relative to the config file
    pub fn property_roots(&self) -> Vec<PathBuf> {
        self.properties
            .roots
            .iter()
            .map(|p| self.resolve_path(p))
            .collect()
    }

    /// The configured default locale, if any
    pub fn locale(&self) -> Result<Option<Locale>, ConfigError> {
        match self.context.locale.as_deref() {
            None | Some("") => Ok(None),
            Some(tag) => Locale::parse(tag).map(Some).ok_or_else(|| ConfigError::InvalidValue {
                field: "context.locale".to_string(),
                value: tag.to_string(),
            }),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(config_path) = &self.config_path {
            if let Some(parent) = config_path.parent() {
                parent.join(path)
            } else {
                path.to_path_buf()
            }
        } else {
            path.to_path_buf()
        }
    }
}
