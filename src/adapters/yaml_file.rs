// SPDX-License-Identifier: MIT OR Apache-2.0

//! YAML configuration file support.
//!
//! This module provides a parser that reads the sections of a YAML file, and
//! the [`YamlLoader`] built on it.

use crate::adapters::FileLoader;
use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigParser, Sections};
use serde_json::Value;
use std::path::Path;

/// YAML parser implementation.
///
/// The top level of the document must be a mapping from section name to
/// section data. Nested mappings and sequences are kept as they are, so a
/// section can be as deep as its Rust type.
///
/// # Examples
///
/// ```rust
/// use modcfg::adapters::YamlParser;
/// use modcfg::ports::ConfigParser;
/// use serde_json::json;
///
/// let parser = YamlParser::new();
/// let yaml_content = "database:\n  host: localhost\n  port: 5432";
/// let result = parser.parse(yaml_content).unwrap();
/// assert_eq!(result.get("database"), Some(&json!({"host": "localhost", "port": 5432})));
/// ```
#[derive(Debug, Clone)]
pub struct YamlParser;

impl YamlParser {
    /// Creates a new YAML parser.
    pub fn new() -> Self {
        YamlParser
    }
}

impl Default for YamlParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser for YamlParser {
    fn parse(&self, content: &str) -> Result<Sections> {
        let value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| ConfigError::ParseError {
                message: format!("Failed to parse YAML: {}", e),
                source: Some(Box::new(e)),
            })?;

        if value.is_null() {
            return Ok(Sections::new());
        }
        if !value.is_mapping() {
            return Err(ConfigError::ParseError {
                message: "YAML document must be a mapping of section names".to_string(),
                source: None,
            });
        }

        match serde_json::to_value(&value) {
            Ok(Value::Object(sections)) => Ok(sections),
            Ok(_) => Err(ConfigError::ParseError {
                message: "YAML document must be a mapping of section names".to_string(),
                source: None,
            }),
            Err(e) => Err(ConfigError::ParseError {
                message: format!("Unsupported YAML content: {}", e),
                source: Some(Box::new(e)),
            }),
        }
    }

    fn supported_extensions(&self) -> &[&str] {
        &["yaml", "yml"]
    }
}

/// A loader for YAML configuration files.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::YamlLoader;
///
/// // Load from a specific file
/// let loader = YamlLoader::new("/path/to/config.yaml");
///
/// // Load from default OS location
/// let loader = YamlLoader::from_default_location("myapp", "com.example").unwrap();
/// ```
pub type YamlLoader = FileLoader<YamlParser>;

impl FileLoader<YamlParser> {
    /// Creates a loader for the YAML file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_parser(path, YamlParser::new())
    }

    /// Creates a loader for `config.yaml` in the OS-appropriate configuration
    /// directory.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        Self::at_default_location(app_name, qualifier, YamlParser::new())
    }
}
