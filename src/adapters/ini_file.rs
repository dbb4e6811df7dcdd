// SPDX-License-Identifier: MIT OR Apache-2.0

//! INI configuration file support.
//!
//! Every `[section]` header names a configuration section. Dots in section
//! headers and in keys nest the data, so
//!
//! ```ini
//! [server]
//! tls.cert = server.pem
//!
//! [server.limits]
//! connections = 64
//! ```
//!
//! yields the `server` section `{"tls": {"cert": "server.pem"}, "limits":
//! {"connections": "64"}}`. Properties outside of any section are ignored.

use crate::adapters::FileLoader;
use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigParser, Sections};
use ini::Ini;
use serde_json::{Map, Value};
use std::path::Path;

/// INI parser implementation.
///
/// INI values carry no type, so every value is kept as a string. The section
/// type decides later whether `42` is read as a number or as text.
///
/// # Examples
///
/// ```rust
/// use modcfg::adapters::IniParser;
/// use modcfg::ports::ConfigParser;
/// use serde_json::json;
///
/// let parser = IniParser::new();
/// let result = parser.parse("[database]\nhost = localhost\nport = 5432\n").unwrap();
/// assert_eq!(result.get("database"), Some(&json!({"host": "localhost", "port": "5432"})));
/// ```
#[derive(Debug, Clone)]
pub struct IniParser;

impl IniParser {
    /// Creates a new INI parser.
    pub fn new() -> Self {
        IniParser
    }

    fn conflict(path: &str) -> ConfigError {
        ConfigError::ParseError {
            message: format!("INI entry '{}' is both a value and a group", path),
            source: None,
        }
    }

    /// Walks down `path`, creating empty groups as needed.
    fn group<'m>(
        mut current: &'m mut Map<String, Value>,
        path: &[&str],
        full_path: &str,
    ) -> Result<&'m mut Map<String, Value>> {
        for part in path {
            let entry = current
                .entry(part.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(group) => group,
                _ => return Err(Self::conflict(full_path)),
            };
        }
        Ok(current)
    }
}

impl Default for IniParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigParser for IniParser {
    fn parse(&self, content: &str) -> Result<Sections> {
        let ini = Ini::load_from_str(content).map_err(|e| ConfigError::ParseError {
            message: format!("Failed to parse INI: {}", e),
            source: Some(Box::new(e)),
        })?;

        let mut sections = Sections::new();
        for (header, properties) in ini.iter() {
            let Some(header) = header else {
                if !properties.is_empty() {
                    tracing::trace!("Ignoring {} INI properties outside of a section", properties.len());
                }
                continue;
            };

            let header_path: Vec<&str> = header.split('.').map(str::trim).collect();
            let group = Self::group(&mut sections, &header_path, header)?;

            for (key, raw) in properties.iter() {
                let full_path = format!("{}.{}", header, key);
                let key_path: Vec<&str> = key.split('.').map(str::trim).collect();
                let Some((leaf, parents)) = key_path.split_last() else {
                    continue;
                };

                let parent = Self::group(group, parents, &full_path)?;
                if parent.get(*leaf).map_or(false, Value::is_object) {
                    return Err(Self::conflict(&full_path));
                }
                parent.insert(leaf.to_string(), Value::String(raw.to_string()));
            }
        }
        Ok(sections)
    }

    fn supported_extensions(&self) -> &[&str] {
        &["ini", "cfg", "conf"]
    }
}

/// A loader for INI configuration files.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::IniLoader;
/// use modcfg::service::Registry;
///
/// let registry = Registry::new(IniLoader::new("/etc/myapp/config.ini"));
/// ```
pub type IniLoader = FileLoader<IniParser>;

impl FileLoader<IniParser> {
    /// Creates a loader for the INI file at `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_parser(path, IniParser::new())
    }

    /// Creates a loader for `config.ini` in the OS-appropriate configuration
    /// directory.
    pub fn from_default_location(app_name: &str, qualifier: &str) -> Result<Self> {
        Self::at_default_location(app_name, qualifier, IniParser::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Loader;
    use serde_json::json;

    #[test]
    fn test_ini_parser_simple() {
        let parser = IniParser::new();
        let result = parser.parse("[section]\nkey=foo\n").unwrap();

        assert_eq!(result.len(), 1);
        assert_eq!(result.get("section"), Some(&json!({"key": "foo"})));
    }

    #[test]
    fn test_ini_parser_multiple_sections() {
        let parser = IniParser::new();
        let ini = "[a]\nx = 1\n\n[b]\ny = two\n";
        let result = parser.parse(ini).unwrap();

        assert_eq!(result.get("a"), Some(&json!({"x": "1"})));
        assert_eq!(result.get("b"), Some(&json!({"y": "two"})));
    }

    #[test]
    fn test_ini_parser_nested_keys_and_headers() {
        let parser = IniParser::new();
        let ini = r#"
[server]
tls.cert = server.pem
tls.enabled = true

[server.limits]
connections = 64
"#;
        let result = parser.parse(ini).unwrap();

        assert_eq!(
            result.get("server"),
            Some(&json!({
                "tls": {"cert": "server.pem", "enabled": "true"},
                "limits": {"connections": "64"}
            }))
        );
    }

    #[test]
    fn test_ini_parser_keeps_values_as_text() {
        let parser = IniParser::new();
        let ini = "[v]\nint = -3\nfloat = 1.5\nbool = false\npadded = 007\nword = yes\nempty =\n";
        let result = parser.parse(ini).unwrap();

        assert_eq!(
            result.get("v"),
            Some(&json!({
                "int": "-3",
                "float": "1.5",
                "bool": "false",
                "padded": "007",
                "word": "yes",
                "empty": ""
            }))
        );
    }

    #[test]
    fn test_ini_parser_ignores_general_section() {
        let parser = IniParser::new();
        let result = parser.parse("orphan = 1\n[section]\nkey = foo\n").unwrap();

        assert_eq!(result.len(), 1);
        assert!(result.get("orphan").is_none());
    }

    #[test]
    fn test_ini_parser_conflicting_keys() {
        let parser = IniParser::new();
        let result = parser.parse("[s]\na = 1\na.b = 2\n");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));

        let result = parser.parse("[s]\na.b = 2\na = 1\n");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_ini_parser_empty() {
        let parser = IniParser::new();
        assert!(parser.parse("").unwrap().is_empty());
    }

    #[test]
    fn test_ini_parser_supported_extensions() {
        let parser = IniParser::default();
        assert!(parser.supports("ini"));
        assert!(parser.supports("CFG"));
        assert!(!parser.supports("yaml"));
    }

    #[test]
    fn test_ini_loader_name() {
        let loader = IniLoader::new("/path/to/config.ini");
        assert_eq!(loader.name(), "ini-file");
    }
}
