// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing loader, parser and trigger implementations.
//!
//! This module contains concrete implementations of the traits defined in the
//! ports layer: a file loader with YAML and INI parsers, and reload triggers
//! driven by channels, file changes and Unix signals.

pub mod file_loader;
#[cfg(feature = "ini")]
pub mod ini_file;
pub mod triggers;
#[cfg(feature = "yaml")]
pub mod yaml_file;

use crate::domain::{ConfigError, Result};
use crate::ports::Loader;
use std::path::Path;

// Re-export adapters based on feature flags
pub use file_loader::FileLoader;
#[cfg(feature = "ini")]
pub use ini_file::{IniLoader, IniParser};
pub use triggers::ChannelTrigger;
#[cfg(feature = "reload")]
pub use triggers::FileWatcher;
#[cfg(all(feature = "signals", unix))]
pub use triggers::{SignalKind, SignalTrigger};
#[cfg(feature = "yaml")]
pub use yaml_file::{YamlLoader, YamlParser};

/// Returns a file loader for `path`, choosing the format from its extension.
///
/// # Errors
///
/// [`ConfigError::SourceError`] if no enabled format handles the extension.
///
/// # Examples
///
/// ```rust
/// use modcfg::adapters::loader_for_path;
///
/// let loader = loader_for_path("/etc/myapp/config.yaml").unwrap();
/// assert_eq!(loader.name(), "yaml-file");
/// assert!(loader_for_path("/etc/myapp/config.toml").is_err());
/// ```
pub fn loader_for_path(path: impl AsRef<Path>) -> Result<Box<dyn Loader>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();

    #[cfg(feature = "yaml")]
    {
        use crate::ports::ConfigParser;
        let parser = YamlParser::new();
        if parser.supports(extension) {
            return Ok(Box::new(FileLoader::with_parser(path, parser)));
        }
    }

    #[cfg(feature = "ini")]
    {
        use crate::ports::ConfigParser;
        let parser = IniParser::new();
        if parser.supports(extension) {
            return Ok(Box::new(FileLoader::with_parser(path, parser)));
        }
    }

    Err(ConfigError::SourceError {
        source_name: "file".to_string(),
        message: format!("No configuration format for {}", path.display()),
        source: None,
    })
}
