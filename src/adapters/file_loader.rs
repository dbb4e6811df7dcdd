// SPDX-License-Identifier: MIT OR Apache-2.0

//! File-backed configuration loader.
//!
//! This module provides a [`Loader`] that reads a single configuration file on
//! every load and hands its sections to the registry. The file format is
//! delegated to a [`ConfigParser`].

use crate::domain::{ConfigError, Result};
use crate::ports::{ConfigParser, Loader, Targets};
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum allowed size for configuration files (10MB)
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// A loader reading one configuration file through a parser.
///
/// The file is read again on every load, so edits are picked up by the next
/// reload. It does not have to exist when the loader is created, only when a
/// load runs.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::{FileLoader, YamlParser};
/// use modcfg::service::Registry;
///
/// # fn main() -> modcfg::domain::Result<()> {
/// let loader = FileLoader::with_parser("/etc/myapp/config.yaml", YamlParser::new());
/// let registry = Registry::new(loader);
/// registry.load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileLoader<P> {
    /// Loader name used in logs and errors, e.g. `yaml-file`
    name: String,
    /// Path to the configuration file
    file_path: PathBuf,
    /// Parser for the file format
    parser: P,
}

impl<P: ConfigParser> FileLoader<P> {
    /// Creates a loader for the file at `path`, parsed by `parser`.
    pub fn with_parser(path: impl AsRef<Path>, parser: P) -> Self {
        let format = parser
            .supported_extensions()
            .first()
            .copied()
            .unwrap_or("config");
        Self {
            name: format!("{}-file", format),
            file_path: path.as_ref().to_path_buf(),
            parser,
        }
    }

    /// Creates a loader for `config.<ext>` in the OS-appropriate configuration
    /// directory of an application, `ext` being the parser's first extension.
    ///
    /// # Arguments
    ///
    /// * `app_name` - The application name (e.g., "myapp")
    /// * `qualifier` - The organization/qualifier (e.g., "com.example")
    /// * `parser` - The parser for the file format
    pub fn at_default_location(app_name: &str, qualifier: &str, parser: P) -> Result<Self> {
        let extension = parser
            .supported_extensions()
            .first()
            .copied()
            .unwrap_or("conf");
        let proj_dirs =
            ProjectDirs::from(qualifier, "", app_name).ok_or_else(|| ConfigError::SourceError {
                source_name: format!("{}-file", extension),
                message: "Failed to determine project directories".to_string(),
                source: None,
            })?;

        let config_file = proj_dirs
            .config_dir()
            .join(format!("config.{}", extension));
        Ok(Self::with_parser(config_file, parser))
    }

    /// Returns the path of the configuration file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    /// Returns the parser.
    pub fn parser(&self) -> &P {
        &self.parser
    }

    fn file_name(&self) -> String {
        self.file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("<unknown>")
            .to_string()
    }

    /// Reads the file, refusing oversized ones.
    fn read(&self) -> Result<String> {
        let metadata = fs::metadata(&self.file_path).map_err(|e| ConfigError::SourceError {
            source_name: self.name.clone(),
            message: format!("Failed to read file metadata: {}", self.file_name()),
            source: Some(Box::new(e)),
        })?;

        if metadata.len() > MAX_FILE_SIZE {
            return Err(ConfigError::SourceError {
                source_name: self.name.clone(),
                message: format!(
                    "Configuration file too large: {} bytes (max {} bytes)",
                    metadata.len(),
                    MAX_FILE_SIZE
                ),
                source: None,
            });
        }

        fs::read_to_string(&self.file_path).map_err(|e| ConfigError::SourceError {
            source_name: self.name.clone(),
            message: format!("Failed to read configuration file: {}", self.file_name()),
            source: Some(Box::new(e)),
        })
    }
}

impl<P: ConfigParser> Loader for FileLoader<P> {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self, targets: &mut Targets<'_>) -> Result<()> {
        let content = self.read()?;
        let sections = self.parser.parse(&content)?;
        tracing::trace!(
            "Parsed {} sections from {}",
            sections.len(),
            self.file_path.display()
        );
        targets.populate_from(&sections)
    }
}
