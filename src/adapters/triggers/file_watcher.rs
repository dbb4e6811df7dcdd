// SPDX-License-Identifier: MIT OR Apache-2.0

//! File system watcher for configuration file changes.
//!
//! This module provides a trigger that monitors a configuration file and asks
//! for a reload when modifications are detected.

use crate::domain::{ConfigError, Result};
use crate::ports::{ReloadCallback, ReloadTrigger};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// File system watcher for configuration files.
///
/// The watcher observes the file's parent directory, so it also notices a
/// file that is replaced or created after the watcher started. It includes
/// debouncing to avoid triggering multiple reloads for one save.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::{FileWatcher, YamlLoader};
/// use modcfg::service::Registry;
/// use std::sync::Arc;
///
/// # fn main() -> modcfg::domain::Result<()> {
/// let registry = Arc::new(Registry::new(YamlLoader::new("/path/to/config.yaml")));
/// let mut watcher = FileWatcher::new("/path/to/config.yaml", None)?;
/// registry.reload_on(&mut watcher)?;
///
/// // Later, stop watching
/// drop(watcher);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileWatcher {
    /// Path to the file being watched
    file_path: PathBuf,
    /// Directory holding the file
    watch_dir: PathBuf,
    /// Debounce delay (default 500ms)
    debounce_delay: Duration,
    /// Internal watcher
    watcher: Option<RecommendedWatcher>,
    /// Thread handle for the watcher thread
    watch_thread: Option<JoinHandle<()>>,
    /// Stop signal sender
    stop_tx: Option<Sender<()>>,
}

impl FileWatcher {
    /// Creates a new file watcher for the given path.
    ///
    /// The file itself may not exist yet, but its directory must.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the file to watch
    /// * `debounce_delay` - Optional debounce delay (default 500ms)
    pub fn new(path: impl AsRef<Path>, debounce_delay: Option<Duration>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path.file_name().ok_or_else(|| ConfigError::TriggerError {
            message: format!("Not a file path: {}", path.display()),
            source: None,
        })?;

        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let watch_dir = parent.canonicalize().map_err(|e| ConfigError::TriggerError {
            message: format!("Directory does not exist: {}", parent.display()),
            source: Some(Box::new(e)),
        })?;

        Ok(Self {
            file_path: watch_dir.join(file_name),
            watch_dir,
            debounce_delay: debounce_delay.unwrap_or(Duration::from_millis(500)),
            watcher: None,
            watch_thread: None,
            stop_tx: None,
        })
    }

    /// Returns the absolute path of the watched file.
    pub fn path(&self) -> &Path {
        &self.file_path
    }
}

impl ReloadTrigger for FileWatcher {
    fn start(&mut self, callback: ReloadCallback) -> Result<()> {
        if self.watcher.is_some() {
            return Err(ConfigError::TriggerError {
                message: "Watcher is already running".to_string(),
                source: None,
            });
        }

        let (event_tx, event_rx) = channel::<notify::Result<Event>>();
        let (stop_tx, stop_rx) = channel::<()>();

        let mut watcher =
            RecommendedWatcher::new(event_tx, notify::Config::default()).map_err(|e| {
                ConfigError::TriggerError {
                    message: format!("Failed to create file watcher: {}", e),
                    source: Some(Box::new(e)),
                }
            })?;

        // Watching files directly misses editors that replace the file
        watcher
            .watch(&self.watch_dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::TriggerError {
                message: format!("Failed to start watching: {}", e),
                source: Some(Box::new(e)),
            })?;

        let file_path = self.file_path.clone();
        let debounce_delay = self.debounce_delay;

        let watch_thread = thread::spawn(move || {
            let mut last_event_time: Option<Instant> = None;
            let description = format!("change of {}", file_path.display());

            loop {
                if stop_rx.try_recv().is_ok() {
                    break;
                }

                match event_rx.recv_timeout(Duration::from_millis(100)) {
                    Ok(Ok(event)) => {
                        if event.kind.is_access() || !event.paths.iter().any(|p| p == &file_path) {
                            continue;
                        }

                        let now = Instant::now();
                        let should_trigger = last_event_time
                            .map(|last| now.duration_since(last) >= debounce_delay)
                            .unwrap_or(true);

                        if should_trigger {
                            last_event_time = Some(now);
                            callback(&description);
                        }
                    }
                    Ok(Err(e)) => tracing::warn!("File watcher error: {}", e),
                    Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,
                    Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
                }
            }
        });

        tracing::info!("Watching {} for changes", self.file_path.display());
        self.watcher = Some(watcher);
        self.stop_tx = Some(stop_tx);
        self.watch_thread = Some(watch_thread);

        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.watch_thread.take() {
            handle.join().map_err(|_| ConfigError::TriggerError {
                message: "Failed to join watcher thread".to_string(),
                source: None,
            })?;
        }

        if self.watcher.take().is_some() {
            tracing::info!("Stopped watching {}", self.file_path.display());
        }

        Ok(())
    }
}

impl Drop for FileWatcher {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}
