// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared configuration types, mock loaders and file helpers for the
//! integration tests.

#![allow(dead_code)]

use modcfg::domain::{ConfigError, Result, Updatable};
use modcfg::ports::{Loader, Targets};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tempfile::NamedTempFile;

/// A module configuration counting its own changes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCfg {
    pub key: String,
    pub none: String,
    #[serde(skip)]
    pub changed: usize,
}

impl TestCfg {
    pub fn with_none(none: &str) -> Self {
        Self {
            none: none.to_string(),
            ..Self::default()
        }
    }
}

impl Updatable for TestCfg {
    fn changed(&mut self) {
        self.changed += 1;
    }

    fn absorb(&mut self, loaded: Self) {
        let changed = self.changed;
        *self = loaded;
        self.changed = changed;
    }
}

/// A module configuration keeping its data one level down.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeepCfg {
    pub deeper: TestCfg,
    #[serde(skip)]
    pub changed: usize,
}

impl Updatable for DeepCfg {
    fn changed(&mut self) {
        self.changed += 1;
    }

    fn absorb(&mut self, loaded: Self) {
        let changed = self.changed;
        *self = loaded;
        self.changed = changed;
    }
}

/// A loader serving an in-memory document that tests can swap.
///
/// The document must be a mapping of section names, anything else fails the
/// load like a broken file would.
#[derive(Clone)]
pub struct MockLoader {
    data: Arc<Mutex<Value>>,
    calls: Arc<AtomicUsize>,
}

impl MockLoader {
    pub fn new(data: Value) -> Self {
        Self {
            data: Arc::new(Mutex::new(data)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, data: Value) {
        *self.data.lock().unwrap() = data;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Loader for MockLoader {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, targets: &mut Targets<'_>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let data = self.data.lock().unwrap().clone();
        match data.as_object() {
            Some(sections) => targets.populate_from(sections),
            None => Err(ConfigError::ParseError {
                message: "mock data is not a mapping".to_string(),
                source: None,
            }),
        }
    }
}

/// Writes `content` to a temporary file ending in `.{extension}`.
pub fn config_file(extension: &str, content: &str) -> NamedTempFile {
    let file = tempfile::Builder::new()
        .suffix(&format!(".{}", extension))
        .tempfile()
        .unwrap();
    std::fs::write(file.path(), content).unwrap();
    file
}

/// Polls `condition` for up to two seconds.
pub fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}
