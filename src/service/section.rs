// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-name section records kept by the registry.
//!
//! A section pairs the remembered defaults of a name with its live value, the
//! signature of the last value observers were told about, and the observers
//! themselves. The registry stores sections of many different value types, so
//! it sees them through the type-erased [`AnySection`] trait.

use crate::domain::lenient::from_document;
use crate::domain::merge::{merge_defaults, overlay};
use crate::domain::{
    ConfigError, Reconfigurable, Registrant, Result, SharedConfig, Signature, Updatable,
};
use crate::ports::Destination;
use serde_json::Value;
use std::any::{type_name, Any};
use std::sync::{Arc, RwLockWriteGuard};

/// Something told about a section's changes.
pub(crate) enum Observer<T> {
    /// The value's own `Updatable::changed` hook.
    Changed(fn(&mut T)),
    /// An instance attached with `reconfigure`.
    Instance(Arc<dyn Reconfigurable<T>>),
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        match self {
            Observer::Changed(hook) => Observer::Changed(*hook),
            Observer::Instance(instance) => Observer::Instance(Arc::clone(instance)),
        }
    }
}

/// Observers of a changed section, to be run once the registry is unlocked.
pub(crate) type Notification = Box<dyn FnOnce()>;

/// The registry's record for one section name.
pub(crate) struct Section<T> {
    name: String,
    defaults: Value,
    current: Option<SharedConfig<T>>,
    signature: Option<Signature>,
    observers: Vec<Observer<T>>,
    assign: fn(&mut T, T),
    has_changed_hook: bool,
}

fn replace<T>(current: &mut T, loaded: T) {
    *current = loaded;
}

impl<T: Registrant> Section<T> {
    pub(crate) fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            defaults: Value::Null,
            current: None,
            signature: None,
            observers: Vec::new(),
            assign: replace::<T>,
            has_changed_hook: false,
        }
    }

    /// Merges a registered default into the remembered defaults.
    pub(crate) fn add_defaults(&mut self, document: &Value) {
        merge_defaults(&mut self.defaults, document);
    }

    /// Adopts `config` as the live value unless one is already set.
    pub(crate) fn adopt(&mut self, config: &SharedConfig<T>) -> bool {
        if self.current.is_some() {
            return false;
        }
        self.current = Some(config.clone());
        true
    }

    pub(crate) fn attach(&mut self, observer: Observer<T>) {
        self.observers.push(observer);
    }

    pub(crate) fn current(&self) -> Option<SharedConfig<T>> {
        self.current.clone()
    }

    pub(crate) fn observer_count(&self) -> usize {
        self.observers.len()
    }

    #[cfg(test)]
    pub(crate) fn defaults(&self) -> &Value {
        &self.defaults
    }
}

impl<T: Updatable> Section<T> {
    /// Installs the value's own change hook, once per section.
    pub(crate) fn install_changed_hook(&mut self) {
        if self.has_changed_hook {
            return;
        }
        self.observers.push(Observer::Changed(<T as Updatable>::changed));
        self.assign = <T as Updatable>::absorb;
        self.has_changed_hook = true;
    }
}

/// Serializes a registered value into a defaults document.
pub(crate) fn to_document<T: Registrant>(name: &str, config: &SharedConfig<T>) -> Result<Value> {
    serde_json::to_value(&*config.read()).map_err(|source| ConfigError::SerializationError {
        section: name.to_string(),
        source,
    })
}

/// A section locked for the duration of a load.
pub(crate) trait Pending: Destination {
    fn name(&self) -> &str;

    fn as_destination(&mut self) -> &mut dyn Destination;

    /// Writes the staged value into the live one. Returns `false` if the
    /// loader never populated this section.
    fn commit(&mut self) -> bool;
}

struct PendingLoad<'a, T> {
    name: &'a str,
    defaults: &'a Value,
    guard: RwLockWriteGuard<'a, T>,
    assign: fn(&mut T, T),
    staged: Option<T>,
}

impl<T: Registrant> Destination for PendingLoad<'_, T> {
    fn populate(&mut self, data: &Value) -> Result<()> {
        let effective = overlay(self.defaults, data);
        let loaded: T =
            from_document(&effective).map_err(|e| ConfigError::section_data(self.name, e))?;
        self.staged = Some(loaded);
        Ok(())
    }
}

impl<T: Registrant> Pending for PendingLoad<'_, T> {
    fn name(&self) -> &str {
        self.name
    }

    fn as_destination(&mut self) -> &mut dyn Destination {
        self
    }

    fn commit(&mut self) -> bool {
        match self.staged.take() {
            Some(loaded) => {
                (self.assign)(&mut *self.guard, loaded);
                true
            }
            None => false,
        }
    }
}

/// The type-erased view of a [`Section`].
pub(crate) trait AnySection: Send {
    fn type_name(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Locks the live value for loading. `None` if nothing was registered yet.
    fn begin_load(&self) -> Option<Box<dyn Pending + '_>>;

    /// Runs change detection. If the value changed, returns the call that
    /// tells its observers, in attachment order.
    fn notify(&mut self) -> Option<Notification>;
}

impl<T: Registrant> AnySection for Section<T> {
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn begin_load(&self) -> Option<Box<dyn Pending + '_>> {
        let current = self.current.as_ref()?;
        Some(Box::new(PendingLoad {
            name: &self.name,
            defaults: &self.defaults,
            guard: current.write(),
            assign: self.assign,
            staged: None,
        }))
    }

    fn notify(&mut self) -> Option<Notification> {
        let current = self.current.clone()?;
        let (changed, signature) = Signature::detect(self.signature.as_ref(), &*current.read());

        self.signature = match signature {
            Ok(signature) => Some(signature),
            Err(e) => {
                tracing::warn!(
                    "Cannot compute signature of section '{}', assuming it changed: {}",
                    self.name,
                    e
                );
                None
            }
        };
        if !changed {
            return None;
        }

        let observers = self.observers.clone();
        Some(Box::new(move || {
            let mut guard = current.write();
            for observer in &observers {
                match observer {
                    Observer::Changed(hook) => hook(&mut *guard),
                    Observer::Instance(instance) => instance.reconfigure(&*guard),
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::SerializeStruct;
    use serde::{Deserialize, Serialize, Serializer};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
    struct TestCfg {
        key: String,
        none: String,
        #[serde(skip)]
        changed: usize,
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

    fn registered(value: TestCfg) -> (Section<TestCfg>, SharedConfig<TestCfg>) {
        let handle = SharedConfig::new(value);
        let mut section = Section::new("section");
        section.add_defaults(&to_document("section", &handle).unwrap());
        section.adopt(&handle);
        (section, handle)
    }

    fn notify(section: &mut dyn AnySection) -> bool {
        match section.notify() {
            Some(run) => {
                run();
                true
            }
            None => false,
        }
    }

    fn load(section: &Section<TestCfg>, data: Value) -> Result<bool> {
        let mut pending = section.begin_load().unwrap();
        pending.populate(&data)?;
        Ok(pending.commit())
    }

    #[test]
    fn test_section_adopts_first_value_only() {
        let first = SharedConfig::new(TestCfg::default());
        let second = SharedConfig::new(TestCfg::default());
        let mut section = Section::new("section");

        assert!(section.adopt(&first));
        assert!(!section.adopt(&second));
        assert!(section.current().unwrap().ptr_eq(&first));
    }

    #[test]
    fn test_section_merges_defaults() {
        let mut section: Section<TestCfg> = Section::new("section");
        section.add_defaults(&json!({"key": "a", "none": ""}));
        section.add_defaults(&json!({"key": "b", "none": "c"}));
        assert_eq!(section.defaults(), &json!({"key": "a", "none": "c"}));
    }

    #[test]
    fn test_begin_load_without_value() {
        let section: Section<TestCfg> = Section::new("section");
        assert!(section.begin_load().is_none());
    }

    #[test]
    fn test_load_overlays_file_on_defaults() {
        let (section, handle) = registered(TestCfg {
            none: "foobar".to_string(),
            ..TestCfg::default()
        });

        assert!(load(&section, json!({"key": "foo"})).unwrap());
        assert_eq!(handle.read().key, "foo");
        assert_eq!(handle.read().none, "foobar");

        // A field dropped from the file reverts to its default.
        assert!(load(&section, json!({"none": "other"})).unwrap());
        assert_eq!(handle.read().key, "");
        assert_eq!(handle.read().none, "other");
    }

    #[test]
    fn test_unpopulated_load_commits_nothing() {
        let (section, handle) = registered(TestCfg {
            key: "kept".to_string(),
            ..TestCfg::default()
        });
        let mut pending = section.begin_load().unwrap();
        assert!(!pending.commit());
        drop(pending);
        assert_eq!(handle.read().key, "kept");
    }

    #[test]
    fn test_bad_section_data_is_rejected() {
        let (section, handle) = registered(TestCfg::default());
        let result = load(&section, json!({"key": {"nested": true}}));
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
        assert_eq!(handle.read().key, "");
    }

    #[test]
    fn test_notify_fires_on_first_pass_then_on_change_only() {
        let (mut section, handle) = registered(TestCfg::default());
        section.install_changed_hook();

        assert!(notify(&mut section));
        assert!(!notify(&mut section));
        assert_eq!(handle.read().changed, 1);

        load(&section, json!({"key": "bar"})).unwrap();
        assert!(notify(&mut section));
        assert_eq!(handle.read().changed, 2);
        assert_eq!(handle.read().key, "bar");
    }

    #[test]
    fn test_changed_hook_installed_once() {
        let (mut section, handle) = registered(TestCfg::default());
        section.install_changed_hook();
        section.install_changed_hook();
        assert_eq!(section.observer_count(), 1);

        notify(&mut section);
        assert_eq!(handle.read().changed, 1);
    }

    #[test]
    fn test_observers_called_in_attachment_order() {
        let (mut section, _handle) = registered(TestCfg::default());
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for id in 0..3 {
            let order = Arc::clone(&order);
            section.attach(Observer::Instance(Arc::new(move |_cfg: &TestCfg| {
                order.lock().unwrap().push(id);
            })));
        }

        notify(&mut section);
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_instance_observer_receives_current_value() {
        let (mut section, _handle) = registered(TestCfg::default());
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        section.attach(Observer::Instance(Arc::new(move |cfg: &TestCfg| {
            assert_eq!(cfg.key, "foo");
            seen_clone.fetch_add(1, Ordering::SeqCst);
        })));

        load(&section, json!({"key": "foo"})).unwrap();
        notify(&mut section);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_absorb_keeps_runtime_state() {
        let (mut section, handle) = registered(TestCfg::default());
        section.install_changed_hook();
        notify(&mut section);

        load(&section, json!({"key": "foo"})).unwrap();
        assert_eq!(handle.read().changed, 1);
    }

    #[test]
    fn test_type_name() {
        let section: Section<TestCfg> = Section::new("section");
        assert!(section.type_name().ends_with("TestCfg"));
    }

    /// Serializes until its value says otherwise.
    #[derive(Debug, Clone, Default, Deserialize)]
    struct Fragile {
        value: String,
    }

    impl Serialize for Fragile {
        fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
            if self.value == "unserializable" {
                return Err(serde::ser::Error::custom("value refuses to serialize"));
            }
            let mut state = serializer.serialize_struct("Fragile", 1)?;
            state.serialize_field("value", &self.value)?;
            state.end()
        }
    }

    #[test]
    fn test_unserializable_value_still_notifies() {
        let handle = SharedConfig::new(Fragile::default());
        let mut fragile = Section::new("fragile");
        fragile.add_defaults(&to_document("fragile", &handle).unwrap());
        fragile.adopt(&handle);
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_clone = Arc::clone(&seen);
        fragile.attach(Observer::Instance(Arc::new(move |_cfg: &Fragile| {
            seen_clone.fetch_add(1, Ordering::SeqCst);
        })));
        let (mut plain, plain_handle) = registered(TestCfg::default());
        plain.install_changed_hook();

        let mut pending = fragile.begin_load().unwrap();
        pending.populate(&json!({"value": "unserializable"})).unwrap();
        assert!(pending.commit());
        drop(pending);
        load(&plain, json!({"key": "foo"})).unwrap();

        // Sections are notified in order; the failing one comes first.
        assert!(notify(&mut fragile));
        assert!(notify(&mut plain));
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert_eq!(plain_handle.read().changed, 1);
        assert_eq!(handle.read().value, "unserializable");

        // Without a signature to compare with, every pass counts as a change.
        assert!(notify(&mut fragile));
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(!notify(&mut plain));
    }

    #[test]
    fn test_notification_runs_after_section_is_released() {
        let (mut section, handle) = registered(TestCfg::default());
        section.install_changed_hook();

        let run = section.notify().unwrap();
        drop(section);
        assert_eq!(handle.read().changed, 0);
        run();
        assert_eq!(handle.read().changed, 1);
    }
}
