// SPDX-License-Identifier: MIT OR Apache-2.0

//! Field-by-field reconciliation of section documents.
//!
//! Every registered section is remembered as a generic document tree
//! ([`serde_json::Value`]). Two operations work on those trees:
//!
//! - [`merge_defaults`] folds a newly registered default into the remembered
//!   default of a section. A member is only written while it still holds the
//!   zero value for its kind, so the first non-zero registration wins.
//! - [`overlay`] lays the data read from a file over the remembered default.
//!   Members the file does not mention (or sets to `null`) keep their default.
//!
//! Records and key-ordered maps are both objects and merge per key. Sequences
//! are never merged element by element: they are copied wholesale.
//!
//! # Examples
//!
//! ```rust
//! use modcfg::domain::merge::{merge_defaults, overlay};
//! use serde_json::json;
//!
//! let mut defaults = json!({"x": "a", "y": ""});
//! merge_defaults(&mut defaults, &json!({"x": "b", "y": "c"}));
//! assert_eq!(defaults, json!({"x": "a", "y": "c"}));
//!
//! let live = overlay(&defaults, &json!({"y": "from-file"}));
//! assert_eq!(live, json!({"x": "a", "y": "from-file"}));
//! ```

use serde_json::{Map, Value};
use std::mem::discriminant;

/// Returns `true` if `value` holds the zero value for its kind.
///
/// `null`, `false`, numeric zero, the empty string and the empty sequence are
/// zero. An object is zero when every one of its members is zero, which is how
/// a record built from all-default fields serializes.
pub fn is_zero(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(members) => members.values().all(is_zero),
    }
}

/// Merges `src` into `dest`, keeping every member of `dest` that is already set.
///
/// Objects are merged per key: keys missing from `dest` are inserted, zero
/// members are replaced, nested objects are merged recursively. Any other zero
/// member of `dest` is replaced wholesale by the matching member of `src`.
/// A zero member whose kind differs from the incoming one cannot be written
/// consistently and is skipped with a warning.
pub fn merge_defaults(dest: &mut Value, src: &Value) {
    let mut path = Vec::new();
    merge_member(dest, src, &mut path);
}

fn merge_member(dest: &mut Value, src: &Value, path: &mut Vec<String>) {
    if src.is_null() {
        return;
    }

    if let (Value::Object(dest_members), Value::Object(src_members)) = (&mut *dest, src) {
        merge_objects(dest_members, src_members, path);
        return;
    }

    if !is_zero(dest) {
        return;
    }

    if dest.is_null() || discriminant(&*dest) == discriminant(src) {
        *dest = src.clone();
    } else {
        tracing::warn!(
            "Cannot set default value for '{}': expected {}, got {}",
            display_path(path),
            kind_name(dest),
            kind_name(src)
        );
    }
}

fn merge_objects(dest: &mut Map<String, Value>, src: &Map<String, Value>, path: &mut Vec<String>) {
    for (key, src_member) in src {
        match dest.get_mut(key) {
            Some(dest_member) => {
                path.push(key.clone());
                merge_member(dest_member, src_member, path);
                path.pop();
            }
            None => {
                dest.insert(key.clone(), src_member.clone());
            }
        }
    }
}

/// Lays `file` over `defaults` and returns the effective section document.
///
/// Objects overlay per key and recurse. A `null` in the file leaves the default
/// in place. Any other file value replaces the default as written; the section
/// type decides how a scalar is read (see [`crate::domain::lenient`]).
pub fn overlay(defaults: &Value, file: &Value) -> Value {
    match (defaults, file) {
        (_, Value::Null) => defaults.clone(),
        (Value::Object(default_members), Value::Object(file_members)) => {
            let mut merged = default_members.clone();
            for (key, file_member) in file_members {
                let value = match default_members.get(key) {
                    Some(default_member) => overlay(default_member, file_member),
                    None => file_member.clone(),
                };
                merged.insert(key.clone(), value);
            }
            Value::Object(merged)
        }
        _ => file.clone(),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "record",
    }
}

fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "<section>".to_string()
    } else {
        path.join(".")
    }
}
