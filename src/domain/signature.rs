// SPDX-License-Identifier: MIT OR Apache-2.0

//! Change-detection snapshots of section values.
//!
//! A [`Signature`] is the canonical serialized form of a section value. The
//! value is first converted into a [`serde_json::Value`] and every object is
//! rebuilt with its keys sorted, so two values that only differ by the
//! iteration order of a `HashMap` produce the same signature.

use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;

/// The canonical serialized form of a section value.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::Signature;
/// use std::collections::HashMap;
///
/// let mut first = HashMap::new();
/// first.insert("a", 1);
/// first.insert("b", 2);
///
/// let mut second = HashMap::new();
/// second.insert("b", 2);
/// second.insert("a", 1);
///
/// assert_eq!(Signature::of(&first).unwrap(), Signature::of(&second).unwrap());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    /// Computes the signature of `value`.
    pub fn of<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        let canonical = canonicalize(serde_json::to_value(value)?);
        serde_json::to_string(&canonical).map(Signature)
    }

    /// Returns `true` if `value` no longer matches `previous`.
    ///
    /// A missing previous signature, or a value that cannot be serialized,
    /// both count as a change. The second element is the signature to remember.
    pub fn detect<T: Serialize + ?Sized>(
        previous: Option<&Signature>,
        value: &T,
    ) -> (bool, serde_json::Result<Signature>) {
        match Signature::of(value) {
            Ok(current) => (previous != Some(&current), Ok(current)),
            Err(e) => (true, Err(e)),
        }
    }

    /// Returns the canonical text of the signature.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(members) => {
            let mut entries: Vec<(String, Value)> = members.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let sorted: Map<String, Value> = entries
                .into_iter()
                .map(|(key, member)| (key, canonicalize(member)))
                .collect();
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
