//! Accumulated form data shared across the steps of a wizard.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Type-safe form field name wrapper.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldName(String);

impl FieldName {
    /// Creates a new FieldName.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the field name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FieldName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FieldName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for FieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets `FormData` be queried with plain `&str` keys.
impl std::borrow::Borrow<str> for FieldName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Key/value data collected while the user moves through a wizard.
///
/// Values are arbitrary JSON so the engine stays agnostic of the business forms
/// that produce them. Merging is shallow: a patch key replaces the whole value.
///
/// # Examples
///
/// ```
/// use stepwise_core::FormData;
/// use serde_json::json;
///
/// let mut data = FormData::new()
///     .with("name", json!("Alice"))
///     .with("role", json!("buyer"));
///
/// data.merge(FormData::new().with("role", json!("seller")));
///
/// assert_eq!(data.get("name"), Some(&json!("Alice")));
/// assert_eq!(data.get("role"), Some(&json!("seller")));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<FieldName, Value>);

impl FormData {
    /// Creates empty form data.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Inserts a value, returning the previous one.
    pub fn insert(&mut self, key: impl Into<FieldName>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Chained form of [`FormData::insert`].
    pub fn with(mut self, key: impl Into<FieldName>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &Value)> {
        self.0.iter()
    }

    /// Shallow merge: every key in `patch` overwrites the existing entry.
    pub fn merge(&mut self, patch: FormData) {
        self.0.extend(patch.0);
    }
}

impl<K, V> FromIterator<(K, V)> for FormData
where
    K: Into<FieldName>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Form data as handed to a persistence adapter.
///
/// `revision` increases monotonically for one workflow, so a store can refuse a
/// write that arrives after a newer one.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub revision: u64,
    pub data: FormData,
}

impl Snapshot {
    pub fn new(revision: u64, data: FormData) -> Self {
        Self { revision, data }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_overwrites_and_keeps() {
        let mut data = FormData::new().with("a", 1).with("b", 2);
        data.merge(FormData::new().with("b", 3).with("c", 4));

        assert_eq!(data.len(), 3);
        assert_eq!(data.get("a"), Some(&json!(1)));
        assert_eq!(data.get("b"), Some(&json!(3)));
        assert_eq!(data.get("c"), Some(&json!(4)));
    }

    #[test]
    fn test_merge_is_shallow() {
        let mut data = FormData::new().with("address", json!({"city": "Kyoto", "zip": "600"}));
        data.merge(FormData::new().with("address", json!({"city": "Osaka"})));

        assert_eq!(data.get("address"), Some(&json!({"city": "Osaka"})));
    }

    #[test]
    fn test_serializes_as_plain_object() {
        let data: FormData = [("name", "Alice")].into_iter().collect();
        let snapshot = Snapshot::new(3, data);

        let json = serde_json::to_value(&snapshot).expect("serializable");
        assert_eq!(json, json!({"revision": 3, "data": {"name": "Alice"}}));

        let back: Snapshot = serde_json::from_value(json).expect("deserializable");
        assert_eq!(back, snapshot);
    }
}
