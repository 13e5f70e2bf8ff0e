//! Ordered map type for JSON objects.
//!
//! [`Map`] wraps an [`IndexMap`] so that object fields keep their insertion
//! order. Field order is what the encoder emits, and therefore what canonical
//! equality compares; structural equality (`==`) ignores it.
//!
//! ```rust
//! use serde_canon::{Map, Value};
//!
//! let mut fields = Map::new();
//! fields.insert("id".to_string(), Value::from(7));
//! fields.insert("label".to_string(), Value::from("seven"));
//!
//! assert_eq!(fields.len(), 2);
//! assert_eq!(Value::Object(fields).to_string(), r#"{"id":7,"label":"seven"}"#);
//! ```

use crate::Value;
use indexmap::map::{IntoIter, Iter, Keys, Values};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Object fields in insertion order.
///
/// Re-inserting an existing key replaces the value but keeps the key's
/// original position, which is also how the decoder resolves duplicate keys.
///
/// ```rust
/// use serde_canon::{Map, Value};
///
/// let mut fields = Map::new();
/// assert!(fields.insert("a".to_string(), Value::from(1)).is_none());
/// fields.insert("b".to_string(), Value::from(2));
/// assert_eq!(fields.insert("a".to_string(), Value::from(3)), Some(Value::from(1)));
///
/// let order: Vec<&str> = fields.keys().map(String::as_str).collect();
/// assert_eq!(order, ["a", "b"]);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Map(IndexMap<String, Value>);

impl Map {
    #[must_use]
    pub fn new() -> Self {
        Map(IndexMap::new())
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Map(IndexMap::with_capacity(capacity))
    }

    /// Sets `key`, returning the previous value if there was one.
    pub fn insert(&mut self, key: String, value: Value) -> Option<Value> {
        self.0.insert(key, value)
    }

    /// Removes a key; later fields move up, keeping their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.shift_remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> Keys<'_, String, Value> {
        self.0.keys()
    }

    pub fn values(&self) -> Values<'_, String, Value> {
        self.0.values()
    }

    /// Fields in emission order.
    pub fn iter(&self) -> Iter<'_, String, Value> {
        self.0.iter()
    }
}

/// `HashMap` has no order; the resulting field order is arbitrary.
impl From<HashMap<String, Value>> for Map {
    fn from(fields: HashMap<String, Value>) -> Self {
        Map(fields.into_iter().collect())
    }
}

impl From<Map> for HashMap<String, Value> {
    fn from(fields: Map) -> Self {
        fields.0.into_iter().collect()
    }
}

impl IntoIterator for Map {
    type Item = (String, Value);
    type IntoIter = IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Map {
    type Item = (&'a String, &'a Value);
    type IntoIter = Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Later duplicates overwrite earlier values in place.
impl FromIterator<(String, Value)> for Map {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(fields: I) -> Self {
        Map(IndexMap::from_iter(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, i32)]) -> Map {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_equality_ignores_order() {
        assert_eq!(fields(&[("x", 1), ("y", 2)]), fields(&[("y", 2), ("x", 1)]));
        assert_ne!(fields(&[("x", 1)]), fields(&[("x", 2)]));
    }

    #[test]
    fn test_remove_preserves_order() {
        let mut map = fields(&[("a", 1), ("b", 2), ("c", 3)]);
        assert_eq!(map.remove("b"), Some(Value::from(2)));
        let keys: Vec<_> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["a", "c"]);
    }

    #[test]
    fn test_collect_keeps_first_position_last_value() {
        let map = fields(&[("a", 1), ("b", 2), ("a", 3)]);
        let pairs: Vec<_> = map.iter().map(|(k, v)| (k.as_str(), v.as_i64())).collect();
        assert_eq!(pairs, vec![("a", Some(3)), ("b", Some(2))]);
    }

    #[test]
    fn test_hashmap_conversion_roundtrips_contents() {
        let map = fields(&[("k", 1)]);
        let hashed: HashMap<String, Value> = map.clone().into();
        assert_eq!(Map::from(hashed), map);
    }
}
