//! Operations composed from [`encode`](crate::encode) and
//! [`decode`](crate::decode).
//!
//! Everything here inherits the encoder's lossiness: whatever the encoder
//! omits, null-fills or converts (dates to strings, custom encodes) is gone
//! from the result.
//!
//! Canonical equality is exact text equality of the hook-free encoding. It is
//! sensitive to object field order, so `{"a":1,"b":2}` and `{"b":2,"a":1}`
//! are *not* canonically equal even though the decoded values are `==`.

use crate::error::Result;
use crate::{DecodeError, EncodeError, EncodeOptions, HostValue, Value};
use log::warn;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;

/// Copies a host graph by encoding it and decoding the text.
///
/// The result shares nothing with `host`.
///
/// # Errors
///
/// Returns [`Error::Encode`](crate::Error::Encode) when `host` cannot be
/// encoded (cycles, non-finite numbers, unrepresentable root).
///
/// # Examples
///
/// ```rust
/// use serde_canon::{deep_clone, value, HostValue};
///
/// let host = HostValue::object([
///     ("keep", HostValue::from(1)),
///     ("drop", HostValue::Undefined),
/// ]);
/// assert_eq!(deep_clone(&host).unwrap(), value!({"keep": 1}));
/// ```
pub fn deep_clone(host: &HostValue) -> Result<Value> {
    let text = crate::encode(host)?;
    Ok(crate::decode(&text)?)
}

/// Copies a typed value through its text form.
///
/// # Errors
///
/// Fails when `T` cannot be encoded, or when the encoded form no longer
/// deserializes into `T` (for example a `NaN` field).
pub fn deep_clone_value<T>(value: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let text = crate::to_string(value)?;
    Ok(crate::from_str(&text)?)
}

/// Returns the text used to compare values for deduplication: the encoding
/// with no hooks and no indentation.
///
/// # Errors
///
/// Fails exactly when [`encode`](crate::encode) fails.
pub fn canonical_key(host: &HostValue) -> std::result::Result<String, EncodeError> {
    crate::encode_with(host, &EncodeOptions::new())
}

/// Returns `true` if both values have the same canonical key.
///
/// # Errors
///
/// Fails if either value cannot be encoded.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{canonical_eq, HostValue};
///
/// let a = HostValue::object([("a", HostValue::from(1)), ("b", HostValue::from(2))]);
/// let b = HostValue::object([("b", HostValue::from(2)), ("a", HostValue::from(1))]);
/// assert!(canonical_eq(&a, &a.clone()).unwrap());
/// assert!(!canonical_eq(&a, &b).unwrap());
/// ```
pub fn canonical_eq(a: &HostValue, b: &HostValue) -> std::result::Result<bool, EncodeError> {
    Ok(canonical_key(a)? == canonical_key(b)?)
}

/// Removes canonically equal duplicates.
///
/// For each group of equal items only the last occurrence survives, and it
/// stays where that last occurrence was.
///
/// # Errors
///
/// If any item cannot be encoded the whole call fails with that item's
/// error.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{dedup, encode, HostValue};
///
/// let user = |id: i32, name: &str| {
///     HostValue::object([("id", HostValue::from(id)), ("name", HostValue::from(name))])
/// };
/// let unique = dedup(&[user(1, "A"), user(2, "B"), user(1, "A")]).unwrap();
/// let unique = HostValue::array(unique);
/// assert_eq!(encode(&unique).unwrap(), r#"[{"id":2,"name":"B"},{"id":1,"name":"A"}]"#);
/// ```
pub fn dedup(items: &[HostValue]) -> std::result::Result<Vec<HostValue>, EncodeError> {
    let keys = items
        .iter()
        .map(canonical_key)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut seen = HashSet::with_capacity(keys.len());
    let mut kept: Vec<HostValue> = items
        .iter()
        .zip(&keys)
        .rev()
        .filter(|(_, key)| seen.insert(key.as_str()))
        .map(|(item, _)| item.clone())
        .collect();
    kept.reverse();
    Ok(kept)
}

/// Decodes `text`, or returns `fallback` if it is malformed.
///
/// The failure is logged at `warn` level and never propagated.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{safe_decode, value, Value};
///
/// assert_eq!(safe_decode(r#"{"ok":true}"#, Value::Null), value!({"ok": true}));
/// assert_eq!(safe_decode("not json", value!({})), value!({}));
/// ```
pub fn safe_decode(text: &str, fallback: Value) -> Value {
    safe_decode_with(text, fallback, |err| {
        warn!("decode failed, using fallback: {}", err);
    })
}

/// Like [`safe_decode`], but hands the error to `report` instead of the log.
pub fn safe_decode_with<F>(text: &str, fallback: Value, report: F) -> Value
where
    F: FnOnce(&DecodeError),
{
    match crate::decode(text) {
        Ok(value) => value,
        Err(err) => {
            report(&err);
            fallback
        }
    }
}

/// Returns `true` if `text` is exactly one well-formed value.
#[must_use]
pub fn is_valid(text: &str) -> bool {
    crate::de::Parser::new(text).parse().is_ok()
}
