//! # serde_canon
//!
//! A strict JSON codec for structured values, with encode/decode hooks, cycle
//! detection and a canonical text form usable as an equality key.
//!
//! ## Overview
//!
//! Two directions, one grammar:
//!
//! - **Encoding** walks a [`HostValue`] graph (which may share or even loop
//!   back to its own containers) and produces standard JSON text. Kinds the
//!   grammar cannot express are omitted from objects and written as `null` in
//!   arrays. Cycles and non-finite numbers are errors.
//! - **Decoding** parses JSON text strictly (no comments, no trailing commas,
//!   no single quotes, no `NaN`) into a [`Value`], then optionally runs a
//!   reviver hook over it, children first.
//!
//! On top of these sit deep clone, canonical equality, deduplication and a
//! safe decode that falls back instead of failing. Any `T: Serialize` can be
//! encoded and any `T: Deserialize` decoded through the serde bridge.
//!
//! ## Quick Start
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use serde_canon::{from_str, to_string};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//!     email: Option<String>,
//! }
//!
//! let user = User { id: 1, name: "Alice".to_string(), email: None };
//!
//! let text = to_string(&user).unwrap();
//! assert_eq!(text, r#"{"id":1,"name":"Alice"}"#);
//!
//! let back: User = from_str(&text).unwrap();
//! assert_eq!(user, back);
//! ```
//!
//! ## Hooks
//!
//! ```rust
//! use serde_canon::{decode_with, encode_with, DecodeOptions, EncodeOptions, Hooked, HostValue, Value};
//!
//! let user = HostValue::object([
//!     ("id", HostValue::from(1)),
//!     ("name", HostValue::from("A")),
//!     ("password", HostValue::from("secret")),
//! ]);
//!
//! // Allowlists apply at every object level, in the order given.
//! let options = EncodeOptions::new().with_allowlist(["name", "id"]);
//! assert_eq!(encode_with(&user, &options).unwrap(), r#"{"name":"A","id":1}"#);
//!
//! let options = DecodeOptions::new().with_reviver(|key, value| {
//!     let value = match (key, value.as_i64()) {
//!         ("id", Some(n)) => Value::from(n * 10),
//!         _ => value,
//!     };
//!     Ok(Hooked::Keep(value))
//! });
//! let v = decode_with(r#"{"id":4}"#, &options).unwrap();
//! assert_eq!(v.to_string(), r#"{"id":40}"#);
//! ```
//!
//! ## Errors
//!
//! Encoding fails with [`EncodeError`], decoding with [`DecodeError`];
//! operations doing both return the umbrella [`Error`]. Only
//! [`safe_decode`] swallows failures, logging them through the `log` facade.

pub mod de;
pub mod derived;
pub mod error;
pub mod grammar;
pub mod host;
pub mod macros;
pub mod map;
pub mod options;
pub mod ser;
pub mod value;

pub use de::{from_value, Parser};
pub use derived::{
    canonical_eq, canonical_key, dedup, deep_clone, deep_clone_value, is_valid, safe_decode,
    safe_decode_with,
};
pub use error::{DecodeError, EncodeError, Error, HookError, Result};
pub use host::{HostArray, HostObject, HostValue};
pub use map::Map;
pub use options::{DecodeOptions, EncodeOptions, Hooked, Selector};
pub use ser::{Encoder, HostSerializer};
pub use value::{Number, Value};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io;

/// Encodes a host value as compact text with no hooks.
///
/// # Errors
///
/// Fails on cycles, non-finite numbers, big integers, and when `host`
/// itself is unrepresentable (`Undefined`, a function or a symbol).
pub fn encode(host: &HostValue) -> Result<String, EncodeError> {
    encode_with(host, &EncodeOptions::default())
}

/// Encodes a host value with the given indentation and hooks.
///
/// # Errors
///
/// As [`encode`], plus [`EncodeError::Filter`] when the filter hook fails.
pub fn encode_with(host: &HostValue, options: &EncodeOptions) -> Result<String, EncodeError> {
    Encoder::new(options).encode(host)
}

/// Decodes text strictly, with no reviver.
///
/// # Errors
///
/// Returns [`DecodeError::Syntax`] carrying the offset of the first
/// violation.
pub fn decode(text: &str) -> Result<Value, DecodeError> {
    decode_with(text, &DecodeOptions::default())
}

/// Decodes text and runs the configured reviver.
///
/// # Errors
///
/// As [`decode`], plus [`DecodeError::Reviver`] when the reviver fails.
pub fn decode_with(text: &str, options: &DecodeOptions) -> Result<Value, DecodeError> {
    de::decode(text, options)
}

/// Serializes any `T: Serialize` to compact text.
///
/// # Examples
///
/// ```rust
/// use serde_canon::to_string;
///
/// assert_eq!(to_string(&vec![Some(1), None]).unwrap(), "[1,null]");
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized (e.g. a `NaN` field or
/// an `i128`).
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string<T>(value: &T) -> Result<String, EncodeError>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::default())
}

/// Serializes any `T: Serialize` to text indented by two spaces per level.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_pretty<T>(value: &T) -> Result<String, EncodeError>
where
    T: ?Sized + Serialize,
{
    to_string_with_options(value, &EncodeOptions::pretty())
}

/// Serializes any `T: Serialize` with custom indentation and hooks.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{to_string_with_options, EncodeOptions};
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Point { x: i32, y: i32, z: i32 }
///
/// let options = EncodeOptions::new().with_allowlist(["y", "x"]);
/// let text = to_string_with_options(&Point { x: 1, y: 2, z: 3 }, &options).unwrap();
/// assert_eq!(text, r#"{"y":2,"x":1}"#);
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or a hook fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_string_with_options<T>(value: &T, options: &EncodeOptions) -> Result<String, EncodeError>
where
    T: ?Sized + Serialize,
{
    let host = HostValue::from_serialize(value)?;
    encode_with(&host, options)
}

/// Converts any `T: Serialize` to the [`Value`] its encoding would decode to.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{to_value, value};
/// use std::collections::BTreeMap;
///
/// let map = BTreeMap::from([("b", 2), ("a", 1)]);
/// assert_eq!(to_value(&map).unwrap(), value!({"a": 1, "b": 2}));
/// ```
///
/// # Errors
///
/// Returns an error if the value cannot be serialized.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_value<T>(value: &T) -> Result<Value, EncodeError>
where
    T: ?Sized + Serialize,
{
    let host = HostValue::from_serialize(value)?;
    Encoder::new(&EncodeOptions::default()).to_value(&host)
}

/// Serializes any `T: Serialize` as compact text into a writer.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer<W, T>(writer: W, value: &T) -> Result<(), EncodeError>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    to_writer_with_options(writer, value, &EncodeOptions::default())
}

/// Serializes any `T: Serialize` into a writer with custom options.
///
/// # Errors
///
/// Returns an error if serialization fails or writing to the writer fails.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn to_writer_with_options<W, T>(
    mut writer: W,
    value: &T,
    options: &EncodeOptions,
) -> Result<(), EncodeError>
where
    W: io::Write,
    T: ?Sized + Serialize,
{
    let text = to_string_with_options(value, options)?;
    writer
        .write_all(text.as_bytes())
        .map_err(|e| EncodeError::Io(e.to_string()))
}

/// Deserializes an instance of type `T` from text.
///
/// # Examples
///
/// ```rust
/// use serde_canon::from_str;
/// use serde::Deserialize;
///
/// #[derive(Deserialize, PartialEq, Debug)]
/// struct Point { x: i32, y: i32 }
///
/// let point: Point = from_str(r#"{"x": 1, "y": 2}"#).unwrap();
/// assert_eq!(point, Point { x: 1, y: 2 });
///
/// assert!(from_str::<Point>("{x: 1, y: 2}").unwrap_err().is_syntax());
/// ```
///
/// # Errors
///
/// Returns a syntax error for malformed text, or [`DecodeError::Custom`] if
/// the value does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_str<T>(s: &str) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    from_value(decode(s)?)
}

/// Deserializes an instance of type `T` from an I/O stream.
///
/// # Errors
///
/// Returns an error if reading fails, the input is malformed, or the data
/// does not fit `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_reader<R, T>(mut reader: R) -> Result<T, DecodeError>
where
    R: io::Read,
    T: DeserializeOwned,
{
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| DecodeError::Io(e.to_string()))?;
    from_str(&text)
}

/// Deserializes an instance of type `T` from UTF-8 bytes.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8, are malformed, or do not fit
/// `T`.
#[must_use = "this returns the result of the operation, errors must be handled"]
pub fn from_slice<T>(v: &[u8]) -> Result<T, DecodeError>
where
    T: DeserializeOwned,
{
    let s = std::str::from_utf8(v).map_err(|e| DecodeError::Io(e.to_string()))?;
    from_str(s)
}
