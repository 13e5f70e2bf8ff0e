//! Encoding: host values to JSON text.
//!
//! The [`Encoder`] walks a [`HostValue`] graph depth-first. For every node it
//! runs, in order:
//!
//! 1. the node's custom encode hook (objects with one, and dates), once;
//! 2. the configured filter hook, with the node's key (`""` for the root);
//! 3. classification into a [`Value`] kind, or "unrepresentable";
//! 4. the key allowlist, on every object level;
//! 5. the cycle check against the containers currently being walked, and
//!    the nesting limit from [`EncodeOptions::max_depth`].
//!
//! Unrepresentable nodes and nodes the filter omits vanish from objects but
//! become `null` in arrays, so array indices stay aligned. Shared containers
//! that are not cyclic are emitted once per occurrence.
//!
//! [`HostSerializer`] is the serde side: it turns any `T: Serialize` into a
//! host graph the encoder can walk.
//!
//! ## Usage
//!
//! ```rust
//! use serde_canon::{to_string, to_string_pretty};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Data { x: i32, label: Option<String> }
//!
//! let data = Data { x: 1, label: None };
//! assert_eq!(to_string(&data).unwrap(), r#"{"x":1}"#);
//! assert_eq!(to_string_pretty(&vec![1, 2]).unwrap(), "[\n  1,\n  2\n]");
//! ```

use crate::host::iso_string;
use crate::{grammar, EncodeError, EncodeOptions, Hooked, HostArray, HostObject, HostValue};
use crate::{Map, Number, Value};
use num_bigint::BigInt;
use serde::{ser, Serialize};

type Result<T> = std::result::Result<T, EncodeError>;

/// The host-value encoder.
///
/// One encoder may be reused for several calls; each call starts with an
/// empty ancestor stack.
pub struct Encoder<'a> {
    options: &'a EncodeOptions,
    // Identities of the arrays/objects on the current path.
    ancestors: Vec<usize>,
}

impl<'a> Encoder<'a> {
    pub fn new(options: &'a EncodeOptions) -> Self {
        Encoder {
            options,
            ancestors: Vec::new(),
        }
    }

    /// Encodes `host` to text.
    ///
    /// # Errors
    ///
    /// See [`Encoder::to_value`].
    pub fn encode(&mut self, host: &HostValue) -> Result<String> {
        let value = self.to_value(host)?;
        let mut output = String::with_capacity(256);
        write_value(&mut output, &value, self.options.indent);
        Ok(output)
    }

    /// Reduces `host` to the [`Value`] that would be emitted, with all hooks
    /// and omission rules applied.
    ///
    /// # Errors
    ///
    /// Fails on cycles, non-finite numbers, big integers, filter errors, and
    /// when the root itself is omitted or unrepresentable.
    pub fn to_value(&mut self, host: &HostValue) -> Result<Value> {
        self.ancestors.clear();
        self.property("", host.clone())?
            .ok_or(EncodeError::UnrepresentableRoot)
    }

    /// Resolves one node; `None` means "omit" (or `null` in an array).
    fn property(&mut self, key: &str, host: HostValue) -> Result<Option<Value>> {
        let options = self.options;
        let mut host = custom_encode(key, host);

        if let Some(filter) = options.filter() {
            match filter(key, &host) {
                Ok(Hooked::Keep(replacement)) => host = replacement,
                Ok(Hooked::Omit) => return Ok(None),
                Err(source) => {
                    return Err(EncodeError::Filter {
                        key: key.to_string(),
                        source,
                    })
                }
            }
        }

        self.classify(key, host)
    }

    fn classify(&mut self, key: &str, host: HostValue) -> Result<Option<Value>> {
        let value = match host {
            HostValue::Undefined | HostValue::Function(_) | HostValue::Symbol(_) => {
                return Ok(None)
            }
            HostValue::Null => Value::Null,
            HostValue::Bool(b) => Value::Bool(b),
            HostValue::Number(n) => {
                Value::Number(Number::new(n).ok_or(EncodeError::UnrepresentableNumber(n))?)
            }
            HostValue::BigInt(_) => return Err(EncodeError::UnsupportedType("BigInt")),
            HostValue::String(s) => Value::String(s),
            // A date that survives to here was produced by a hook; its custom
            // encode does not run again and it has no fields of its own.
            HostValue::Date(_) => Value::Object(Map::new()),
            HostValue::Array(arr) => self.array(key, &arr)?,
            HostValue::Object(obj) => self.object(key, &obj)?,
        };
        Ok(Some(value))
    }

    fn enter(&mut self, key: &str, id: usize) -> Result<()> {
        if self.ancestors.len() >= self.options.max_depth {
            return Err(EncodeError::DepthLimitExceeded {
                key: key.to_string(),
            });
        }
        if self.ancestors.contains(&id) {
            return Err(EncodeError::CyclicReference {
                key: key.to_string(),
            });
        }
        self.ancestors.push(id);
        Ok(())
    }

    fn array(&mut self, key: &str, arr: &HostArray) -> Result<Value> {
        self.enter(key, arr.id())?;
        let items = arr.to_vec();
        let mut elements = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let element = self.property(&index.to_string(), item)?;
            elements.push(element.unwrap_or(Value::Null));
        }
        self.ancestors.pop();
        Ok(Value::Array(elements))
    }

    fn object(&mut self, key: &str, obj: &HostObject) -> Result<Value> {
        self.enter(key, obj.id())?;
        let options = self.options;
        let entries = match options.allowlist() {
            Some(keys) => keys
                .iter()
                .filter_map(|k| obj.get(k).map(|v| (k.clone(), v)))
                .collect(),
            None => obj.entries(),
        };
        let mut fields = Map::with_capacity(entries.len());
        for (field, host) in entries {
            if let Some(value) = self.property(&field, host)? {
                fields.insert(field, value);
            }
        }
        self.ancestors.pop();
        Ok(Value::Object(fields))
    }
}

fn custom_encode(key: &str, host: HostValue) -> HostValue {
    let hook = match &host {
        HostValue::Object(obj) => obj.custom_encode(),
        HostValue::Date(date) => return HostValue::String(iso_string(date)),
        _ => None,
    };
    match hook {
        Some(hook) => hook(key, &host),
        None => host,
    }
}

/// Appends the text form of `value`. `indent` is the number of spaces per
/// level; `0` writes the compact form.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{ser::write_value, value};
///
/// let mut out = String::new();
/// write_value(&mut out, &value!({"a": [1, {}], "b": []}), 2);
/// assert_eq!(out, "{\n  \"a\": [\n    1,\n    {}\n  ],\n  \"b\": []\n}");
/// ```
pub fn write_value(output: &mut String, value: &Value, indent: usize) {
    write_nested(output, value, indent, 0);
}

fn write_nested(output: &mut String, value: &Value, indent: usize, depth: usize) {
    match value {
        Value::Null => output.push_str("null"),
        Value::Bool(b) => output.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => grammar::write_number(output, n.as_f64()),
        Value::String(s) => grammar::write_string(output, s),
        Value::Array(items) => {
            if items.is_empty() {
                output.push_str("[]");
                return;
            }
            output.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                write_newline(output, indent, depth + 1);
                write_nested(output, item, indent, depth + 1);
            }
            write_newline(output, indent, depth);
            output.push(']');
        }
        Value::Object(fields) => {
            if fields.is_empty() {
                output.push_str("{}");
                return;
            }
            output.push('{');
            for (i, (key, item)) in fields.iter().enumerate() {
                if i > 0 {
                    output.push(',');
                }
                write_newline(output, indent, depth + 1);
                grammar::write_string(output, key);
                output.push(':');
                if indent > 0 {
                    output.push(' ');
                }
                write_nested(output, item, indent, depth + 1);
            }
            write_newline(output, indent, depth);
            output.push('}');
        }
    }
}

#[inline]
fn write_newline(output: &mut String, indent: usize, depth: usize) {
    if indent > 0 {
        output.push('\n');
        output.extend(std::iter::repeat(' ').take(indent * depth));
    }
}

/// Serde serializer that builds a [`HostValue`].
///
/// `None` maps to [`HostValue::Undefined`]; unit and unit structs map to
/// `Null`; enum variants with data map to single-key objects.
pub struct HostSerializer;

pub struct SerializeVec {
    vec: Vec<HostValue>,
    variant: Option<&'static str>,
}

pub struct SerializeMap {
    object: HostObject,
    current_key: Option<String>,
    variant: Option<&'static str>,
}

fn wrap_variant(variant: Option<&'static str>, value: HostValue) -> HostValue {
    match variant {
        Some(name) => HostValue::object([(name, value)]),
        None => value,
    }
}

impl ser::Serializer for HostSerializer {
    type Ok = HostValue;
    type Error = EncodeError;

    type SerializeSeq = SerializeVec;
    type SerializeTuple = SerializeVec;
    type SerializeTupleStruct = SerializeVec;
    type SerializeTupleVariant = SerializeVec;
    type SerializeMap = SerializeMap;
    type SerializeStruct = SerializeMap;
    type SerializeStructVariant = SerializeMap;

    fn serialize_bool(self, v: bool) -> Result<HostValue> {
        Ok(HostValue::Bool(v))
    }

    fn serialize_i8(self, v: i8) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i16(self, v: i16) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i32(self, v: i32) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_i64(self, v: i64) -> Result<HostValue> {
        Ok(HostValue::Number(v as f64))
    }

    fn serialize_i128(self, v: i128) -> Result<HostValue> {
        Ok(HostValue::BigInt(BigInt::from(v)))
    }

    fn serialize_u8(self, v: u8) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u16(self, v: u16) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u32(self, v: u32) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_u64(self, v: u64) -> Result<HostValue> {
        Ok(HostValue::Number(v as f64))
    }

    fn serialize_u128(self, v: u128) -> Result<HostValue> {
        Ok(HostValue::BigInt(BigInt::from(v)))
    }

    fn serialize_f32(self, v: f32) -> Result<HostValue> {
        Ok(HostValue::Number(f64::from(v)))
    }

    fn serialize_f64(self, v: f64) -> Result<HostValue> {
        Ok(HostValue::Number(v))
    }

    fn serialize_char(self, v: char) -> Result<HostValue> {
        Ok(HostValue::String(v.to_string()))
    }

    fn serialize_str(self, v: &str) -> Result<HostValue> {
        Ok(HostValue::String(v.to_string()))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<HostValue> {
        Ok(HostValue::array(
            v.iter().map(|&b| HostValue::Number(f64::from(b))),
        ))
    }

    fn serialize_none(self) -> Result<HostValue> {
        Ok(HostValue::Undefined)
    }

    fn serialize_some<T>(self, value: &T) -> Result<HostValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<HostValue> {
        Ok(HostValue::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<HostValue> {
        Ok(HostValue::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
    ) -> Result<HostValue> {
        Ok(HostValue::String(variant.to_string()))
    }

    fn serialize_newtype_struct<T>(self, _name: &'static str, value: &T) -> Result<HostValue>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T>(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<HostValue>
    where
        T: ?Sized + Serialize,
    {
        Ok(wrap_variant(Some(variant), value.serialize(self)?))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len.unwrap_or(0), None))
    }

    fn serialize_tuple(self, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_struct(self, _name: &'static str, len: usize) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, None))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<SerializeVec> {
        Ok(SerializeVec::new(len, Some(variant)))
    }

    fn serialize_map(self, _len: Option<usize>) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<SerializeMap> {
        Ok(SerializeMap::new(None))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _variant_index: u32,
        variant: &'static str,
        _len: usize,
    ) -> Result<SerializeMap> {
        Ok(SerializeMap::new(Some(variant)))
    }
}

impl SerializeVec {
    fn new(capacity: usize, variant: Option<&'static str>) -> Self {
        SerializeVec {
            vec: Vec::with_capacity(capacity),
            variant,
        }
    }

    fn push<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        self.vec.push(value.serialize(HostSerializer)?);
        Ok(())
    }

    fn finish(self) -> Result<HostValue> {
        Ok(wrap_variant(self.variant, HostValue::from(self.vec)))
    }
}

impl SerializeMap {
    fn new(variant: Option<&'static str>) -> Self {
        SerializeMap {
            object: HostObject::new(),
            current_key: None,
            variant,
        }
    }

    fn finish(self) -> Result<HostValue> {
        Ok(wrap_variant(self.variant, HostValue::Object(self.object)))
    }
}

impl ser::SerializeSeq for SerializeVec {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeTuple for SerializeVec {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_element<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeTupleStruct for SerializeVec {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeTupleVariant for SerializeVec {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.push(value)
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeMap for SerializeMap {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_key<T>(&mut self, key: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = match key.serialize(HostSerializer)? {
            HostValue::String(s) => s,
            HostValue::Bool(b) => b.to_string(),
            HostValue::Number(n) if n.is_finite() => {
                let mut s = String::new();
                grammar::write_number(&mut s, n);
                s
            }
            HostValue::BigInt(n) => n.to_string(),
            _ => return Err(EncodeError::custom("map keys must be strings")),
        };
        self.current_key = Some(key);
        Ok(())
    }

    fn serialize_value<T>(&mut self, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        let key = self
            .current_key
            .take()
            .ok_or_else(|| EncodeError::custom("serialize_value called without serialize_key"))?;
        self.object.set(key, value.serialize(HostSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeStruct for SerializeMap {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.object.set(key, value.serialize(HostSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

impl ser::SerializeStructVariant for SerializeMap {
    type Ok = HostValue;
    type Error = EncodeError;

    fn serialize_field<T>(&mut self, key: &'static str, value: &T) -> Result<()>
    where
        T: ?Sized + Serialize,
    {
        self.object.set(key, value.serialize(HostSerializer)?);
        Ok(())
    }

    fn end(self) -> Result<HostValue> {
        self.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn encode(host: &HostValue) -> Result<String> {
        Encoder::new(&EncodeOptions::new()).encode(host)
    }

    #[test]
    fn test_object_omits_array_nulls() {
        let host = HostValue::object([
            ("a", HostValue::Undefined),
            ("f", HostValue::Function("greet".into())),
            ("b", HostValue::from(1)),
        ]);
        assert_eq!(encode(&host).unwrap(), r#"{"b":1}"#);

        let host = HostValue::array([
            HostValue::Undefined,
            HostValue::Symbol("s".into()),
            HostValue::from(1),
        ]);
        assert_eq!(encode(&host).unwrap(), "[null,null,1]");
    }

    #[test]
    fn test_unrepresentable_root() {
        assert!(matches!(
            encode(&HostValue::Undefined),
            Err(EncodeError::UnrepresentableRoot)
        ));
    }

    #[test]
    fn test_non_finite_number_fails() {
        let host = HostValue::array([HostValue::Number(f64::INFINITY)]);
        assert!(matches!(
            encode(&host),
            Err(EncodeError::UnrepresentableNumber(n)) if n.is_infinite()
        ));
    }

    #[test]
    fn test_self_reference_fails() {
        let arr = HostArray::new();
        arr.push(1);
        arr.push(arr.clone());
        match encode(&HostValue::from(arr)) {
            Err(EncodeError::CyclicReference { key }) => assert_eq!(key, "1"),
            other => panic!("expected cycle error, got {:?}", other),
        }
    }

    #[test]
    fn test_depth_limit() {
        let mut host = HostValue::from(1);
        for _ in 0..4 {
            host = HostValue::array([host]);
        }
        let options = EncodeOptions::new().with_max_depth(4);
        assert_eq!(Encoder::new(&options).encode(&host).unwrap(), "[[[[1]]]]");

        let options = EncodeOptions::new().with_max_depth(3);
        match Encoder::new(&options).encode(&host) {
            Err(EncodeError::DepthLimitExceeded { key }) => assert_eq!(key, "0"),
            other => panic!("expected depth error, got {:?}", other),
        }
    }

    #[test]
    fn test_deep_nesting_fails_cleanly() {
        let handle = std::thread::Builder::new()
            .stack_size(32 * 1024 * 1024)
            .spawn(|| {
                let mut host = HostValue::Null;
                for i in 0..5_000 {
                    host = if i % 2 == 0 {
                        HostValue::array([host])
                    } else {
                        HostValue::object([("next", host)])
                    };
                }
                matches!(encode(&host), Err(EncodeError::DepthLimitExceeded { .. }))
            })
            .unwrap();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn test_shared_subtree_is_copied() {
        let shared = HostObject::new();
        shared.set("v", 1);
        let host = HostValue::object([
            ("x", HostValue::from(shared.clone())),
            ("y", HostValue::from(shared)),
        ]);
        assert_eq!(encode(&host).unwrap(), r#"{"x":{"v":1},"y":{"v":1}}"#);
    }

    #[test]
    fn test_encoder_is_reusable_after_error() {
        let options = EncodeOptions::new();
        let mut encoder = Encoder::new(&options);
        let obj = HostObject::new();
        obj.set("me", obj.clone());
        assert!(encoder.encode(&HostValue::from(obj)).is_err());
        assert_eq!(encoder.encode(&HostValue::from(true)).unwrap(), "true");
    }

    #[test]
    fn test_pretty_layout() {
        let mut out = String::new();
        let value = crate::value!({"a": 1, "b": [true, null]});
        write_value(&mut out, &value, 4);
        assert_eq!(
            out,
            "{\n    \"a\": 1,\n    \"b\": [\n        true,\n        null\n    ]\n}"
        );
    }

    #[test]
    fn test_serializer_options_and_variants() {
        #[derive(Serialize)]
        enum Shape {
            Unit,
            Circle(f64),
            Rect { w: u8, h: u8 },
            Pair(u8, u8),
        }

        let host = HostValue::from_serialize(&vec![
            Shape::Unit,
            Shape::Circle(1.5),
            Shape::Rect { w: 2, h: 3 },
            Shape::Pair(4, 5),
        ])
        .unwrap();
        assert_eq!(
            encode(&host).unwrap(),
            r#"["Unit",{"Circle":1.5},{"Rect":{"w":2,"h":3}},{"Pair":[4,5]}]"#
        );

        let host = HostValue::from_serialize(&vec![Some(1), None]).unwrap();
        assert_eq!(encode(&host).unwrap(), "[1,null]");
    }

    #[test]
    fn test_serializer_stringifies_map_keys() {
        let mut map = BTreeMap::new();
        map.insert(1, "one");
        map.insert(2, "two");
        let host = HostValue::from_serialize(&map).unwrap();
        assert_eq!(encode(&host).unwrap(), r#"{"1":"one","2":"two"}"#);
    }

    #[test]
    fn test_serializer_i128_is_bigint() {
        let host = HostValue::from_serialize(&170141183460469231731687303715884105727i128).unwrap();
        assert!(matches!(host, HostValue::BigInt(_)));
        assert!(matches!(
            encode(&host),
            Err(EncodeError::UnsupportedType("BigInt"))
        ));
    }
}
