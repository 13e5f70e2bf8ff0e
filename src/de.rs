//! Decoding: JSON text to values.
//!
//! [`Parser`] is a strict, single-pass, recursive-descent parser over the
//! standard JSON grammar. It never backtracks and never recovers: the first
//! violation is reported as [`DecodeError::Syntax`] with its byte offset.
//! Comments, unquoted or single-quoted keys, trailing commas, leading zeros,
//! `NaN`/`Infinity` and trailing text are all rejected. So are `\u` escapes
//! naming a lone surrogate (`"\ud800"`), since a `String` cannot hold one;
//! properly paired surrogates decode to their code point.
//!
//! When a reviver is configured it runs after parsing, post-order: every
//! child is revived before its parent, and the root is revived last with the
//! key `""`. An omitted array element is removed, so later elements shift
//! down.
//!
//! `Value` also implements [`serde::Deserializer`], which is how
//! [`from_str`](crate::from_str) produces typed results.
//!
//! ## Usage
//!
//! ```rust
//! use serde_canon::from_str;
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug, PartialEq)]
//! struct Data { x: i32, tags: Vec<String>, note: Option<String> }
//!
//! let data: Data = from_str(r#"{"x": 1, "tags": ["a"]}"#).unwrap();
//! assert_eq!(data, Data { x: 1, tags: vec!["a".into()], note: None });
//! ```

use crate::grammar::{is_whitespace, DEFAULT_MAX_DEPTH};
use crate::options::Reviver;
use crate::{DecodeError, DecodeOptions, Hooked, Map, Number, Value};
use serde::de::{self, IntoDeserializer};
use serde::forward_to_deserialize_any;

type Result<T> = std::result::Result<T, DecodeError>;

/// The JSON text parser.
pub struct Parser<'a> {
    input: &'a str,
    position: usize,
    depth: usize,
    max_depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(input: &'a str) -> Self {
        Parser {
            input,
            position: 0,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses the whole input as exactly one value.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Syntax`] at the first offset that violates the
    /// grammar, including any non-whitespace text after the value.
    pub fn parse(mut self) -> Result<Value> {
        self.skip_whitespace();
        let value = self.parse_value()?;
        self.skip_whitespace();
        if self.position < self.input.len() {
            return Err(self.error("trailing characters after value"));
        }
        Ok(value)
    }

    fn error(&self, msg: &str) -> DecodeError {
        DecodeError::syntax(self.input, self.position, msg)
    }

    fn error_at(&self, position: usize, msg: &str) -> DecodeError {
        DecodeError::syntax(self.input, position, msg)
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.input.as_bytes().get(self.position).copied()
    }

    #[inline]
    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(b) if is_whitespace(b)) {
            self.position += 1;
        }
    }

    fn expect(&mut self, byte: u8, msg: &str) -> Result<()> {
        if self.peek() == Some(byte) {
            self.position += 1;
            Ok(())
        } else {
            Err(self.error(msg))
        }
    }

    fn parse_value(&mut self) -> Result<Value> {
        match self.peek() {
            None => Err(self.error("unexpected end of input")),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(b'"') => Ok(Value::String(self.parse_string()?)),
            Some(b't') => self.parse_literal("true", Value::Bool(true)),
            Some(b'f') => self.parse_literal("false", Value::Bool(false)),
            Some(b'n') => self.parse_literal("null", Value::Null),
            Some(b'-' | b'0'..=b'9') => Ok(Value::Number(self.parse_number()?)),
            Some(b'\'') => Err(self.error("strings must use double quotes")),
            Some(b'/') => Err(self.error("comments are not allowed")),
            Some(_) => Err(self.error("expected value")),
        }
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> Result<Value> {
        if self.input[self.position..].starts_with(literal) {
            self.position += literal.len();
            Ok(value)
        } else {
            Err(self.error("invalid literal"))
        }
    }

    fn consume_digits(&mut self) -> usize {
        let start = self.position;
        while matches!(self.peek(), Some(b'0'..=b'9')) {
            self.position += 1;
        }
        self.position - start
    }

    fn parse_number(&mut self) -> Result<Number> {
        let start = self.position;

        if self.peek() == Some(b'-') {
            self.position += 1;
        }

        match self.peek() {
            Some(b'0') => {
                self.position += 1;
                if matches!(self.peek(), Some(b'0'..=b'9')) {
                    return Err(self.error("leading zeros are not allowed"));
                }
            }
            Some(b'1'..=b'9') => {
                self.consume_digits();
            }
            _ => return Err(self.error("expected digit")),
        }

        if self.peek() == Some(b'.') {
            self.position += 1;
            if self.consume_digits() == 0 {
                return Err(self.error("expected digit after decimal point"));
            }
        }

        if matches!(self.peek(), Some(b'e' | b'E')) {
            self.position += 1;
            if matches!(self.peek(), Some(b'+' | b'-')) {
                self.position += 1;
            }
            if self.consume_digits() == 0 {
                return Err(self.error("expected digit in exponent"));
            }
        }

        let text = &self.input[start..self.position];
        text.parse::<f64>()
            .ok()
            .and_then(Number::new)
            .ok_or_else(|| self.error_at(start, "number out of range"))
    }

    fn parse_string(&mut self) -> Result<String> {
        self.expect(b'"', "expected string")?;
        let mut result = String::new();

        loop {
            // Copy the run of bytes that need no attention in one go. Runs
            // only stop at ASCII bytes, so slicing stays on char boundaries.
            let run_start = self.position;
            while matches!(self.peek(), Some(b) if b != b'"' && b != b'\\' && b >= 0x20) {
                self.position += 1;
            }
            result.push_str(&self.input[run_start..self.position]);

            match self.peek() {
                None => return Err(self.error("unterminated string")),
                Some(b'"') => {
                    self.position += 1;
                    return Ok(result);
                }
                Some(b'\\') => {
                    self.position += 1;
                    let ch = self.parse_escape()?;
                    result.push(ch);
                }
                Some(_) => return Err(self.error("control character in string")),
            }
        }
    }

    fn parse_escape(&mut self) -> Result<char> {
        let ch = match self.peek() {
            None => return Err(self.error("unterminated string")),
            Some(b'"') => '"',
            Some(b'\\') => '\\',
            Some(b'/') => '/',
            Some(b'b') => '\u{0008}',
            Some(b'f') => '\u{000C}',
            Some(b'n') => '\n',
            Some(b'r') => '\r',
            Some(b't') => '\t',
            Some(b'u') => {
                self.position += 1;
                return self.parse_unicode_escape();
            }
            Some(_) => return Err(self.error("invalid escape sequence")),
        };
        self.position += 1;
        Ok(ch)
    }

    /// Parses the `XXXX` after `\u`, pairing surrogates.
    fn parse_unicode_escape(&mut self) -> Result<char> {
        let start = self.position;
        let first = self.parse_hex4()?;

        let code_point = match first {
            0xD800..=0xDBFF => {
                if !self.input[self.position..].starts_with("\\u") {
                    return Err(self.error_at(start, "lone leading surrogate in unicode escape"));
                }
                self.position += 2;
                let second = self.parse_hex4()?;
                if !(0xDC00..=0xDFFF).contains(&second) {
                    return Err(self.error_at(start, "invalid surrogate pair in unicode escape"));
                }
                0x10000 + ((u32::from(first) - 0xD800) << 10) + (u32::from(second) - 0xDC00)
            }
            0xDC00..=0xDFFF => {
                return Err(self.error_at(start, "lone trailing surrogate in unicode escape"))
            }
            other => u32::from(other),
        };

        char::from_u32(code_point).ok_or_else(|| self.error_at(start, "invalid unicode code point"))
    }

    fn parse_hex4(&mut self) -> Result<u16> {
        let digits = self
            .input
            .get(self.position..self.position + 4)
            .filter(|s| s.bytes().all(|b| b.is_ascii_hexdigit()))
            .ok_or_else(|| self.error("expected 4 hex digits in unicode escape"))?;
        let value = u16::from_str_radix(digits, 16)
            .map_err(|_| self.error("expected 4 hex digits in unicode escape"))?;
        self.position += 4;
        Ok(value)
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.max_depth {
            return Err(self.error("nesting too deep"));
        }
        self.depth += 1;
        self.position += 1;
        Ok(())
    }

    fn parse_array(&mut self) -> Result<Value> {
        self.enter()?;
        let mut elements = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.position += 1;
            self.depth -= 1;
            return Ok(Value::Array(elements));
        }

        loop {
            self.skip_whitespace();
            if self.peek() == Some(b']') {
                return Err(self.error("trailing comma in array"));
            }
            elements.push(self.parse_value()?);
            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.position += 1,
                Some(b']') => {
                    self.position += 1;
                    break;
                }
                None => return Err(self.error("unexpected end of input in array")),
                Some(_) => return Err(self.error("expected ',' or ']'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(elements))
    }

    fn parse_object(&mut self) -> Result<Value> {
        self.enter()?;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.position += 1;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                Some(b'"') => {}
                Some(b'}') => return Err(self.error("trailing comma in object")),
                Some(b'\'') => return Err(self.error("keys must use double quotes")),
                None => return Err(self.error("unexpected end of input in object")),
                Some(_) => return Err(self.error("expected string key")),
            }
            let key = self.parse_string()?;

            self.skip_whitespace();
            self.expect(b':', "expected ':' after key")?;
            self.skip_whitespace();

            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                Some(b',') => self.position += 1,
                Some(b'}') => {
                    self.position += 1;
                    break;
                }
                None => return Err(self.error("unexpected end of input in object")),
                Some(_) => return Err(self.error("expected ',' or '}'")),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }
}

/// Parses `input` and applies the configured reviver.
///
/// # Errors
///
/// Returns a syntax error for malformed text or [`DecodeError::Reviver`] if
/// the reviver fails.
pub fn decode(input: &str, options: &DecodeOptions) -> Result<Value> {
    let value = Parser::new(input)
        .with_max_depth(options.max_depth)
        .parse()?;

    match &options.reviver {
        Some(reviver) => match revive(reviver, "", value)? {
            Hooked::Keep(value) => Ok(value),
            Hooked::Omit => Ok(Value::Null),
        },
        None => Ok(value),
    }
}

fn revive(reviver: &Reviver, key: &str, value: Value) -> Result<Hooked<Value>> {
    let value = match value {
        Value::Array(items) => {
            let mut kept = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                if let Hooked::Keep(item) = revive(reviver, &index.to_string(), item)? {
                    kept.push(item);
                }
            }
            Value::Array(kept)
        }
        Value::Object(fields) => {
            let mut kept = Map::with_capacity(fields.len());
            for (field, item) in fields {
                if let Hooked::Keep(item) = revive(reviver, &field, item)? {
                    kept.insert(field, item);
                }
            }
            Value::Object(kept)
        }
        leaf => leaf,
    };
    reviver(key, value).map_err(DecodeError::Reviver)
}

/// Interprets a `Value` as an instance of type `T`.
///
/// # Errors
///
/// Returns [`DecodeError::Custom`] when the value's shape does not fit `T`.
pub fn from_value<T>(value: Value) -> Result<T>
where
    T: de::DeserializeOwned,
{
    T::deserialize(value)
}

impl<'de> de::Deserializer<'de> for Value {
    type Error = DecodeError;

    fn deserialize_any<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::Number(n) => {
                let f = n.as_f64();
                match n.as_i64() {
                    Some(i) => visitor.visit_i64(i),
                    None if n.is_integer() && f > 0.0 && f < u64::MAX as f64 => {
                        visitor.visit_u64(f as u64)
                    }
                    None => visitor.visit_f64(f),
                }
            }
            Value::String(s) => visitor.visit_string(s),
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
        }
    }

    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self {
            Value::String(s) => visitor.visit_enum(s.into_deserializer()),
            Value::Object(obj) => {
                let mut iter = obj.into_iter();
                match (iter.next(), iter.next()) {
                    (Some((variant, value)), None) => {
                        visitor.visit_enum(EnumDeserializer::new(variant, value))
                    }
                    _ => Err(DecodeError::custom(
                        "expected an object with a single variant key",
                    )),
                }
            }
            other => Err(DecodeError::custom(format!(
                "expected enum, found {}",
                other.kind()
            ))),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct seq tuple
        tuple_struct map struct identifier ignored_any
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Value>,
}

impl SeqDeserializer {
    fn new(vec: Vec<Value>) -> Self {
        SeqDeserializer {
            iter: vec.into_iter(),
        }
    }
}

impl<'de> de::SeqAccess<'de> for SeqDeserializer {
    type Error = DecodeError;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some(value) => seed.deserialize(value).map(Some),
            None => Ok(None),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct MapDeserializer {
    iter: indexmap::map::IntoIter<String, Value>,
    value: Option<Value>,
}

impl MapDeserializer {
    fn new(map: Map) -> Self {
        MapDeserializer {
            iter: map.into_iter(),
            value: None,
        }
    }
}

impl<'de> de::MapAccess<'de> for MapDeserializer {
    type Error = DecodeError;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: de::DeserializeSeed<'de>,
    {
        match self.iter.next() {
            Some((key, value)) => {
                self.value = Some(value);
                seed.deserialize(Value::String(key)).map(Some)
            }
            None => Ok(None),
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: de::DeserializeSeed<'de>,
    {
        match self.value.take() {
            Some(value) => seed.deserialize(value),
            None => Err(DecodeError::custom(
                "next_value_seed called before next_key_seed",
            )),
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.iter.len())
    }
}

struct EnumDeserializer {
    variant: String,
    value: Value,
}

impl EnumDeserializer {
    fn new(variant: String, value: Value) -> Self {
        EnumDeserializer { variant, value }
    }
}

impl<'de> de::EnumAccess<'de> for EnumDeserializer {
    type Error = DecodeError;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: de::DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Value::String(self.variant))?;
        Ok((variant, VariantDeserializer { value: self.value }))
    }
}

struct VariantDeserializer {
    value: Value,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer {
    type Error = DecodeError;

    fn unit_variant(self) -> Result<()> {
        match self.value {
            Value::Null => Ok(()),
            _ => Err(DecodeError::custom("expected unit variant")),
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value>
    where
        T: de::DeserializeSeed<'de>,
    {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V>(self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Array(arr) => visitor.visit_seq(SeqDeserializer::new(arr)),
            _ => Err(DecodeError::custom("expected tuple variant")),
        }
    }

    fn struct_variant<V>(self, _fields: &'static [&'static str], visitor: V) -> Result<V::Value>
    where
        V: de::Visitor<'de>,
    {
        match self.value {
            Value::Object(obj) => visitor.visit_map(MapDeserializer::new(obj)),
            _ => Err(DecodeError::custom("expected struct variant")),
        }
    }
}
