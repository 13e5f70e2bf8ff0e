//! Host values: the input graph the encoder walks.
//!
//! Unlike [`Value`], a [`HostValue`] graph may share containers between
//! several parents and may even contain cycles, because arrays and objects are
//! reference-counted cells. It also has kinds JSON text cannot express
//! (`Undefined`, functions, symbols, big integers), which the encoder either
//! omits, null-fills, or rejects.
//!
//! ## Examples
//!
//! ```rust
//! use serde_canon::{encode, EncodeError, HostObject, HostValue};
//!
//! let node = HostObject::new();
//! node.set("name", "root");
//! node.set("self", node.clone());
//!
//! let err = encode(&HostValue::from(node)).unwrap_err();
//! assert!(matches!(err, EncodeError::CyclicReference { .. }));
//! ```

use crate::{Map, Value};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use num_bigint::BigInt;
use serde::Serialize;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// An object's own override of its representation.
///
/// Called with the key the object is stored under (`""` at the root) and the
/// object itself; whatever it returns is encoded instead, without running
/// this hook again.
pub type CustomEncode = Rc<dyn Fn(&str, &HostValue) -> HostValue>;

/// Any value a caller can hand to the encoder.
#[derive(Clone, Debug, Default)]
pub enum HostValue {
    /// Absent value: omitted as an object field, `null` as an array element.
    #[default]
    Undefined,
    /// Opaque callable handle; treated like `Undefined`.
    Function(String),
    /// Opaque unique handle; treated like `Undefined`.
    Symbol(String),
    Null,
    Bool(bool),
    /// May be non-finite; the encoder rejects `NaN` and the infinities.
    Number(f64),
    /// Has no JSON form; a hook must convert it before it reaches the encoder.
    BigInt(BigInt),
    String(String),
    /// Encodes as its ISO-8601 string, e.g. `2000-01-15T00:00:00.000Z`.
    Date(DateTime<Utc>),
    Array(HostArray),
    Object(HostObject),
}

impl HostValue {
    /// Builds an object value from key/value pairs.
    ///
    /// ```rust
    /// use serde_canon::{encode, HostValue};
    ///
    /// let user = HostValue::object([("id", HostValue::from(1)), ("name", HostValue::from("A"))]);
    /// assert_eq!(encode(&user).unwrap(), r#"{"id":1,"name":"A"}"#);
    /// ```
    pub fn object<K, I>(fields: I) -> HostValue
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, HostValue)>,
    {
        let object = HostObject::new();
        for (key, value) in fields {
            object.set(key, value);
        }
        HostValue::Object(object)
    }

    /// Builds an array value from its elements.
    pub fn array<I>(items: I) -> HostValue
    where
        I: IntoIterator<Item = HostValue>,
    {
        HostValue::Array(HostArray::from_vec(items.into_iter().collect()))
    }

    /// Converts any `T: Serialize` into a fresh host graph.
    ///
    /// `None` becomes `Undefined`, so optional struct fields that are unset
    /// disappear from the encoded object.
    ///
    /// # Errors
    ///
    /// Fails if `T`'s `Serialize` impl reports an error or produces a map
    /// key that is not a string, number, or boolean.
    pub fn from_serialize<T>(value: &T) -> Result<HostValue, crate::EncodeError>
    where
        T: ?Sized + Serialize,
    {
        value.serialize(crate::ser::HostSerializer)
    }

    /// Returns `true` for the kinds the grammar cannot express at all.
    #[must_use]
    pub const fn is_unrepresentable(&self) -> bool {
        matches!(
            self,
            HostValue::Undefined | HostValue::Function(_) | HostValue::Symbol(_)
        )
    }
}

/// Formats a date the way `Date.prototype.toISOString` does.
pub(crate) fn iso_string(date: &DateTime<Utc>) -> String {
    date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A shared, mutable array.
///
/// Cloning a `HostArray` clones the handle, not the elements.
#[derive(Clone, Default)]
pub struct HostArray(Rc<RefCell<Vec<HostValue>>>);

impl HostArray {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_vec(items: Vec<HostValue>) -> Self {
        HostArray(Rc::new(RefCell::new(items)))
    }

    pub fn push(&self, value: impl Into<HostValue>) {
        self.0.borrow_mut().push(value.into());
    }

    /// Replaces the element at `index`, returning `false` if out of bounds.
    pub fn set(&self, index: usize, value: impl Into<HostValue>) -> bool {
        match self.0.borrow_mut().get_mut(index) {
            Some(slot) => {
                *slot = value.into();
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<HostValue> {
        self.0.borrow().get(index).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }

    /// Copies out the element handles so no borrow outlives the call.
    #[must_use]
    pub fn to_vec(&self) -> Vec<HostValue> {
        self.0.borrow().clone()
    }

    /// Returns `true` if both handles point at the same array.
    #[must_use]
    pub fn ptr_eq(&self, other: &HostArray) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for HostArray {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Shallow on purpose: the graph may be cyclic.
        f.debug_struct("HostArray")
            .field("len", &self.len())
            .finish()
    }
}

#[derive(Default)]
struct ObjectSlot {
    fields: IndexMap<String, HostValue>,
    custom_encode: Option<CustomEncode>,
}

/// A shared, mutable object with ordered fields and an optional
/// [`CustomEncode`] hook.
///
/// Cloning a `HostObject` clones the handle, not the fields.
///
/// # Examples
///
/// ```rust
/// use serde_canon::{encode, HostObject, HostValue};
///
/// let person = HostObject::new();
/// person.set("firstName", "John");
/// person.set("lastName", "Doe");
/// person.set("ssn", "123-45-6789");
/// let person = person.with_custom_encode(|_key, this| {
///     let HostValue::Object(obj) = this else { return this.clone() };
///     let first = obj.get("firstName").and_then(|v| v.as_str().map(String::from));
///     let last = obj.get("lastName").and_then(|v| v.as_str().map(String::from));
///     HostValue::object([(
///         "fullName",
///         HostValue::from(format!("{} {}", first.unwrap_or_default(), last.unwrap_or_default())),
///     )])
/// });
///
/// assert_eq!(encode(&person.into()).unwrap(), r#"{"fullName":"John Doe"}"#);
/// ```
#[derive(Clone, Default)]
pub struct HostObject(Rc<RefCell<ObjectSlot>>);

impl HostObject {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a custom encode hook, replacing any previous one.
    #[must_use]
    pub fn with_custom_encode<F>(self, hook: F) -> Self
    where
        F: Fn(&str, &HostValue) -> HostValue + 'static,
    {
        self.0.borrow_mut().custom_encode = Some(Rc::new(hook));
        self
    }

    /// Sets a field. An existing key keeps its position.
    pub fn set(&self, key: impl Into<String>, value: impl Into<HostValue>) {
        self.0.borrow_mut().fields.insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<HostValue> {
        self.0.borrow_mut().fields.shift_remove(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<HostValue> {
        self.0.borrow().fields.get(key).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().fields.is_empty()
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.0.borrow().fields.keys().cloned().collect()
    }

    /// Copies out the field handles in order so no borrow outlives the call.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, HostValue)> {
        self.0
            .borrow()
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[must_use]
    pub fn custom_encode(&self) -> Option<CustomEncode> {
        self.0.borrow().custom_encode.clone()
    }

    /// Returns `true` if both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &HostObject) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn id(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }
}

impl fmt::Debug for HostObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostObject")
            .field("keys", &self.keys())
            .field("custom_encode", &self.custom_encode().is_some())
            .finish()
    }
}

impl HostValue {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            HostValue::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            HostValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&HostObject> {
        match self {
            HostValue::Object(obj) => Some(obj),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&HostArray> {
        match self {
            HostValue::Array(arr) => Some(arr),
            _ => None,
        }
    }
}

/// Builds an unshared host graph with the same shape.
impl From<Value> for HostValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => HostValue::Null,
            Value::Bool(b) => HostValue::Bool(b),
            Value::Number(n) => HostValue::Number(n.as_f64()),
            Value::String(s) => HostValue::String(s),
            Value::Array(items) => HostValue::array(items.into_iter().map(HostValue::from)),
            Value::Object(map) => HostValue::from(map),
        }
    }
}

impl From<Map> for HostValue {
    fn from(map: Map) -> Self {
        HostValue::object(map.into_iter().map(|(k, v)| (k, HostValue::from(v))))
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        HostValue::Bool(value)
    }
}

impl From<i32> for HostValue {
    fn from(value: i32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<u32> for HostValue {
    fn from(value: u32) -> Self {
        HostValue::Number(f64::from(value))
    }
}

impl From<i64> for HostValue {
    fn from(value: i64) -> Self {
        HostValue::Number(value as f64)
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        HostValue::Number(value)
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        HostValue::String(value.to_string())
    }
}

impl From<String> for HostValue {
    fn from(value: String) -> Self {
        HostValue::String(value)
    }
}

impl From<BigInt> for HostValue {
    fn from(value: BigInt) -> Self {
        HostValue::BigInt(value)
    }
}

impl From<DateTime<Utc>> for HostValue {
    fn from(value: DateTime<Utc>) -> Self {
        HostValue::Date(value)
    }
}

impl From<Vec<HostValue>> for HostValue {
    fn from(value: Vec<HostValue>) -> Self {
        HostValue::Array(HostArray::from_vec(value))
    }
}

impl From<HostArray> for HostValue {
    fn from(value: HostArray) -> Self {
        HostValue::Array(value)
    }
}

impl From<HostObject> for HostValue {
    fn from(value: HostObject) -> Self {
        HostValue::Object(value)
    }
}

impl<T: Into<HostValue>> From<Option<T>> for HostValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(HostValue::Undefined, Into::into)
    }
}
