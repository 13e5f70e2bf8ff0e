//! Configuration for encoding and decoding.
//!
//! Hooks are plain function values carried by these structs; there is no
//! global registry.
//!
//! - [`EncodeOptions`]: indentation plus an optional [`Selector`] (filter hook
//!   or key allowlist)
//! - [`DecodeOptions`]: an optional reviver hook and a nesting limit
//! - [`Hooked`]: what a hook returns; [`Hooked::Omit`] is the removal sentinel,
//!   distinct from `null`
//!
//! ## Examples
//!
//! ```rust
//! use serde_canon::{encode_with, EncodeOptions, HostValue, Hooked};
//!
//! let user = HostValue::object([
//!     ("name", HostValue::from("Bob")),
//!     ("email", HostValue::from("bob@example.com")),
//! ]);
//!
//! let options = EncodeOptions::new().with_filter(|key, value| {
//!     Ok(if key == "email" { Hooked::Omit } else { Hooked::Keep(value.clone()) })
//! });
//! assert_eq!(encode_with(&user, &options).unwrap(), r#"{"name":"Bob"}"#);
//!
//! let options = EncodeOptions::pretty();
//! assert_eq!(
//!     encode_with(&user, &options).unwrap(),
//!     "{\n  \"name\": \"Bob\",\n  \"email\": \"bob@example.com\"\n}"
//! );
//! ```

use crate::error::HookError;
use crate::grammar::DEFAULT_MAX_DEPTH;
use crate::{HostValue, Value};
use std::fmt;
use std::sync::Arc;

/// Result of a filter or reviver hook for one node.
#[derive(Clone, Debug, PartialEq)]
pub enum Hooked<T> {
    /// Use this value for the node.
    Keep(T),
    /// Remove the node: an object field disappears; an array slot becomes
    /// `null` when encoding and is removed when decoding.
    Omit,
}

impl<T> From<T> for Hooked<T> {
    fn from(value: T) -> Self {
        Hooked::Keep(value)
    }
}

/// Top-down encode hook, called with `(key, value)` for every node.
pub type Filter =
    Arc<dyn Fn(&str, &HostValue) -> Result<Hooked<HostValue>, HookError> + Send + Sync>;

/// Bottom-up decode hook, called with `(key, value)` for every node.
pub type Reviver = Arc<dyn Fn(&str, Value) -> Result<Hooked<Value>, HookError> + Send + Sync>;

/// How the encoder narrows what it emits.
#[derive(Clone)]
pub enum Selector {
    Filter(Filter),
    /// Only these object keys are emitted, in this order, at every level.
    Allowlist(Vec<String>),
}

impl fmt::Debug for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Filter(_) => f.write_str("Filter(<fn>)"),
            Selector::Allowlist(keys) => f.debug_tuple("Allowlist").field(keys).finish(),
        }
    }
}

/// Encoder configuration.
///
/// # Examples
///
/// ```rust
/// use serde_canon::EncodeOptions;
///
/// let options = EncodeOptions::new();
/// assert_eq!(options.indent, 0);
///
/// let options = EncodeOptions::pretty().with_indent(4).with_allowlist(["id", "name"]);
/// assert_eq!(options.indent, 4);
/// ```
#[derive(Clone, Debug)]
pub struct EncodeOptions {
    /// Spaces per nesting level; `0` produces the compact form.
    pub indent: usize,
    pub selector: Option<Selector>,
    /// Deepest array/object nesting walked before the encoder gives up.
    pub max_depth: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        EncodeOptions {
            indent: 0,
            selector: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl EncodeOptions {
    /// Compact output, no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Two-space indentation.
    #[must_use]
    pub fn pretty() -> Self {
        EncodeOptions {
            indent: 2,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Installs a filter hook, replacing any allowlist.
    #[must_use]
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str, &HostValue) -> Result<Hooked<HostValue>, HookError> + Send + Sync + 'static,
    {
        self.selector = Some(Selector::Filter(Arc::new(filter)));
        self
    }

    /// Installs a key allowlist, replacing any filter. Repeated keys are
    /// kept once, at their first position.
    #[must_use]
    pub fn with_allowlist<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut allowed: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !allowed.contains(&key) {
                allowed.push(key);
            }
        }
        self.selector = Some(Selector::Allowlist(allowed));
        self
    }

    pub(crate) fn filter(&self) -> Option<&Filter> {
        match &self.selector {
            Some(Selector::Filter(filter)) => Some(filter),
            _ => None,
        }
    }

    pub(crate) fn allowlist(&self) -> Option<&[String]> {
        match &self.selector {
            Some(Selector::Allowlist(keys)) => Some(keys),
            _ => None,
        }
    }
}

/// Decoder configuration.
#[derive(Clone)]
pub struct DecodeOptions {
    pub reviver: Option<Reviver>,
    /// Deepest array/object nesting accepted before a syntax error.
    pub max_depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        DecodeOptions {
            reviver: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl fmt::Debug for DecodeOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodeOptions")
            .field("reviver", &self.reviver.as_ref().map(|_| "<fn>"))
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

impl DecodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a reviver hook.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_canon::{decode_with, DecodeOptions, Hooked, Value};
    ///
    /// let options = DecodeOptions::new().with_reviver(|key, value| {
    ///     Ok(if key == "password" { Hooked::Omit } else { Hooked::Keep(value) })
    /// });
    /// let v = decode_with(r#"{"user":"u","password":"p"}"#, &options).unwrap();
    /// assert_eq!(v.to_string(), r#"{"user":"u"}"#);
    /// ```
    #[must_use]
    pub fn with_reviver<F>(mut self, reviver: F) -> Self
    where
        F: Fn(&str, Value) -> Result<Hooked<Value>, HookError> + Send + Sync + 'static,
    {
        self.reviver = Some(Arc::new(reviver));
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }
}
