//! Error types for encoding and decoding.
//!
//! Encoding and decoding fail in different ways, so each direction has its own
//! error type:
//!
//! - [`EncodeError`]: cycles, non-finite numbers, unsupported host kinds, filter failures
//! - [`DecodeError`]: malformed text (always with the byte offset of the first
//!   violation) and reviver failures
//!
//! [`Error`] wraps both and is what the derived operations (clone, dedup) return,
//! since they run the encoder and the decoder back to back.
//!
//! ## Examples
//!
//! ```rust
//! use serde_canon::{decode, DecodeError};
//!
//! let err = decode("{\"a\":1,}").unwrap_err();
//! match err {
//!     DecodeError::Syntax { position, .. } => assert_eq!(position, 7),
//!     other => panic!("unexpected error: {other}"),
//! }
//! ```

use std::fmt;
use thiserror::Error;

/// Error type returned by filter and reviver hooks.
///
/// Hooks may fail with any error; the codec carries it unchanged as the
/// `source()` of [`EncodeError::Filter`] or [`DecodeError::Reviver`].
pub type HookError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while turning a host value into text.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A container was reached again while it was still being walked.
    #[error("cyclic reference detected at key {key:?}")]
    CyclicReference { key: String },

    /// `NaN` and the infinities have no JSON representation.
    #[error("number {0} is not representable in JSON text")]
    UnrepresentableNumber(f64),

    /// Containers were nested deeper than `EncodeOptions::max_depth`.
    #[error("nesting too deep at key {key:?}")]
    DepthLimitExceeded { key: String },

    /// A host kind the grammar has no form for, e.g. a big integer.
    #[error("do not know how to encode a {0}")]
    UnsupportedType(&'static str),

    /// The root was omitted by a hook or is itself unrepresentable.
    #[error("root value is not representable in JSON text")]
    UnrepresentableRoot,

    /// The filter hook returned an error.
    #[error("filter failed at key {key:?}")]
    Filter {
        key: String,
        #[source]
        source: HookError,
    },

    /// Writing the encoded text failed.
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error raised through `serde::ser::Error`.
    #[error("{0}")]
    Custom(String),
}

impl EncodeError {
    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}

impl serde::ser::Error for EncodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        EncodeError::Custom(msg.to_string())
    }
}

/// Errors raised while turning text into a [`Value`](crate::Value).
#[derive(Debug, Error)]
pub enum DecodeError {
    /// Malformed text. `position` is the byte offset of the first violation;
    /// `line` and `column` are 1-based and derived from it.
    #[error("syntax error at line {line}, column {column} (offset {position}): {msg}")]
    Syntax {
        position: usize,
        line: usize,
        column: usize,
        msg: String,
    },

    /// The reviver hook returned an error; it is kept as the source unchanged.
    #[error("reviver failed: {0}")]
    Reviver(#[source] HookError),

    /// Reading the input failed or it was not UTF-8.
    #[error("IO error: {0}")]
    Io(String),

    /// Custom error raised through `serde::de::Error`, e.g. a type mismatch.
    #[error("{0}")]
    Custom(String),
}

impl DecodeError {
    /// Creates a syntax error at byte offset `position` of `input`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use serde_canon::DecodeError;
    ///
    /// let err = DecodeError::syntax("[1,\n 2,]", 7, "trailing comma");
    /// assert!(err.to_string().contains("line 2, column 4"));
    /// ```
    pub fn syntax(input: &str, position: usize, msg: &str) -> Self {
        let position = position.min(input.len());
        let before = &input.as_bytes()[..position];
        let line = before.iter().filter(|&&b| b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|&b| b == b'\n')
            .map_or(0, |i| i + 1);
        let column = String::from_utf8_lossy(&before[line_start..]).chars().count() + 1;
        DecodeError::Syntax {
            position,
            line,
            column,
            msg: msg.to_string(),
        }
    }

    /// Returns the byte offset of a syntax error, `None` for other kinds.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            DecodeError::Syntax { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Returns `true` if the text itself was malformed.
    #[must_use]
    pub fn is_syntax(&self) -> bool {
        matches!(self, DecodeError::Syntax { .. })
    }

    /// Creates a custom error with a display message.
    pub fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom(msg.to_string())
    }
}

impl serde::de::Error for DecodeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        DecodeError::Custom(msg.to_string())
    }
}

/// Either direction failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_syntax_error_line_and_column() {
        let err = DecodeError::syntax("{\n  \"a\": x}", 9, "unexpected character");
        match err {
            DecodeError::Syntax {
                position,
                line,
                column,
                ..
            } => {
                assert_eq!(position, 9);
                assert_eq!(line, 2);
                assert_eq!(column, 8);
            }
            _ => panic!("Expected syntax error"),
        }
    }

    #[test]
    fn test_syntax_error_counts_chars_not_bytes() {
        let err = DecodeError::syntax("\"é\" x", 5, "trailing characters");
        assert!(err.to_string().contains("column 5"));
    }

    #[test]
    fn test_reviver_error_keeps_source() {
        let hook: HookError = "bad date".into();
        let err = DecodeError::Reviver(hook);
        assert_eq!(err.source().map(|s| s.to_string()), Some("bad date".into()));
        assert_eq!(err.position(), None);
    }

    #[test]
    fn test_umbrella_is_transparent() {
        let err: Error = EncodeError::UnrepresentableNumber(f64::NAN).into();
        assert_eq!(err.to_string(), "number NaN is not representable in JSON text");
    }
}
