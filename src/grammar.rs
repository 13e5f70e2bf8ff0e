//! Lexical rules shared by the encoder and the decoder.
//!
//! The text format is standard JSON (RFC 8259). This module holds the pieces
//! both directions must agree on: which bytes count as whitespace, how strings
//! are escaped, and how a number is spelled.
//!
//! # Strings
//!
//! The encoder uses the short escapes `\"`, `\\`, `\b`, `\f`, `\n`, `\r`, `\t`,
//! writes every other control character as `\u00XX` and emits everything else
//! raw. The decoder additionally accepts `\/` and any `\uXXXX`, combining
//! surrogate pairs.
//!
//! # Numbers
//!
//! Numbers are written the way ECMAScript's `Number.prototype.toString` does:
//! the shortest digit string that reads back to the same `f64`, in plain
//! decimal notation while the decimal exponent is in `[-7, 21)` and in
//! `d.ddde±n` form outside it.
//!
//! ```rust
//! use serde_canon::grammar::write_number;
//!
//! let mut out = String::new();
//! for n in [1.0, -2.5, 0.1, 1e21, 1.5e-7, 123456789012345680000.0] {
//!     write_number(&mut out, n);
//!     out.push(' ');
//! }
//! assert_eq!(out, "1 -2.5 0.1 1e+21 1.5e-7 123456789012345680000 ");
//! ```

/// Default nesting limit for the decoder.
pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Whitespace allowed between tokens: space, tab, line feed, carriage return.
#[inline]
pub const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// Appends `s` as a double-quoted, escaped string literal.
pub fn write_string(out: &mut String, s: &str) {
    out.push('"');
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        let escape = match ch {
            '"' => "\\\"",
            '\\' => "\\\\",
            '\n' => "\\n",
            '\r' => "\\r",
            '\t' => "\\t",
            '\u{0008}' => "\\b",
            '\u{000C}' => "\\f",
            c if (c as u32) < 0x20 => "",
            _ => continue,
        };
        out.push_str(&s[start..i]);
        if escape.is_empty() {
            out.push_str(&format!("\\u{:04x}", ch as u32));
        } else {
            out.push_str(escape);
        }
        start = i + ch.len_utf8();
    }
    out.push_str(&s[start..]);
    out.push('"');
}

/// Appends the shortest round-trippable spelling of a finite number.
///
/// Callers must reject non-finite values first; they are written as `null`
/// here so the output stays valid.
pub fn write_number(out: &mut String, value: f64) {
    if !value.is_finite() {
        out.push_str("null");
        return;
    }
    if value == 0.0 {
        out.push('0');
        return;
    }

    // `{:e}` yields the shortest round-trip digits, e.g. "1.5e-7" or "1e21".
    let sci = format!("{:e}", value.abs());
    let Some((mantissa, exponent)) = sci.split_once('e') else {
        out.push_str(&sci);
        return;
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let k = digits.len() as i32;
    let n = exponent.parse::<i32>().unwrap_or(0) + 1;

    if value < 0.0 {
        out.push('-');
    }

    if k <= n && n <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat('0').take((n - k) as usize));
    } else if 0 < n && n <= 21 {
        let (int_part, frac_part) = digits.split_at(n as usize);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    } else if -6 < n && n <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat('0').take((-n) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        out.push('e');
        out.push(if n - 1 < 0 { '-' } else { '+' });
        out.push_str(&(n - 1).abs().to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(n: f64) -> String {
        let mut out = String::new();
        write_number(&mut out, n);
        out
    }

    fn string(s: &str) -> String {
        let mut out = String::new();
        write_string(&mut out, s);
        out
    }

    #[test]
    fn test_integers_have_no_fraction() {
        assert_eq!(number(0.0), "0");
        assert_eq!(number(-0.0), "0");
        assert_eq!(number(42.0), "42");
        assert_eq!(number(-7.0), "-7");
        assert_eq!(number(1e20), "100000000000000000000");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(number(3.14), "3.14");
        assert_eq!(number(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(number(0.000001), "0.000001");
        assert_eq!(number(-0.5), "-0.5");
    }

    #[test]
    fn test_exponent_form() {
        assert_eq!(number(1e21), "1e+21");
        assert_eq!(number(1e-7), "1e-7");
        assert_eq!(number(-1.5e-7), "-1.5e-7");
        assert_eq!(number(2.5e300), "2.5e+300");
        assert_eq!(number(f64::MAX), "1.7976931348623157e+308");
        assert_eq!(number(5e-324), "5e-324");
    }

    #[test]
    fn test_numbers_read_back_exactly() {
        for n in [0.1, 1.0 / 3.0, 123.456e-10, 9007199254740993.0, 1e-300] {
            assert_eq!(number(n).parse::<f64>().unwrap(), n);
        }
    }

    #[test]
    fn test_string_escapes() {
        assert_eq!(string("plain"), "\"plain\"");
        assert_eq!(string("a\"b\\c"), r#""a\"b\\c""#);
        assert_eq!(string("\n\r\t\u{8}\u{c}"), r#""\n\r\t\b\f""#);
        assert_eq!(string("\u{1}\u{1f}"), r#""\u0001\u001f""#);
        assert_eq!(string("héllo 😀 /"), "\"héllo 😀 /\"");
    }

    #[test]
    fn test_whitespace_set() {
        assert!(is_whitespace(b' '));
        assert!(is_whitespace(b'\r'));
        assert!(!is_whitespace(0x0b));
        assert!(!is_whitespace(0x0c));
    }
}
