use chrono::{DateTime, TimeZone, Utc};
use serde_canon::{
    decode_with, encode_with, value, DecodeError, DecodeOptions, EncodeError, EncodeOptions,
    Hooked, HostObject, HostValue, Value,
};
use std::cell::Cell;
use std::error::Error as _;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

#[derive(Debug, thiserror::Error)]
#[error("not a date: {0}")]
struct BadDate(String);

fn person(first: &str, last: &str) -> HostObject {
    let person = HostObject::new().with_custom_encode(|_, this| {
        let full_name = this
            .as_object()
            .map(|obj| {
                let part = |k: &str| obj.get(k).and_then(|v| v.as_str().map(String::from));
                format!(
                    "{} {}",
                    part("first").unwrap_or_default(),
                    part("last").unwrap_or_default()
                )
            })
            .unwrap_or_default();
        HostValue::object([("fullName", HostValue::from(full_name))])
    });
    person.set("first", first);
    person.set("last", last);
    person
}

#[test]
fn test_filter_sees_root_first_with_empty_key() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let options = EncodeOptions::new().with_filter(move |key, value| {
        log.lock().unwrap().push(key.to_string());
        Ok(Hooked::Keep(value.clone()))
    });

    let host = HostValue::object([
        ("a", HostValue::array([HostValue::from(1), HostValue::from(2)])),
        ("b", HostValue::object([("c", HostValue::Null)])),
    ]);
    encode_with(&host, &options).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec!["", "a", "0", "1", "b", "c"]);
}

#[test]
fn test_filter_replaces_and_omits() {
    let options = EncodeOptions::new().with_filter(|key, value| {
        Ok(match key {
            "password" => Hooked::Omit,
            "secret" => Hooked::Keep(HostValue::from("***")),
            _ => match value.as_f64() {
                Some(n) if n < 0.0 => Hooked::Omit,
                _ => Hooked::Keep(value.clone()),
            },
        })
    });

    let host = HostValue::object([
        ("user", HostValue::from("u")),
        ("password", HostValue::from("p")),
        ("secret", HostValue::from(42)),
        (
            "deltas",
            HostValue::array([HostValue::from(1), HostValue::from(-1), HostValue::from(2)]),
        ),
    ]);
    assert_eq!(
        encode_with(&host, &options).unwrap(),
        r#"{"user":"u","secret":"***","deltas":[1,null,2]}"#
    );
}

#[test]
fn test_filter_omitting_root_is_an_error() {
    let options = EncodeOptions::new().with_filter(|_, _| Ok(Hooked::Omit));
    let err = encode_with(&HostValue::from(1), &options).unwrap_err();
    assert!(matches!(err, EncodeError::UnrepresentableRoot));
}

#[test]
fn test_filter_error_keeps_source() {
    let options = EncodeOptions::new().with_filter(|key, value| {
        if key == "born" {
            Err(BadDate("x".to_string()).into())
        } else {
            Ok(Hooked::Keep(value.clone()))
        }
    });
    let host = HostValue::object([("born", HostValue::from("x"))]);

    match encode_with(&host, &options).unwrap_err() {
        err @ EncodeError::Filter { .. } => {
            let source = err.source().expect("source");
            assert!(source.downcast_ref::<BadDate>().is_some());
        }
        other => panic!("expected filter error, got {:?}", other),
    }
}

#[test]
fn test_custom_encode_replaces_object() {
    let host = HostValue::object([("owner", HostValue::from(person("Ada", "Lovelace")))]);
    assert_eq!(
        encode_with(&host, &EncodeOptions::new()).unwrap(),
        r#"{"owner":{"fullName":"Ada Lovelace"}}"#
    );
}

#[test]
fn test_custom_encode_runs_once_per_node() {
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let node = HostObject::new().with_custom_encode(move |key, _| {
        counter.set(counter.get() + 1);
        // The replacement carries its own hook; it must not run.
        let replacement = HostObject::new().with_custom_encode(|_, _| HostValue::from("again"));
        replacement.set("key", key);
        HostValue::from(replacement)
    });

    let host = HostValue::object([("x", HostValue::from(node))]);
    assert_eq!(
        encode_with(&host, &EncodeOptions::new()).unwrap(),
        r#"{"x":{"key":"x"}}"#
    );
    assert_eq!(calls.get(), 1);
}

#[test]
fn test_custom_encode_runs_before_filter() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let options = EncodeOptions::new().with_filter(move |key, value| {
        if key == "when" {
            log.lock().unwrap().push(value.as_str().map(String::from));
        }
        Ok(Hooked::Keep(value.clone()))
    });

    let when = Utc.with_ymd_and_hms(2000, 1, 15, 0, 0, 0).unwrap();
    let host = HostValue::object([("when", HostValue::from(when))]);
    assert_eq!(
        encode_with(&host, &options).unwrap(),
        r#"{"when":"2000-01-15T00:00:00.000Z"}"#
    );
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some("2000-01-15T00:00:00.000Z".to_string())]
    );
}

#[test]
fn test_allowlist_applies_at_every_level() {
    let host = HostValue::object([
        ("id", HostValue::from(1)),
        ("secret", HostValue::from("s")),
        (
            "owner",
            HostValue::object([("email", HostValue::from("e")), ("id", HostValue::from(2))]),
        ),
        ("name", HostValue::from("A")),
    ]);
    let options = EncodeOptions::new().with_allowlist(["name", "id", "owner", "missing"]);
    assert_eq!(
        encode_with(&host, &options).unwrap(),
        r#"{"name":"A","id":1,"owner":{"id":2}}"#
    );
}

#[test]
fn test_allowlist_leaves_array_elements_alone() {
    let host = HostValue::object([
        (
            "items",
            HostValue::array([
                HostValue::object([("id", HostValue::from(1)), ("x", HostValue::from(2))]),
                HostValue::from(7),
            ]),
        ),
        ("drop", HostValue::from(1)),
    ]);
    let options = EncodeOptions::new().with_allowlist(["items", "id"]);
    assert_eq!(
        encode_with(&host, &options).unwrap(),
        r#"{"items":[{"id":1},7]}"#
    );
}

#[test]
fn test_filter_replacement_is_walked() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let options = EncodeOptions::new().with_filter(move |key, value| {
        log.lock().unwrap().push(key.to_string());
        Ok(match key {
            "owner" => Hooked::Keep(HostValue::object([
                ("name", HostValue::from("Ada")),
                ("token", HostValue::from("t")),
            ])),
            "token" => Hooked::Omit,
            _ => Hooked::Keep(value.clone()),
        })
    });

    let host = HostValue::object([("owner", HostValue::from("ada"))]);
    assert_eq!(
        encode_with(&host, &options).unwrap(),
        r#"{"owner":{"name":"Ada"}}"#
    );
    assert_eq!(*seen.lock().unwrap(), vec!["", "owner", "name", "token"]);
}

#[test]
fn test_reviver_restores_dates() {
    let options = DecodeOptions::new().with_reviver(|key, value| {
        if key != "birthDate" {
            return Ok(Hooked::Keep(value));
        }
        let text = value.as_str().unwrap_or_default();
        let date = DateTime::parse_from_rfc3339(text).map_err(|_| BadDate(text.to_string()))?;
        Ok(Hooked::Keep(Value::from(date.timestamp_millis())))
    });

    let v = decode_with(
        r#"{"name":"Ada","birthDate":"2000-01-15T00:00:00.000Z"}"#,
        &options,
    )
    .unwrap();
    let expected = Utc
        .with_ymd_and_hms(2000, 1, 15, 0, 0, 0)
        .unwrap()
        .timestamp_millis();
    assert_eq!(v.get("birthDate").and_then(Value::as_i64), Some(expected));
}

#[test]
fn test_reviver_error_keeps_source() {
    let options = DecodeOptions::new().with_reviver(|key, value| {
        if key == "birthDate" {
            Err(BadDate(value.to_string()).into())
        } else {
            Ok(Hooked::Keep(value))
        }
    });

    let err = decode_with(r#"{"birthDate":"yesterday"}"#, &options).unwrap_err();
    assert!(matches!(err, DecodeError::Reviver(_)));
    let source = err.source().expect("source");
    assert_eq!(source.to_string(), "not a date: \"yesterday\"");
}

#[test]
fn test_reviver_sees_original_array_indices() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&seen);
    let options = DecodeOptions::new().with_reviver(move |key, value| {
        if value.is_number() {
            log.lock().unwrap().push(key.to_string());
        }
        Ok(if value.as_i64() == Some(0) {
            Hooked::Omit
        } else {
            Hooked::Keep(value)
        })
    });

    let v = decode_with("[0,1,0,2]", &options).unwrap();
    assert_eq!(v, value!([1, 2]));
    assert_eq!(*seen.lock().unwrap(), vec!["0", "1", "2", "3"]);
}

#[test]
fn test_reviver_can_replace_root() {
    let options = DecodeOptions::new().with_reviver(|key, value| {
        Ok(if key.is_empty() {
            Hooked::Keep(value!({"wrapped": true}))
        } else {
            Hooked::Keep(value)
        })
    });
    assert_eq!(
        decode_with("[1]", &options).unwrap(),
        value!({"wrapped": true})
    );
}
