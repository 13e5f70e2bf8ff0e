//! Filters, allowlists, custom encodes and revivers.
//!
//! Run with: cargo run --example hooks

use chrono::{DateTime, TimeZone, Utc};
use serde_canon::{
    decode_with, dedup, encode_with, DecodeOptions, EncodeOptions, Hooked, HostObject, HostValue,
    Value,
};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let born = Utc.with_ymd_and_hms(1815, 12, 10, 0, 0, 0).single().ok_or("bad date")?;

    let person = HostObject::new().with_custom_encode(|_, this| {
        let name = this
            .as_object()
            .and_then(|obj| obj.get("first"))
            .and_then(|v| v.as_str().map(String::from))
            .unwrap_or_default();
        HostValue::object([("fullName", HostValue::from(format!("{} Lovelace", name)))])
    });
    person.set("first", "Ada");

    let record = HostValue::object([
        ("id", HostValue::from(1)),
        ("author", HostValue::from(person)),
        ("birthDate", HostValue::from(born)),
        ("password", HostValue::from("hunter2")),
        ("callback", HostValue::Function("onSave".to_string())),
    ]);

    let redact = EncodeOptions::pretty().with_filter(|key, value| {
        Ok(if key == "password" {
            Hooked::Omit
        } else {
            Hooked::Keep(value.clone())
        })
    });
    let text = encode_with(&record, &redact)?;
    println!("Filtered:\n{}\n", text);

    let only = EncodeOptions::new().with_allowlist(["birthDate", "id"]);
    println!("Allowlisted: {}\n", encode_with(&record, &only)?);

    let revive = DecodeOptions::new().with_reviver(|key, value| {
        if key != "birthDate" {
            return Ok(Hooked::Keep(value));
        }
        let date = DateTime::parse_from_rfc3339(value.as_str().unwrap_or_default())?;
        Ok(Hooked::Keep(Value::from(date.timestamp_millis())))
    });
    let decoded = decode_with(&text, &revive)?;
    println!("Revived birthDate (ms since epoch): {}", decoded.get("birthDate").unwrap_or(&Value::Null));

    let user = |id: i32, name: &str| {
        HostValue::object([("id", HostValue::from(id)), ("name", HostValue::from(name))])
    };
    let unique = dedup(&[user(1, "A"), user(2, "B"), user(1, "A")])?;
    println!("Deduplicated: {}", encode_with(&HostValue::array(unique), &EncodeOptions::new())?);

    Ok(())
}
