//! Basic encoding and decoding of typed values.
//!
//! Run with: cargo run --example simple

use serde::{Deserialize, Serialize};
use serde_canon::{from_str, safe_decode, to_string, to_string_pretty, Value};
use std::error::Error;

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct User {
    id: u32,
    name: String,
    email: Option<String>,
}

fn main() -> Result<(), Box<dyn Error>> {
    let users = vec![
        User {
            id: 42,
            name: "Alice Johnson".to_string(),
            email: Some("alice@example.com".to_string()),
        },
        User {
            id: 43,
            name: "Bob Smith".to_string(),
            email: None,
        },
    ];

    let text = to_string(&users)?;
    println!("Compact:\n{}\n", text);
    println!("Pretty:\n{}\n", to_string_pretty(&users)?);

    let users_back: Vec<User> = from_str(&text)?;
    assert_eq!(users, users_back);
    println!("✓ Round-trip successful");

    let config = safe_decode("{ trailing: 'comma', }", Value::Null);
    println!("Malformed input fell back to: {}", config);

    Ok(())
}
