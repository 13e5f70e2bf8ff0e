/// Builds a [`Value`](crate::Value) from JSON-like literal syntax.
///
/// Object fields keep the order they are written in. Any other token is
/// converted with `Value::from`, so negative numbers and expressions need
/// parentheses: `value!([(-1), (x + 1)])`.
///
/// ```rust
/// use serde_canon::value;
///
/// let v = value!({"id": 1, "tags": ["a", "b"], "owner": null});
/// assert_eq!(v.to_string(), r#"{"id":1,"tags":["a","b"],"owner":null}"#);
/// ```
#[macro_export]
macro_rules! value {
    (null) => {
        $crate::Value::Null
    };

    (true) => {
        $crate::Value::Bool(true)
    };

    (false) => {
        $crate::Value::Bool(false)
    };

    ([]) => {
        $crate::Value::Array(::std::vec::Vec::new())
    };

    ([ $($elem:tt),* $(,)? ]) => {
        $crate::Value::Array(::std::vec![$($crate::value!($elem)),*])
    };

    ({}) => {
        $crate::Value::Object($crate::Map::new())
    };

    ({ $($key:literal : $value:tt),* $(,)? }) => {{
        let mut object = $crate::Map::new();
        $(
            object.insert(::std::string::String::from($key), $crate::value!($value));
        )*
        $crate::Value::Object(object)
    }};

    ($other:expr) => {
        $crate::Value::from($other)
    };
}
