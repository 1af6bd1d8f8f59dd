//! Shape guards for the values threaded through a pipeline.
//!
//! Stages exchange [`serde_json::Value`]s. Validators use these helpers to
//! check the shape of an output without panicking on missing fields.

use serde_json::Value;

/// Returns whether a value counts as present.
///
/// `null`, `false`, numeric zero and the empty string are falsy. Everything
/// else is truthy, including `{}` and `[]`: an empty mapping is still a
/// defined value.
#[must_use]
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Looks up a dotted path such as `"design.tokens"` or `"files.0"`.
///
/// Numeric segments index into arrays.
#[must_use]
pub fn field<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').filter(|s| !s.is_empty()).try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Returns true if the field at `path` exists and is truthy.
#[must_use]
pub fn field_truthy(value: &Value, path: &str) -> bool {
    field(value, path).is_some_and(truthy)
}

/// Returns the length of the array at `path`, if it is an array.
#[must_use]
pub fn array_len(value: &Value, path: &str) -> Option<usize> {
    field(value, path).and_then(Value::as_array).map(Vec::len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_falsy_values() {
        assert!(!truthy(&json!(null)));
        assert!(!truthy(&json!(false)));
        assert!(!truthy(&json!(0)));
        assert!(!truthy(&json!(0.0)));
        assert!(!truthy(&json!("")));
    }

    #[test]
    fn test_empty_containers_are_truthy() {
        assert!(truthy(&json!({})));
        assert!(truthy(&json!([])));
        assert!(truthy(&json!(-1)));
        assert!(truthy(&json!("x")));
    }

    #[test]
    fn test_field_paths() {
        let value = json!({"design": {"tokens": {}, "components": ["button"]}});

        assert_eq!(field(&value, "design.tokens"), Some(&json!({})));
        assert_eq!(field(&value, "design.components.0"), Some(&json!("button")));
        assert_eq!(field(&value, "design.missing"), None);
        assert_eq!(field(&value, "design.components.x"), None);
        assert!(field_truthy(&value, "design.tokens"));
        assert!(!field_truthy(&value, "design.palette"));
    }

    #[test]
    fn test_array_len() {
        let value = json!({"files": [], "tests": ["a", "b"], "name": "x"});
        assert_eq!(array_len(&value, "files"), Some(0));
        assert_eq!(array_len(&value, "tests"), Some(2));
        assert_eq!(array_len(&value, "name"), None);
        assert_eq!(array_len(&value, "absent"), None);
    }
}
