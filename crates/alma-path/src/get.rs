use serde_json::Value;

use crate::util::is_valid_index;

/// Get a value from a JSON document by path.
///
/// Returns `None` if any intermediate is missing or scalar. The empty path
/// returns the document itself. An explicit `null` at the end of the path is
/// a present value and is returned as such.
///
/// # Example
///
/// ```
/// use alma_path::get;
/// use serde_json::json;
///
/// let doc = json!({"foo": {"bar": 42}});
/// assert_eq!(get(&doc, &["foo".to_string(), "bar".to_string()]), Some(&json!(42)));
/// assert_eq!(get(&doc, &["foo".to_string(), "bar".to_string(), "baz".to_string()]), None);
/// assert_eq!(get(&doc, &[]), Some(&doc));
/// ```
pub fn get<'a>(val: &'a Value, path: &[String]) -> Option<&'a Value> {
    let mut current = val;
    for path_step in path {
        match current {
            Value::Array(arr) => {
                if !is_valid_index(path_step) {
                    return None;
                }
                current = arr.get(path_step.parse::<usize>().ok()?)?;
            }
            Value::Object(map) => {
                current = map.get(path_step)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

/// Get a value by path, falling back to `default` when it is missing.
pub fn get_or(val: &Value, path: &[String], default: Value) -> Value {
    get(val, path).cloned().unwrap_or(default)
}

/// Get a mutable reference to a value in a JSON document by path.
///
/// Returns `None` if the path doesn't exist.
pub fn get_mut<'a>(val: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    let mut current = val;
    for path_step in path {
        match current {
            Value::Array(arr) => {
                if !is_valid_index(path_step) {
                    return None;
                }
                current = arr.get_mut(path_step.parse::<usize>().ok()?)?;
            }
            Value::Object(map) => {
                current = map.get_mut(path_step)?;
            }
            _ => return None,
        }
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::to_path;
    use serde_json::json;

    #[test]
    fn test_get_scalar_root() {
        assert_eq!(get(&json!(123), &[]), Some(&json!(123)));
        assert_eq!(get(&json!("foo"), &[]), Some(&json!("foo")));
    }

    #[test]
    fn test_get_through_scalar() {
        let doc = json!({"a": 1});
        assert_eq!(get(&doc, &to_path(["a", "b"])), None);
    }

    #[test]
    fn test_get_array_element() {
        let doc = json!({"order": [4, 5, 6]});
        assert_eq!(get(&doc, &to_path(["order", "1"])), Some(&json!(5)));
        assert_eq!(get(&doc, &to_path(["order", "3"])), None);
        assert_eq!(get(&doc, &to_path(["order", "x"])), None);
    }

    #[test]
    fn test_get_explicit_null() {
        let doc = json!({"foo": null});
        assert_eq!(get(&doc, &to_path(["foo"])), Some(&Value::Null));
        assert_eq!(get_or(&doc, &to_path(["foo"]), json!(0)), Value::Null);
    }

    #[test]
    fn test_get_or_default() {
        let doc = json!({"counter": {}});
        assert_eq!(get_or(&doc, &to_path(["counter", "value"]), json!(0)), json!(0));
        assert_eq!(get_or(&doc, &to_path(["missing", "value"]), json!(7)), json!(7));
    }

    #[test]
    fn test_get_mut_updates_in_place() {
        let mut doc = json!({"a": {"b": 1}});
        if let Some(v) = get_mut(&mut doc, &to_path(["a", "b"])) {
            *v = json!(2);
        }
        assert_eq!(doc, json!({"a": {"b": 2}}));
        assert!(get_mut(&mut doc, &to_path(["a", "c"])).is_none());
    }
}
