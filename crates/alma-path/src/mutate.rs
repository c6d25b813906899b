//! In-place mutation by path.

use serde_json::{Map, Value};

use crate::get::get_mut;
use crate::util::is_valid_index;

/// Set a value in a JSON document by path.
///
/// Intermediate containers are created as needed; scalars and `null`s found
/// along the way are replaced by empty objects. Arrays accept decimal index
/// steps, and an index past the end pads the array with `null`. The empty
/// path replaces the whole document.
///
/// Only the containers on the walked chain are touched.
///
/// # Example
///
/// ```
/// use alma_path::{set, to_path};
/// use serde_json::json;
///
/// let mut doc = json!({"keep": true});
/// set(&mut doc, &to_path(["a", "b"]), json!(1));
/// assert_eq!(doc, json!({"keep": true, "a": {"b": 1}}));
///
/// set(&mut doc, &[], json!("root"));
/// assert_eq!(doc, json!("root"));
/// ```
pub fn set(root: &mut Value, path: &[String], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        *root = value;
        return;
    };
    let mut container = root;
    for step in parents {
        let child = slot(container, step);
        if !child.is_object() && !child.is_array() {
            *child = Value::Object(Map::new());
        }
        container = child;
    }
    *slot(container, last) = value;
}

/// Delete the value at `path` if the whole chain exists.
///
/// Object keys are removed. Array elements are replaced by `null` so that
/// sibling indices keep their meaning. Deleting the root is a no-op.
///
/// # Example
///
/// ```
/// use alma_path::{delete, to_path};
/// use serde_json::json;
///
/// let mut doc = json!({"a": {"b": 1, "c": 2}});
/// delete(&mut doc, &to_path(["a", "b"]));
/// assert_eq!(doc, json!({"a": {"c": 2}}));
///
/// delete(&mut doc, &to_path(["x", "y"]));
/// assert_eq!(doc, json!({"a": {"c": 2}}));
/// ```
pub fn delete(root: &mut Value, path: &[String]) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let Some(container) = get_mut(root, parents) else {
        return;
    };
    match container {
        Value::Object(map) => {
            map.remove(last);
        }
        Value::Array(arr) => {
            if let Some(v) = last.parse::<usize>().ok().and_then(|idx| arr.get_mut(idx)) {
                *v = Value::Null;
            }
        }
        _ => {}
    }
}

/// Locate (creating if needed) the slot for `key` inside `container`.
///
/// A container that cannot hold `key` is replaced by an empty object first.
fn slot<'a>(container: &'a mut Value, key: &str) -> &'a mut Value {
    let index = match container {
        Value::Array(_) if is_valid_index(key) => key.parse::<usize>().ok(),
        _ => None,
    };
    if index.is_none() && !container.is_object() {
        *container = Value::Object(Map::new());
    }
    match (container, index) {
        (Value::Array(arr), Some(idx)) => {
            if idx >= arr.len() {
                arr.resize(idx + 1, Value::Null);
            }
            &mut arr[idx]
        }
        (Value::Object(map), _) => map.entry(key.to_string()).or_insert(Value::Null),
        (other, _) => other,
    }
}
