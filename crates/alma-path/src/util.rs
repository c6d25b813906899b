/// Escapes a pointer path component: `~` becomes `~0`, `/` becomes `~1`.
fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    component.replace('~', "~0").replace('/', "~1")
}

/// Format path components into a pointer string.
///
/// Used to render paths in log output. Returns an empty string for the root.
///
/// # Example
///
/// ```
/// use alma_path::format_path;
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&["list".to_string(), "items".to_string()]), "/list/items");
/// ```
pub fn format_path(path: &[String]) -> String {
    let mut out = String::new();
    for component in path {
        out.push('/');
        out.push_str(&escape_component(component));
    }
    out
}

/// Check if `prefix` is an element-wise prefix of `path` (or equal to it).
///
/// # Example
///
/// ```
/// use alma_path::{is_prefix, to_path};
///
/// let own = to_path(["foo", "bar"]);
/// assert!(is_prefix(&own, &to_path(["foo", "bar"])));
/// assert!(is_prefix(&own, &to_path(["foo", "bar", "value"])));
/// assert!(!is_prefix(&own, &to_path(["foo"])));
/// assert!(!is_prefix(&own, &to_path(["foo", "baz"])));
/// ```
pub fn is_prefix(prefix: &[String], path: &[String]) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path).all(|(a, b)| a == b)
}

/// Check if a string represents a valid non-negative integer array index.
pub fn is_valid_index(index: &str) -> bool {
    if index.is_empty() {
        return false;
    }
    let bytes = index.as_bytes();
    // First char can't be leading zero unless it's just "0"
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|&b| b.is_ascii_digit())
}
