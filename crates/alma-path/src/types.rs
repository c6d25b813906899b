//! Type definitions for paths.

/// A step in a path.
///
/// Can be either an object key or the decimal form of an integer (array
/// index or numeric id).
pub type PathStep = String;

/// A path from the root of a document to a location inside it.
pub type Path = Vec<PathStep>;

/// Build a path from anything displayable.
///
/// # Example
///
/// ```
/// use alma_path::to_path;
///
/// let path = to_path(["items".to_string(), 7.to_string()]);
/// assert_eq!(path, vec!["items", "7"]);
///
/// let empty: Vec<String> = to_path(Vec::<&str>::new());
/// assert!(empty.is_empty());
/// ```
pub fn to_path<I, S>(steps: I) -> Path
where
    I: IntoIterator<Item = S>,
    S: ToString,
{
    steps.into_iter().map(|step| step.to_string()).collect()
}
