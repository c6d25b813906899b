//! Configuration for list operators.

use serde::{Deserialize, Serialize};

use crate::sequence::MAX_SAFE_INTEGER;

/// Id allocation settings for a [`List`](crate::operators::List).
///
/// Deserializes from camelCase JSON with every field optional:
///
/// ```
/// use alma::config::ListConfig;
///
/// let config: ListConfig = serde_json::from_str(r#"{"wrap": false}"#).unwrap();
/// assert_eq!(config.start, 1);
/// assert!(!config.wrap);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ListConfig {
    /// First id handed out, and the value the sequence restarts from.
    pub start: u64,
    /// Upper bound of the sequence. This value itself is never handed out.
    pub max: u64,
    /// Restart at `start` when `max` is reached instead of failing.
    pub wrap: bool,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            start: 1,
            max: MAX_SAFE_INTEGER,
            wrap: true,
        }
    }
}
