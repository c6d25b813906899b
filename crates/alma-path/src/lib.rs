//! Path addressing for nested JSON data.
//!
//! A [`Path`] is an ordered list of keys leading from the root of a
//! [`serde_json::Value`] to some location inside it. Keys compare by string
//! equality, so integer steps (array indices, numeric ids) are carried in their
//! decimal form.
//!
//! The functions here are pure: they touch only the chain of containers the
//! path walks through and never panic on missing intermediates.
//!
//! # Example
//!
//! ```
//! use alma_path::{delete, get, set, to_path};
//! use serde_json::json;
//!
//! let mut doc = json!({});
//! set(&mut doc, &to_path(["list", "items", "3"]), json!({"value": 1}));
//! assert_eq!(doc, json!({"list": {"items": {"3": {"value": 1}}}}));
//!
//! assert_eq!(get(&doc, &to_path(["list", "items", "3", "value"])), Some(&json!(1)));
//!
//! delete(&mut doc, &to_path(["list", "items", "3"]));
//! assert_eq!(doc, json!({"list": {"items": {}}}));
//! ```

pub mod get;
pub mod mutate;
pub mod types;
pub mod util;

pub use get::{get, get_mut, get_or};
pub use mutate::{delete, set};
pub use types::{to_path, Path, PathStep};
pub use util::{format_path, is_prefix, is_valid_index};
