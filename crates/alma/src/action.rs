//! Actions: the metadata that travels with a proposal.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named action with optional context.
///
/// The context carries whatever the proposing operator needs to finish its
/// work once the proposal is committed, e.g. `{"ids": [3, 4], "resetOps": true}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Map<String, Value>>,
}

impl Action {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            context: None,
        }
    }

    pub fn with_context(name: impl Into<String>, context: Map<String, Value>) -> Self {
        Self {
            name: name.into(),
            context: Some(context),
        }
    }

    /// Whether this action carries the given name.
    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }

    /// Look up a single context entry.
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context.as_ref().and_then(|ctx| ctx.get(key))
    }
}

impl From<&str> for Action {
    fn from(name: &str) -> Self {
        Action::new(name)
    }
}

impl From<String> for Action {
    fn from(name: String) -> Self {
        Action::new(name)
    }
}
