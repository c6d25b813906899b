use indexmap::IndexMap;
use serde_json::Value;

use crate::error::{PreconditionViolation, Result};
use crate::model::{Model, OpKey};

/// A read-only query over an operator's state.
pub type SelectorFn = fn(&Model, OpKey) -> Result<Value>;

/// A named entry point that makes an operator propose something.
pub type IntentionFn = fn(&mut Model, OpKey, Value) -> Result<()>;

/// A name-keyed table of functions bound to one operator.
#[derive(Debug)]
pub struct Bound<F> {
    key: OpKey,
    table: IndexMap<String, F>,
}

pub type Selectors = Bound<SelectorFn>;
pub type Intentions = Bound<IntentionFn>;

impl<F> Bound<F> {
    pub(crate) fn new(key: OpKey, table: IndexMap<String, F>) -> Self {
        Self { key, table }
    }

    /// The operator these functions are bound to.
    pub fn key(&self) -> OpKey {
        self.key
    }

    pub fn get(&self, name: &str) -> Option<&F> {
        self.table.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.table.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Selectors {
    pub fn select(&self, model: &Model, name: &str) -> Result<Value> {
        let f = self
            .get(name)
            .ok_or_else(|| PreconditionViolation::UnknownBinding(name.to_string()))?;
        f(model, self.key)
    }
}

impl Intentions {
    pub fn invoke(&self, model: &mut Model, name: &str, args: Value) -> Result<()> {
        let f = self
            .get(name)
            .ok_or_else(|| PreconditionViolation::UnknownBinding(name.to_string()))?;
        f(model, self.key, args)
    }
}
