use serde_json::{json, Value};

use crate::action::Action;
use crate::error::{PreconditionViolation, Result};
use crate::model::{Model, OpKey};
use crate::operator::{IntentionFn, OpContext, Operator, SelectorFn};

/// An integer stored at `<path>/value`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Counter;

impl Counter {
    pub fn new() -> Self {
        Counter
    }

    pub fn value(&self, cx: &OpContext<'_>) -> Result<i64> {
        Ok(cx.get_model_data_or(&["value"], json!(0))?.as_i64().unwrap_or(0))
    }

    pub fn set_value(&mut self, cx: &mut OpContext<'_>, value: i64) -> Result<()> {
        cx.propose("setValue", json!({ "value": value }))
    }

    pub fn increment(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        let value = self.value(cx)?;
        self.set_value(cx, value + 1)
    }

    pub fn decrement(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        let value = self.value(cx)?;
        self.set_value(cx, value - 1)
    }

    /// Selectors for [`Model::selectors`].
    pub fn selector_table() -> [(&'static str, SelectorFn); 1] {
        [("value", select_value)]
    }

    /// Intentions for [`Model::intentions`].
    pub fn intention_table() -> [(&'static str, IntentionFn); 3] {
        [
            ("setValue", intend_set_value),
            ("increment", intend_increment),
            ("decrement", intend_decrement),
        ]
    }
}

fn select_value(model: &Model, key: OpKey) -> Result<Value> {
    model.get_model_data_or(key, &["value"], json!(0))
}

fn intend_set_value(model: &mut Model, key: OpKey, args: Value) -> Result<()> {
    let value = args
        .as_i64()
        .or_else(|| args.get("value").and_then(Value::as_i64))
        .ok_or_else(|| PreconditionViolation::MalformedAction(format!("setValue {args}")))?;
    model.with_op(key, |c: &mut Counter, cx| c.set_value(cx, value))
}

fn intend_increment(model: &mut Model, key: OpKey, _: Value) -> Result<()> {
    model.with_op(key, |c: &mut Counter, cx| c.increment(cx))
}

fn intend_decrement(model: &mut Model, key: OpKey, _: Value) -> Result<()> {
    model.with_op(key, |c: &mut Counter, cx| c.decrement(cx))
}

impl Operator for Counter {
    fn op_name(&self) -> &str {
        "Counter"
    }

    fn reset(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        self.set_value(cx, 0)
    }

    fn consider(
        &mut self,
        cx: &mut OpContext<'_>,
        data: &Value,
        _source: Option<OpKey>,
        _action: &Action,
    ) -> Result<()> {
        let Some(value) = cx.get_relative_slice(data).and_then(|slice| slice.get("value")) else {
            return Ok(());
        };
        let value = value.clone();
        cx.set_model_data(&["value"], value)
    }
}
