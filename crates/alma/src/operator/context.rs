use serde_json::Value;

use super::Operator;
use crate::action::Action;
use crate::error::Result;
use crate::model::{Model, OpKey};
use crate::Path;

/// The model as seen from one operator.
///
/// Paths passed to the data accessors are relative to the operator's mount
/// point.
pub struct OpContext<'a> {
    model: &'a mut Model,
    key: OpKey,
}

impl<'a> OpContext<'a> {
    pub(crate) fn new(model: &'a mut Model, key: OpKey) -> Self {
        Self { model, key }
    }

    /// The operator this context belongs to.
    pub fn key(&self) -> OpKey {
        self.key
    }

    pub fn model(&self) -> &Model {
        &*self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut *self.model
    }

    pub fn is_mounted(&self) -> bool {
        self.model.is_mounted(self.key)
    }

    pub fn get_path(&self, relative: &[&str]) -> Path {
        self.model.get_path(self.key, relative)
    }

    pub fn get_model_data(&self, relative: &[&str]) -> Result<Option<&Value>> {
        self.model.get_model_data(self.key, relative)
    }

    pub fn get_model_data_or(&self, relative: &[&str], default: Value) -> Result<Value> {
        self.model.get_model_data_or(self.key, relative, default)
    }

    pub fn set_model_data(&mut self, relative: &[&str], value: Value) -> Result<()> {
        self.model.set_model_data(self.key, relative, value)
    }

    pub fn delete_model_data(&mut self, relative: &[&str]) -> Result<()> {
        self.model.delete_model_data(self.key, relative)
    }

    pub fn path_belongs_to_op(&self, path: &[String]) -> bool {
        self.model.path_belongs_to_op(self.key, path)
    }

    pub fn get_absolute_change(&self, data: Value) -> Value {
        self.model.get_absolute_change(self.key, data)
    }

    pub fn get_relative_slice<'d>(&self, data: &'d Value) -> Option<&'d Value> {
        self.model.get_relative_slice(self.key, data)
    }

    /// Propose `data`, given relative to this operator.
    pub fn propose(&mut self, action: impl Into<Action>, data: Value) -> Result<()> {
        self.model.propose(self.key, action, data, true)
    }

    /// Propose `data`, given relative to the model root.
    pub fn propose_absolute(&mut self, action: impl Into<Action>, data: Value) -> Result<()> {
        self.model.propose(self.key, action, data, false)
    }

    /// Create a new, unmounted operator in the same model.
    pub fn insert_op(&mut self, op: Box<dyn Operator>) -> OpKey {
        self.model.insert_boxed_op(op)
    }

    pub fn op_name_of(&self, key: OpKey) -> Result<String> {
        self.model.op_name(key)
    }

    pub fn nested_ops(&self) -> Vec<OpKey> {
        self.model.nested_ops(self.key)
    }

    pub fn add_nested_op(&mut self, child: OpKey, relative: Path) -> Result<()> {
        self.model.add_nested_op(self.key, child, relative)
    }

    pub fn remove_nested_op(&mut self, child: OpKey) -> Result<()> {
        self.model.remove_nested_op(self.key, child)
    }

    /// Run another operator's `reset`.
    pub fn reset_op(&mut self, key: OpKey) -> Result<()> {
        self.model.reset_op(key)
    }
}
