//! An ordered collection of nested operators keyed by integer ids.
//!
//! Persisted layout, relative to the list's path:
//!
//! ```text
//! { "order": [3, 1, 2], "items": { "1": ..., "2": ..., "3": ... }, "opNames": { "1": "Counter", ... } }
//! ```
//!
//! The operator instance behind each id is tracked in memory only. When a
//! list is mounted over persisted data, it rebuilds its children from
//! `opNames` using the [`Creators`] it was given.

use std::collections::{BTreeMap, HashMap, HashSet};

use indexmap::IndexMap;
use serde_json::{json, Map, Value};

use crate::action::Action;
use crate::config::ListConfig;
use crate::error::{PreconditionViolation, Result};
use crate::model::OpKey;
use crate::operator::{OpContext, Operator};
use crate::sequence::IdSequence;
use crate::to_path;

/// Builds a fresh operator for a persisted `opNames` entry.
pub type Creator = fn() -> Box<dyn Operator>;

/// Creators keyed by operator name.
pub type Creators = IndexMap<String, Creator>;

const ADD_ITEMS: &str = "addItems";
const DELETE_ITEMS: &str = "deleteItems";
const MOVE_ITEMS: &str = "moveItems";
const CLEAR: &str = "clear";
const RESET: &str = "reset";

/// Options for [`List::add_items`].
#[derive(Debug, Clone, Default)]
pub struct AddItems {
    /// Reset each operator once it is mounted.
    pub reset_ops: bool,
    /// Extra entries merged into the action context.
    pub context: Map<String, Value>,
}

impl AddItems {
    pub fn reset_ops() -> Self {
        Self {
            reset_ops: true,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct IdentityIndex {
    by_op: HashMap<OpKey, u64>,
    by_id: BTreeMap<u64, OpKey>,
}

impl IdentityIndex {
    fn insert(&mut self, op: OpKey, id: u64) {
        self.by_op.insert(op, id);
        self.by_id.insert(id, op);
    }

    fn remove_id(&mut self, id: u64) -> Option<OpKey> {
        let op = self.by_id.remove(&id)?;
        self.by_op.remove(&op);
        Some(op)
    }

    fn clear(&mut self) -> Vec<OpKey> {
        self.by_op.clear();
        std::mem::take(&mut self.by_id).into_values().collect()
    }
}

#[derive(Debug, Default)]
pub struct List {
    config: ListConfig,
    sequence: IdSequence,
    index: IdentityIndex,
    creators: Creators,
    /// Children this list built itself while rebuilding from persisted data.
    owned: HashSet<OpKey>,
}

impl List {
    /// Insert at the front.
    pub const START: i64 = 0;
    /// Insert at the back.
    pub const END: i64 = i64::MAX;

    pub fn new() -> Self {
        Self::with_config(ListConfig::default())
    }

    pub fn with_config(config: ListConfig) -> Self {
        Self {
            sequence: IdSequence::new(&config),
            config,
            index: IdentityIndex::default(),
            creators: Creators::new(),
            owned: HashSet::new(),
        }
    }

    /// Register the creators used to rebuild children from persisted data.
    pub fn with_creators<I, S>(mut self, creators: I) -> Self
    where
        I: IntoIterator<Item = (S, Creator)>,
        S: Into<String>,
    {
        self.creators
            .extend(creators.into_iter().map(|(name, f)| (name.into(), f)));
        self
    }

    pub fn config(&self) -> &ListConfig {
        &self.config
    }

    pub fn get_id_for(&self, op: OpKey) -> Option<u64> {
        self.index.by_op.get(&op).copied()
    }

    pub fn get_item_by_id(&self, id: u64) -> Option<OpKey> {
        self.index.by_id.get(&id).copied()
    }

    /// Committed item ids, in order.
    pub fn order(&self, cx: &OpContext<'_>) -> Result<Vec<u64>> {
        Ok(cx
            .get_model_data(&["order"])?
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(Value::as_u64).collect())
            .unwrap_or_default())
    }

    /// Committed `id -> operator name` table.
    pub fn op_names(&self, cx: &OpContext<'_>) -> Result<Map<String, Value>> {
        Ok(cx
            .get_model_data(&["opNames"])?
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default())
    }

    /// Add unmounted operators at `index` (clamped to the current length).
    ///
    /// The operators are mounted at `items/<id>` once the proposal has been
    /// rendered. Returns the ids given to `ops`, in the same order.
    pub fn add_items(
        &mut self,
        cx: &mut OpContext<'_>,
        index: i64,
        ops: &[OpKey],
        options: AddItems,
    ) -> Result<Vec<u64>> {
        if ops.is_empty() {
            return Ok(Vec::new());
        }
        self.check_addable(cx, ops)?;

        // Nothing is recorded unless the proposal was accepted.
        let checkpoint = self.sequence.clone();
        match self.propose_additions(cx, index, ops, options) {
            Ok(ids) => {
                for (op, id) in ops.iter().zip(&ids) {
                    self.index.insert(*op, *id);
                }
                Ok(ids)
            }
            Err(err) => {
                self.sequence = checkpoint;
                Err(err)
            }
        }
    }

    fn propose_additions(
        &mut self,
        cx: &mut OpContext<'_>,
        index: i64,
        ops: &[OpKey],
        options: AddItems,
    ) -> Result<Vec<u64>> {
        let mut order = self.order(cx)?;
        let mut op_names = self.op_names(cx)?;
        let mut ids = Vec::with_capacity(ops.len());
        for op in ops {
            let id = self.sequence.next_id()?;
            if self.index.by_id.contains_key(&id) || order.contains(&id) {
                return Err(PreconditionViolation::IdCollision(id).into());
            }
            op_names.insert(id.to_string(), Value::String(cx.op_name_of(*op)?));
            ids.push(id);
        }

        let at = clamp(index, order.len());
        order.splice(at..at, ids.iter().copied());

        let mut context = options.context;
        context.insert("ids".to_string(), json!(ids));
        context.insert("resetOps".to_string(), Value::Bool(options.reset_ops));
        tracing::debug!(list = %cx.key(), ?ids, at, "adding items");
        cx.propose(
            Action::with_context(ADD_ITEMS, context),
            json!({ "order": order, "opNames": op_names }),
        )?;
        Ok(ids)
    }

    /// Remove operators from the list. They are unmounted when the proposal
    /// is committed.
    pub fn delete_items(&mut self, cx: &mut OpContext<'_>, ops: &[OpKey]) -> Result<()> {
        let ids = self.resolve(ops);
        let order: Vec<u64> = self
            .order(cx)?
            .into_iter()
            .filter(|id| !ids.contains(id))
            .collect();
        let mut op_names = self.op_names(cx)?;
        for id in &ids {
            op_names.shift_remove(&id.to_string());
        }
        let removed: Vec<OpKey> = ids.iter().filter_map(|id| self.get_item_by_id(*id)).collect();

        let mut context = Map::new();
        context.insert("ids".to_string(), json!(ids));
        context.insert("ops".to_string(), to_json(&removed)?);
        cx.propose(
            Action::with_context(DELETE_ITEMS, context),
            json!({ "order": order, "opNames": op_names }),
        )
    }

    /// Move operators, in the given order, to `index` (clamped to the length
    /// of the order without them).
    pub fn move_items(&mut self, cx: &mut OpContext<'_>, ops: &[OpKey], index: i64) -> Result<()> {
        let ids = self.resolve(ops);
        let mut order: Vec<u64> = self
            .order(cx)?
            .into_iter()
            .filter(|id| !ids.contains(id))
            .collect();
        let at = clamp(index, order.len());
        order.splice(at..at, ids.iter().copied());

        let mut context = Map::new();
        context.insert("ids".to_string(), json!(ids));
        cx.propose(
            Action::with_context(MOVE_ITEMS, context),
            json!({ "order": order }),
        )
    }

    /// Empty the list. Every tracked operator is unmounted and ids restart
    /// from the configured start.
    pub fn clear(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        cx.propose(CLEAR, json!({ "order": [], "items": {}, "opNames": {} }))
    }

    fn check_addable(&self, cx: &OpContext<'_>, ops: &[OpKey]) -> Result<()> {
        let mut seen = HashSet::new();
        for op in ops {
            cx.op_name_of(*op)?;
            if *op == cx.key() {
                return Err(PreconditionViolation::NestingCycle(*op).into());
            }
            if !seen.insert(*op)
                || self.index.by_op.contains_key(op)
                || cx.model().parent_of(*op).is_some()
            {
                return Err(PreconditionViolation::AlreadyNested(*op).into());
            }
            if cx.model().is_mounted(*op) {
                return Err(PreconditionViolation::AlreadyMounted(*op).into());
            }
        }
        Ok(())
    }

    fn resolve(&self, ops: &[OpKey]) -> Vec<u64> {
        ops.iter().filter_map(|op| self.get_id_for(*op)).collect()
    }

    fn unmount_ids(&mut self, cx: &mut OpContext<'_>, ids: &[u64]) -> Result<()> {
        for id in ids {
            if let Some(op) = self.index.remove_id(*id) {
                self.release(cx, op)?;
            }
            let id = id.to_string();
            cx.delete_model_data(&["items", id.as_str()])?;
        }
        Ok(())
    }

    /// Unmount and detach a child, dropping it from the model if this list
    /// created it.
    fn release(&mut self, cx: &mut OpContext<'_>, op: OpKey) -> Result<()> {
        cx.remove_nested_op(op)?;
        if self.owned.remove(&op) {
            cx.model_mut().remove_op(op)?;
        }
        Ok(())
    }

    fn rebuild(&mut self, cx: &mut OpContext<'_>, order: &[u64]) -> Result<()> {
        let op_names = self.op_names(cx)?;
        for id in order {
            if self.index.by_id.contains_key(id) {
                continue;
            }
            let Some(name) = op_names.get(&id.to_string()).and_then(Value::as_str) else {
                tracing::warn!(list = %cx.key(), id, "persisted item has no operator name, skipping");
                continue;
            };
            let creator = self
                .creators
                .get(name)
                .ok_or_else(|| PreconditionViolation::MissingCreator(name.to_string()))?;
            let op = cx.insert_op(creator());
            self.owned.insert(op);
            self.index.insert(op, *id);
            cx.add_nested_op(op, to_path(["items".to_string(), id.to_string()]))?;
        }
        Ok(())
    }
}

impl Operator for List {
    fn op_name(&self) -> &str {
        "List"
    }

    fn on_mount(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        let order = self.order(cx)?;
        if let Some(max) = order.iter().copied().max() {
            if self.sequence.peek() <= max {
                self.sequence.seed_above(max);
            }
        }
        if !self.creators.is_empty() {
            self.rebuild(cx, &order)?;
        }
        Ok(())
    }

    /// Re-commit the current state, then reset every child.
    fn reset(&mut self, cx: &mut OpContext<'_>) -> Result<()> {
        let snapshot = json!({
            "order": self.order(cx)?,
            "items": cx.get_model_data_or(&["items"], json!({}))?,
            "opNames": self.op_names(cx)?,
        });
        cx.propose(RESET, snapshot)?;
        for child in cx.nested_ops() {
            cx.reset_op(child)?;
        }
        Ok(())
    }

    fn consider(
        &mut self,
        cx: &mut OpContext<'_>,
        data: &Value,
        source: Option<OpKey>,
        action: &Action,
    ) -> Result<()> {
        if source != Some(cx.key()) {
            return Ok(());
        }
        let Some(incoming) = cx.get_relative_slice(data).cloned() else {
            return Ok(());
        };

        match action.name.as_str() {
            DELETE_ITEMS => {
                let ids = context_ids(action)?;
                self.unmount_ids(cx, &ids)?;
            }
            CLEAR => {
                for op in self.index.clear() {
                    self.release(cx, op)?;
                }
                self.sequence.reset();
            }
            _ => {}
        }

        for key in ["order", "items", "opNames"] {
            if let Some(value) = incoming.get(key) {
                cx.set_model_data(&[key], value.clone())?;
            }
        }
        Ok(())
    }

    fn post_process(&mut self, cx: &mut OpContext<'_>, source: Option<OpKey>, action: &Action) -> Result<()> {
        if source != Some(cx.key()) || !action.is(ADD_ITEMS) {
            return Ok(());
        }
        let reset_ops = action
            .context_value("resetOps")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        for id in context_ids(action)? {
            let Some(op) = self.get_item_by_id(id) else {
                continue;
            };
            if !cx.model().is_mounted(op) {
                cx.add_nested_op(op, to_path(["items".to_string(), id.to_string()]))?;
            }
            if reset_ops {
                cx.reset_op(op)?;
            }
        }
        Ok(())
    }
}

/// Position for an insert into a sequence of `len` items.
fn clamp(index: i64, len: usize) -> usize {
    index.clamp(0, len as i64) as usize
}

fn context_ids(action: &Action) -> Result<Vec<u64>> {
    let ids = action
        .context_value("ids")
        .cloned()
        .unwrap_or_else(|| json!([]));
    serde_json::from_value(ids)
        .map_err(|err| PreconditionViolation::MalformedAction(format!("{}: {err}", action.name)).into())
}

fn to_json(ops: &[OpKey]) -> Result<Value> {
    serde_json::to_value(ops)
        .map_err(|err| PreconditionViolation::MalformedAction(err.to_string()).into())
}
