//! The model: data tree, operator arena and the consider cycle.
//!
//! # Overview
//!
//! A [`Model`] owns three things: the data tree (a [`serde_json::Value`]),
//! every operator instance (addressed by [`OpKey`]) and the [`OpTree`] of
//! root-level operators. Data changes only through proposals:
//!
//! 1. an operator calls [`OpContext::propose`](crate::operator::OpContext::propose);
//! 2. the model broadcasts `consider` to every mounted operator, pre-order,
//!    root tree first and nested children after their parent;
//! 3. the supervisor renders the committed data and broadcasts `post_process`.
//!
//! Proposals are queued. The queue is drained before the public call that
//! started the work returns, one full cycle per proposal. A proposal issued
//! from `consider` is rejected; one issued from `post_process` runs as its own
//! cycle after the current one.

mod arena;
mod op_tree;

use std::any::type_name;
use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use alma_path::format_path;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::action::Action;
use crate::error::{KernelError, PreconditionViolation, Result};
use crate::operator::{AsAny, Bound, IntentionFn, Intentions, OpContext, Operator, SelectorFn, Selectors};
use crate::supervisor::Supervision;
use crate::Path;

pub use arena::OpKey;
pub use op_tree::OpTree;

use arena::{Entry, OpArena};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Considering,
    Reacting,
}

struct Proposal {
    data: Value,
    source: Option<OpKey>,
    action: Action,
}

pub struct Model {
    data: Value,
    ops: OpArena,
    op_tree: OpTree,
    supervisor: Option<Box<dyn Supervision>>,
    pending: VecDeque<Proposal>,
    phase: Phase,
    /// Number of operator behaviors currently lent out.
    dispatching: usize,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    /// Create a model with an empty object as data.
    pub fn new() -> Self {
        Self::with_data(Value::Object(Map::new()))
    }

    pub fn with_data(data: Value) -> Self {
        Self {
            data,
            ops: OpArena::default(),
            op_tree: OpTree::default(),
            supervisor: None,
            pending: VecDeque::new(),
            phase: Phase::Idle,
            dispatching: 0,
        }
    }

    pub fn set_supervisor(&mut self, supervisor: impl Supervision + 'static) -> &mut Self {
        self.supervisor = Some(Box::new(supervisor));
        self
    }

    pub fn has_supervisor(&self) -> bool {
        self.supervisor.is_some()
    }

    // ── Data ──────────────────────────────────────────────────────────────

    pub fn data(&self) -> &Value {
        &self.data
    }

    pub fn get(&self, path: &[String]) -> Option<&Value> {
        alma_path::get(&self.data, path)
    }

    pub fn get_or(&self, path: &[String], default: Value) -> Value {
        alma_path::get_or(&self.data, path, default)
    }

    pub fn set(&mut self, path: &[String], value: Value) -> &mut Self {
        alma_path::set(&mut self.data, path, value);
        self
    }

    pub fn delete(&mut self, path: &[String]) -> &mut Self {
        alma_path::delete(&mut self.data, path);
        self
    }

    // ── Operator instances ────────────────────────────────────────────────

    /// Create an operator. It starts out unmounted.
    pub fn insert_op(&mut self, op: impl Operator) -> OpKey {
        self.insert_boxed_op(Box::new(op))
    }

    pub fn insert_boxed_op(&mut self, op: Box<dyn Operator>) -> OpKey {
        self.ops.insert(op)
    }

    /// Unmount an operator, detach it from its parent and drop it from the
    /// model, returning its behavior.
    pub fn remove_op(&mut self, key: OpKey) -> Result<Box<dyn Operator>> {
        if self.entry(key)?.behavior.is_none() {
            return Err(PreconditionViolation::OperatorBusy(key).into());
        }
        self.unmount(key)?;
        let parent = self.entry(key)?.parent;
        if let Some(parent) = parent {
            if let Some(parent_entry) = self.ops.get_mut(parent) {
                parent_entry.nested.shift_remove(&key);
            }
        }
        let entry = self
            .ops
            .remove(key)
            .ok_or(PreconditionViolation::UnknownOperator(key))?;
        for child in entry.nested.keys() {
            if let Some(child_entry) = self.ops.get_mut(*child) {
                child_entry.parent = None;
            }
        }
        entry
            .behavior
            .ok_or_else(|| PreconditionViolation::OperatorBusy(key).into())
    }

    pub fn contains_op(&self, key: OpKey) -> bool {
        self.ops.get(key).is_some()
    }

    /// Number of operator instances alive in this model.
    pub fn op_count(&self) -> usize {
        self.ops.len()
    }

    pub fn op_name(&self, key: OpKey) -> Result<String> {
        Ok(self.entry(key)?.op_name.clone())
    }

    /// Borrow a concrete operator.
    pub fn op<T: Operator>(&self, key: OpKey) -> Result<&T> {
        let behavior = self
            .entry(key)?
            .behavior
            .as_deref()
            .ok_or(PreconditionViolation::OperatorBusy(key))?;
        AsAny::as_any(behavior).downcast_ref::<T>().ok_or_else(|| {
            PreconditionViolation::WrongOperatorType {
                key,
                expected: type_name::<T>(),
            }
            .into()
        })
    }

    /// Run `f` against a concrete operator and its context, then drain any
    /// proposals it made.
    ///
    /// This is how intentions are invoked from outside the kernel:
    ///
    /// ```
    /// use alma::{Engine, OpTree, TestPresenter};
    /// use alma::operators::Counter;
    /// use serde_json::json;
    ///
    /// let mut engine = Engine::new(TestPresenter::new());
    /// let model = engine.model_mut();
    /// let counter = model.insert_op(Counter::new());
    /// model.mount_op_tree(OpTree::branch().with("counter", counter)).unwrap();
    ///
    /// model.with_op(counter, |c: &mut Counter, cx| c.increment(cx)).unwrap();
    /// assert_eq!(model.data(), &json!({"counter": {"value": 1}}));
    /// ```
    pub fn with_op<T, R, F>(&mut self, key: OpKey, f: F) -> Result<R>
    where
        T: Operator,
        F: FnOnce(&mut T, &mut OpContext<'_>) -> Result<R>,
    {
        let result = self.dispatch(key, |op, cx| {
            let op = AsAny::as_any_mut(op).downcast_mut::<T>().ok_or_else(|| {
                KernelError::from(PreconditionViolation::WrongOperatorType {
                    key,
                    expected: type_name::<T>(),
                })
            })?;
            f(op, cx)
        });
        self.flush()?;
        result
    }

    // ── Operator tree ─────────────────────────────────────────────────────

    pub fn op_tree(&self) -> &OpTree {
        &self.op_tree
    }

    pub fn op_tree_at(&self, path: &[String]) -> Option<&OpTree> {
        self.op_tree.get(path)
    }

    /// Mount every operator in `tree` at its path.
    pub fn mount_op_tree(&mut self, tree: OpTree) -> Result<&mut Self> {
        for (path, key) in tree.leaves() {
            self.mount(key, path, None)?;
        }
        self.flush()?;
        Ok(self)
    }

    /// Alias of [`Model::mount_op_tree`].
    pub fn set_op_tree(&mut self, tree: OpTree) -> Result<&mut Self> {
        self.mount_op_tree(tree)
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Mount an operator.
    ///
    /// Without a parent, `path` is absolute and the operator is written into
    /// the op tree. With a parent, `path` is relative to the parent and the
    /// operator is registered as its nested child; binding waits until the
    /// parent itself is mounted.
    pub fn mount(&mut self, key: OpKey, path: Path, parent: Option<OpKey>) -> Result<()> {
        if let Some(parent) = parent {
            return self.add_nested_op(parent, key, path);
        }
        let entry = self.entry(key)?;
        if entry.path.is_some() {
            return Err(PreconditionViolation::AlreadyMounted(key).into());
        }
        if entry.parent.is_some() {
            return Err(PreconditionViolation::AlreadyNested(key).into());
        }
        self.op_tree.insert(&path, key);
        self.bind(key, path)?;
        self.flush()
    }

    /// Unmount an operator and, first, all of its nested children.
    ///
    /// The operator's data slice is deleted. Nested children stay registered,
    /// so mounting the operator again mounts them again too.
    pub fn unmount(&mut self, key: OpKey) -> Result<()> {
        let entry = self.entry(key)?;
        let Some(path) = entry.path.clone() else {
            return Ok(());
        };
        let is_root = entry.parent.is_none();
        let children: Vec<OpKey> = entry.nested.keys().copied().collect();
        for child in children {
            self.unmount(child)?;
        }
        if is_root {
            self.op_tree.remove(&path, key);
        }
        alma_path::delete(&mut self.data, &path);
        self.entry_mut(key)?.path = None;
        tracing::debug!(op = %key, path = %format_path(&path), "unmounted operator");
        self.flush()
    }

    /// Register `child` under `parent` at `relative`.
    ///
    /// If the parent is mounted, the child is mounted right away.
    pub fn add_nested_op(&mut self, parent: OpKey, child: OpKey, relative: Path) -> Result<()> {
        let parent_path = self.entry(parent)?.path.clone();
        let child_entry = self.entry(child)?;
        if child_entry.parent.is_some_and(|p| p != parent) {
            return Err(PreconditionViolation::AlreadyNested(child).into());
        }
        if child_entry.parent.is_none() && child_entry.path.is_some() {
            return Err(PreconditionViolation::AlreadyMounted(child).into());
        }
        if self.is_ancestor(child, parent) {
            return Err(PreconditionViolation::NestingCycle(child).into());
        }
        self.entry_mut(parent)?.nested.insert(child, relative.clone());
        self.entry_mut(child)?.parent = Some(parent);
        if let Some(parent_path) = parent_path {
            if !self.is_mounted(child) {
                self.bind(child, join(&parent_path, &relative))?;
            }
        }
        self.flush()
    }

    /// Unmount `child` and drop it from `parent`'s registry.
    pub fn remove_nested_op(&mut self, parent: OpKey, child: OpKey) -> Result<()> {
        if !self.entry(parent)?.nested.contains_key(&child) {
            return Ok(());
        }
        self.unmount(child)?;
        self.entry_mut(parent)?.nested.shift_remove(&child);
        self.entry_mut(child)?.parent = None;
        Ok(())
    }

    pub fn nested_ops(&self, key: OpKey) -> Vec<OpKey> {
        self.ops
            .get(key)
            .map(|entry| entry.nested.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn parent_of(&self, key: OpKey) -> Option<OpKey> {
        self.ops.get(key).and_then(|entry| entry.parent)
    }

    pub fn is_mounted(&self, key: OpKey) -> bool {
        self.ops.get(key).is_some_and(|entry| entry.path.is_some())
    }

    // ── Path-relative access ──────────────────────────────────────────────

    /// The operator's absolute path followed by `relative`.
    ///
    /// An unmounted operator behaves as if it were mounted at the root.
    pub fn get_path(&self, key: OpKey, relative: &[&str]) -> Path {
        let mut path = self
            .ops
            .get(key)
            .and_then(|entry| entry.path.clone())
            .unwrap_or_default();
        path.extend(relative.iter().map(|step| step.to_string()));
        path
    }

    pub fn get_model_data(&self, key: OpKey, relative: &[&str]) -> Result<Option<&Value>> {
        let path = self.absolute(key, relative)?;
        Ok(alma_path::get(&self.data, &path))
    }

    pub fn get_model_data_or(&self, key: OpKey, relative: &[&str], default: Value) -> Result<Value> {
        Ok(self.get_model_data(key, relative)?.cloned().unwrap_or(default))
    }

    pub fn set_model_data(&mut self, key: OpKey, relative: &[&str], value: Value) -> Result<()> {
        let path = self.absolute(key, relative)?;
        alma_path::set(&mut self.data, &path, value);
        Ok(())
    }

    pub fn delete_model_data(&mut self, key: OpKey, relative: &[&str]) -> Result<()> {
        let path = self.absolute(key, relative)?;
        alma_path::delete(&mut self.data, &path);
        Ok(())
    }

    /// Whether `path` lies at or below the operator's own path.
    pub fn path_belongs_to_op(&self, key: OpKey, path: &[String]) -> bool {
        match self.ops.get(key).and_then(|entry| entry.path.as_ref()) {
            Some(own) => alma_path::is_prefix(own, path),
            None => false,
        }
    }

    /// Wrap `data` in empty objects from the root down to the operator's path.
    pub fn get_absolute_change(&self, key: OpKey, data: Value) -> Value {
        absolute_change(&self.get_path(key, &[]), data)
    }

    /// Pull the operator's own slice out of a root-level value.
    pub fn get_relative_slice<'d>(&self, key: OpKey, data: &'d Value) -> Option<&'d Value> {
        let path = self.ops.get(key)?.path.as_ref()?;
        alma_path::get(data, path)
    }

    // ── Selectors and intentions ──────────────────────────────────────────

    /// The operator's selector table.
    ///
    /// Built from `fns` on the first call that supplies at least one
    /// function; every later call returns the same table and ignores `fns`.
    pub fn selectors<I>(&mut self, key: OpKey, fns: I) -> Result<Option<Rc<Selectors>>>
    where
        I: IntoIterator<Item = (&'static str, SelectorFn)>,
    {
        let entry = self.entry_mut(key)?;
        if entry.selectors.is_none() {
            entry.selectors = build_table(key, fns).map(Rc::new);
        }
        Ok(entry.selectors.clone())
    }

    /// The operator's intention table, memoized like [`Model::selectors`].
    pub fn intentions<I>(&mut self, key: OpKey, fns: I) -> Result<Option<Rc<Intentions>>>
    where
        I: IntoIterator<Item = (&'static str, IntentionFn)>,
    {
        let entry = self.entry_mut(key)?;
        if entry.intentions.is_none() {
            entry.intentions = build_table(key, fns).map(Rc::new);
        }
        Ok(entry.intentions.clone())
    }

    // ── The cycle ─────────────────────────────────────────────────────────

    /// Submit a proposal on behalf of an operator.
    ///
    /// Relative data is wrapped into an absolute change first.
    pub fn propose(
        &mut self,
        key: OpKey,
        action: impl Into<Action>,
        data: Value,
        relative: bool,
    ) -> Result<()> {
        let path = self.absolute(key, &[])?;
        let proposal = if relative {
            absolute_change(&path, data)
        } else {
            data
        };
        self.consider(proposal, Some(key), action.into())
    }

    /// Broadcast a root-level proposal to every operator, then let the
    /// supervisor render and react.
    pub fn consider(&mut self, data: Value, source: Option<OpKey>, action: Action) -> Result<()> {
        if self.phase == Phase::Considering {
            return Err(PreconditionViolation::ReentrantProposal(action.name).into());
        }
        // The supervisor is lent out while reacting; proposals made then are
        // queued behind the current cycle.
        if self.phase == Phase::Idle && self.supervisor.is_none() {
            return Err(PreconditionViolation::MissingSupervisor.into());
        }
        self.pending.push_back(Proposal {
            data,
            source,
            action,
        });
        self.flush()
    }

    /// Run the supervisor outside of any proposal, e.g. for the first render.
    pub fn process(&mut self, source: Option<OpKey>, action: &Action) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(PreconditionViolation::ReentrantProposal(action.name.clone()).into());
        }
        self.phase = Phase::Reacting;
        let result = self.supervise(source, action);
        self.phase = Phase::Idle;
        result?;
        self.flush()
    }

    /// Broadcast `post_process` to every mounted operator.
    pub fn post_process(&mut self, source: Option<OpKey>, action: &Action) -> Result<()> {
        for key in self.broadcast_order() {
            if self.is_mounted(key) {
                self.dispatch(key, |op, cx| op.post_process(cx, source, action))?;
            }
        }
        self.flush()
    }

    /// Replace the data tree and reset every mounted operator.
    pub fn reset(&mut self, data: Value) -> Result<()> {
        self.data = data;
        for key in self.broadcast_order() {
            if self.is_mounted(key) {
                self.dispatch(key, |op, cx| op.reset(cx))?;
            }
        }
        self.flush()
    }

    /// Reset a single operator.
    pub fn reset_op(&mut self, key: OpKey) -> Result<()> {
        self.dispatch(key, |op, cx| op.reset(cx))?;
        self.flush()
    }

    fn flush(&mut self) -> Result<()> {
        if self.phase != Phase::Idle || self.dispatching > 0 {
            return Ok(());
        }
        while let Some(proposal) = self.pending.pop_front() {
            if let Err(err) = self.run_cycle(&proposal) {
                self.pending.clear();
                self.phase = Phase::Idle;
                return Err(err);
            }
        }
        Ok(())
    }

    fn run_cycle(&mut self, proposal: &Proposal) -> Result<()> {
        let Proposal {
            data,
            source,
            action,
        } = proposal;
        tracing::debug!(action = %action.name, source = ?source, "considering proposal");
        self.phase = Phase::Considering;
        for key in self.broadcast_order() {
            if self.is_mounted(key) {
                self.dispatch(key, |op, cx| op.consider(cx, data, *source, action))?;
            }
        }
        self.phase = Phase::Reacting;
        self.supervise(*source, action)?;
        self.phase = Phase::Idle;
        Ok(())
    }

    fn supervise(&mut self, source: Option<OpKey>, action: &Action) -> Result<()> {
        let mut supervisor = self
            .supervisor
            .take()
            .ok_or(PreconditionViolation::MissingSupervisor)?;
        let result = supervisor.process(self, source, action);
        self.supervisor = Some(supervisor);
        result
    }

    // ── Internals ─────────────────────────────────────────────────────────

    fn entry(&self, key: OpKey) -> Result<&Entry> {
        self.ops
            .get(key)
            .ok_or_else(|| PreconditionViolation::UnknownOperator(key).into())
    }

    fn entry_mut(&mut self, key: OpKey) -> Result<&mut Entry> {
        self.ops
            .get_mut(key)
            .ok_or_else(|| PreconditionViolation::UnknownOperator(key).into())
    }

    /// Absolute path of `relative`, failing if the operator is unmounted.
    fn absolute(&self, key: OpKey, relative: &[&str]) -> Result<Path> {
        let entry = self.entry(key)?;
        let mut path = entry
            .path
            .clone()
            .ok_or_else(|| KernelError::UnmountedOperator(entry.op_name.clone()))?;
        path.extend(relative.iter().map(|step| step.to_string()));
        Ok(path)
    }

    fn bind(&mut self, key: OpKey, path: Path) -> Result<()> {
        let entry = self.entry_mut(key)?;
        entry.path = Some(path.clone());
        let children: Vec<(OpKey, Path)> = entry
            .nested
            .iter()
            .map(|(child, relative)| (*child, relative.clone()))
            .collect();
        tracing::debug!(op = %key, path = %format_path(&path), "mounted operator");
        for (child, relative) in children {
            if !self.is_mounted(child) {
                self.bind(child, join(&path, &relative))?;
            }
        }
        self.dispatch(key, |op, cx| op.on_mount(cx))
    }

    fn is_ancestor(&self, candidate: OpKey, of: OpKey) -> bool {
        let mut current = Some(of);
        while let Some(key) = current {
            if key == candidate {
                return true;
            }
            current = self.ops.get(key).and_then(|entry| entry.parent);
        }
        false
    }

    /// Operators in broadcast order: root tree leaves pre-order, each
    /// followed by its nested children.
    fn broadcast_order(&self) -> Vec<OpKey> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        for (_, key) in self.op_tree.leaves() {
            self.visit(key, &mut visited, &mut order);
        }
        order
    }

    fn visit(&self, key: OpKey, visited: &mut HashSet<OpKey>, order: &mut Vec<OpKey>) {
        if !visited.insert(key) {
            return;
        }
        order.push(key);
        if let Some(entry) = self.ops.get(key) {
            for child in entry.nested.keys() {
                self.visit(*child, visited, order);
            }
        }
    }

    /// Lend an operator's behavior out for one call.
    fn dispatch<R>(
        &mut self,
        key: OpKey,
        f: impl FnOnce(&mut dyn Operator, &mut OpContext<'_>) -> Result<R>,
    ) -> Result<R> {
        let mut behavior = self
            .entry_mut(key)?
            .behavior
            .take()
            .ok_or(PreconditionViolation::OperatorBusy(key))?;
        tracing::trace!(op = %key, "dispatch");
        self.dispatching += 1;
        let result = f(&mut *behavior, &mut OpContext::new(self, key));
        self.dispatching -= 1;
        if let Some(entry) = self.ops.get_mut(key) {
            entry.behavior = Some(behavior);
        }
        result
    }
}

fn join(base: &[String], relative: &[String]) -> Path {
    base.iter().chain(relative).cloned().collect()
}

fn absolute_change(path: &[String], data: Value) -> Value {
    path.iter().rev().fold(data, |inner, step| {
        let mut wrapper = Map::new();
        wrapper.insert(step.clone(), inner);
        Value::Object(wrapper)
    })
}

fn build_table<F, I>(key: OpKey, fns: I) -> Option<Bound<F>>
where
    I: IntoIterator<Item = (&'static str, F)>,
{
    let table: IndexMap<String, F> = fns
        .into_iter()
        .map(|(name, f)| (name.to_string(), f))
        .collect();
    if table.is_empty() {
        None
    } else {
        Some(Bound::new(key, table))
    }
}
