//! The operator abstraction.
//!
//! An [`Operator`] owns a subtree of the data tree and of behavior. The model
//! keeps the bookkeeping every operator shares (path binding, nested-child
//! registry, memoized selector/intention tables) and lends the behavior object
//! out to each call together with an [`OpContext`] scoped to that operator.

mod bound;
mod context;

use std::any::Any;

use serde_json::Value;

use crate::action::Action;
use crate::error::Result;
use crate::model::OpKey;

pub use bound::{Bound, IntentionFn, Intentions, SelectorFn, Selectors};
pub use context::OpContext;

/// Upcast helper so the model can hand out concrete operator types.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behavior of a node in the operator tree.
///
/// Every method receives an [`OpContext`] bound to the operator's own key, so
/// data access is relative to wherever the operator is mounted.
pub trait Operator: AsAny + 'static {
    /// Name used in persisted layouts (e.g. a list's `opNames`) and errors.
    fn op_name(&self) -> &str;

    /// Inspect a proposal broadcast by the model and commit whatever part of
    /// it belongs to this operator.
    ///
    /// `data` is the whole proposal, rooted at the model root. Operators are
    /// responsible for their own filtering: check
    /// [`OpContext::get_relative_slice`], `action.name` and `source` before
    /// writing anything.
    fn consider(
        &mut self,
        cx: &mut OpContext<'_>,
        data: &Value,
        source: Option<OpKey>,
        action: &Action,
    ) -> Result<()>;

    /// React after the committed state has been rendered.
    fn post_process(
        &mut self,
        _cx: &mut OpContext<'_>,
        _source: Option<OpKey>,
        _action: &Action,
    ) -> Result<()> {
        Ok(())
    }

    /// Establish default state.
    fn reset(&mut self, _cx: &mut OpContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Called once the operator (and its registered children) are bound.
    fn on_mount(&mut self, _cx: &mut OpContext<'_>) -> Result<()> {
        Ok(())
    }
}
