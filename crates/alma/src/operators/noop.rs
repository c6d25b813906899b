use serde_json::Value;

use crate::action::Action;
use crate::error::Result;
use crate::model::OpKey;
use crate::operator::{OpContext, Operator};

/// An operator that ignores every proposal.
#[derive(Debug, Clone, Copy, Default)]
pub struct Noop;

impl Operator for Noop {
    fn op_name(&self) -> &str {
        "Noop"
    }

    fn consider(&mut self, _: &mut OpContext<'_>, _: &Value, _: Option<OpKey>, _: &Action) -> Result<()> {
        Ok(())
    }
}
