//! Wiring of presenter, supervisor and model.

use serde_json::Value;

use crate::action::Action;
use crate::error::Result;
use crate::model::Model;
use crate::presenter::Presenter;
use crate::supervisor::{Supervision, Supervisor};

/// Name of the action used for the first render.
pub const START_ACTION: &str = "$ENGINE-START$";

/// A model with a supervisor installed.
///
/// ```
/// use alma::{Engine, TestPresenter};
/// use serde_json::json;
///
/// let presenter = TestPresenter::new();
/// let log = presenter.log();
/// let mut engine = Engine::new(presenter);
/// engine.start().unwrap();
/// assert_eq!(log.state(), Some(json!({})));
/// ```
pub struct Engine {
    model: Model,
}

impl Engine {
    /// An engine around an empty model, supervised through `presenter`.
    pub fn new<P>(presenter: P) -> Self
    where
        P: Presenter + 'static,
    {
        Self::with_model(presenter, Model::new())
    }

    pub fn with_model<P>(presenter: P, model: Model) -> Self
    where
        P: Presenter + 'static,
    {
        Self::with_supervisor(Supervisor::new(presenter), model)
    }

    pub fn with_supervisor(supervisor: impl Supervision + 'static, mut model: Model) -> Self {
        model.set_supervisor(supervisor);
        Self { model }
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }

    /// Render the current state and run post-processing with no source
    /// operator.
    pub fn start(&mut self) -> Result<&mut Self> {
        tracing::debug!("engine start");
        self.model.process(None, &Action::new(START_ACTION))?;
        Ok(self)
    }

    /// Replace the model data and reset every mounted operator.
    pub fn reset(&mut self, data: Value) -> Result<&mut Self> {
        self.model.reset(data)?;
        Ok(self)
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}
