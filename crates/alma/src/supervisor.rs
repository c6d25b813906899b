//! Digest and react: what happens after a proposal is committed.

use crate::action::Action;
use crate::error::Result;
use crate::model::{Model, OpKey};
use crate::presenter::Presenter;

/// Runs after every committed proposal.
pub trait Supervision {
    fn process(&mut self, model: &mut Model, source: Option<OpKey>, action: &Action) -> Result<()>;
}

/// Work bracketing the model-wide post-process broadcast.
pub trait PostProcessHook {
    fn before(&mut self, _model: &mut Model, _source: Option<OpKey>, _action: &Action) -> Result<()> {
        Ok(())
    }

    fn after(&mut self, _model: &mut Model, _source: Option<OpKey>, _action: &Action) -> Result<()> {
        Ok(())
    }
}

/// Renders through a presenter, then lets operators react.
pub struct Supervisor<P> {
    presenter: P,
    hook: Option<Box<dyn PostProcessHook>>,
}

impl<P: Presenter> Supervisor<P> {
    pub fn new(presenter: P) -> Self {
        Self {
            presenter,
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: impl PostProcessHook + 'static) -> Self {
        self.hook = Some(Box::new(hook));
        self
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn presenter_mut(&mut self) -> &mut P {
        &mut self.presenter
    }

    /// Hand the committed model to the presenter.
    pub fn digest(&mut self, model: &Model) {
        tracing::debug!("digest");
        let representation = self.presenter.get_representation(model);
        self.presenter.render(representation);
    }

    /// Broadcast `post_process` to the model, bracketed by the hook.
    pub fn post_process(&mut self, model: &mut Model, source: Option<OpKey>, action: &Action) -> Result<()> {
        tracing::debug!(action = %action.name, "post-process");
        if let Some(hook) = self.hook.as_mut() {
            hook.before(model, source, action)?;
        }
        model.post_process(source, action)?;
        if let Some(hook) = self.hook.as_mut() {
            hook.after(model, source, action)?;
        }
        Ok(())
    }
}

impl<P: Presenter> Supervision for Supervisor<P> {
    fn process(&mut self, model: &mut Model, source: Option<OpKey>, action: &Action) -> Result<()> {
        self.digest(model);
        self.post_process(model, source, action)
    }
}
