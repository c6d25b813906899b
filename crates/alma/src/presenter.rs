//! Presenters turn the committed model into something to display.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;

use crate::model::Model;

/// Renders the model after every committed proposal.
pub trait Presenter {
    type Representation;

    fn get_representation(&self, model: &Model) -> Self::Representation;

    fn render(&mut self, representation: Self::Representation);
}

#[derive(Debug, Default)]
struct Rendered {
    state: Option<Value>,
    renders: usize,
}

/// Shared record of what a [`TestPresenter`] rendered.
///
/// Cloning the log yields another handle to the same record, so tests can keep
/// one after the presenter has been moved into a supervisor.
#[derive(Debug, Clone, Default)]
pub struct RenderLog(Rc<RefCell<Rendered>>);

impl RenderLog {
    /// The last rendered state, if anything was rendered yet.
    pub fn state(&self) -> Option<Value> {
        self.0.borrow().state.clone()
    }

    pub fn renders(&self) -> usize {
        self.0.borrow().renders
    }

    fn record(&self, state: Value) {
        let mut rendered = self.0.borrow_mut();
        rendered.state = Some(state);
        rendered.renders += 1;
    }
}

/// A presenter whose representation is a copy of the data tree.
#[derive(Debug, Clone, Default)]
pub struct TestPresenter {
    log: RenderLog,
}

impl TestPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> RenderLog {
        self.log.clone()
    }
}

impl Presenter for TestPresenter {
    type Representation = Value;

    fn get_representation(&self, model: &Model) -> Value {
        model.data().clone()
    }

    fn render(&mut self, representation: Value) {
        self.log.record(representation);
    }
}
