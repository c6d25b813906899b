#![allow(dead_code)]

use std::sync::Once;

use alma::{Engine, Model, OpTree, RenderLog, TestPresenter};

/// A started engine plus a handle on what it rendered.
pub struct TestEngine {
    pub engine: Engine,
    pub log: RenderLog,
}

impl TestEngine {
    /// Mount `tree` and run the first render.
    pub fn start(tree: OpTree) -> Self {
        init_tracing();
        let presenter = TestPresenter::new();
        let log = presenter.log();
        let mut engine = Engine::new(presenter);
        engine
            .model_mut()
            .mount_op_tree(tree)
            .expect("op tree must mount");
        engine.start().expect("engine must start");
        Self { engine, log }
    }

    pub fn model(&mut self) -> &mut Model {
        self.engine.model_mut()
    }

    pub fn state(&self) -> serde_json::Value {
        self.log.state().expect("nothing rendered yet")
    }
}

static INIT_LOGGING: Once = Once::new();

/// Route kernel logs through the test harness when `TEST_LOG` is set.
pub fn init_tracing() {
    INIT_LOGGING.call_once(|| {
        if std::env::var("TEST_LOG").is_ok() {
            let _ = tracing_subscriber::fmt()
                .with_test_writer()
                .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "alma=debug".to_string()))
                .try_init();
        }
    });
}
