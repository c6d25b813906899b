//! A state kernel built around one cycle: **propose → consider → digest →
//! post-process**.
//!
//! Operators own slices of a JSON data tree. They never write to it directly
//! from the outside; instead they propose a change, every mounted operator
//! considers it and commits what belongs to it, a [`Presenter`] renders the
//! result, and operators get a chance to react.
//!
//! # Example
//!
//! ```
//! use alma::{Engine, OpTree, TestPresenter};
//! use alma::operators::{AddItems, Counter, List};
//! use serde_json::json;
//!
//! let presenter = TestPresenter::new();
//! let log = presenter.log();
//! let mut engine = Engine::new(presenter);
//! engine.start().unwrap();
//!
//! let model = engine.model_mut();
//! let list = model.insert_op(List::new());
//! model.mount_op_tree(OpTree::branch().with("list", list)).unwrap();
//!
//! let counter = model.insert_op(Counter::new());
//! let ids = model
//!     .with_op(list, |l: &mut List, cx| l.add_items(cx, List::END, &[counter], AddItems::reset_ops()))
//!     .unwrap();
//!
//! let id = ids[0].to_string();
//! assert_eq!(
//!     log.state(),
//!     Some(json!({"list": {"order": [1], "opNames": {"1": "Counter"}, "items": {"1": {"value": 0}}}})),
//! );
//! assert_eq!(model.get_path(counter, &[]), vec!["list", "items", id.as_str()]);
//! ```

pub mod action;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod operator;
pub mod operators;
pub mod presenter;
pub mod sequence;
pub mod supervisor;

pub use action::Action;
pub use alma_path::{to_path, Path, PathStep};
pub use config::ListConfig;
pub use engine::{Engine, START_ACTION};
pub use error::{KernelError, PreconditionViolation, Result};
pub use model::{Model, OpKey, OpTree};
pub use operator::{OpContext, Operator};
pub use presenter::{Presenter, RenderLog, TestPresenter};
pub use supervisor::{PostProcessHook, Supervision, Supervisor};
