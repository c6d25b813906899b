//! Operators shipped with the kernel.

mod counter;
mod list;
mod noop;

pub use counter::Counter;
pub use list::{AddItems, Creator, Creators, List};
pub use noop::Noop;
