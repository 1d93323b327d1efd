//! Task runtime primitives shared by sift crates.
//!
//! Every task sift spawns goes through this crate so that it carries a
//! [`TaskClass`] in its trace events and lands on a runtime even when the
//! caller is not inside one.

mod class;
mod join_ctrl;
mod join_set;
mod panic;
mod spawn;

pub use class::TaskClass;
pub use join_ctrl::JoinCtrl;
pub use join_set::WorkerJoinSet;
pub use panic::join_error_panic_message;
pub use spawn::spawn;
