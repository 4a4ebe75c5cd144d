//! The pool core: task queue, workers, monitor, and the public façade.

pub mod error;
pub mod pool;

mod monitor;
mod queue;
mod task;
mod worker;

pub use error::PoolError;
pub use pool::{Pool, PoolStats};
