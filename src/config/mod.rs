//! Pool configuration.

pub mod pool;

pub use pool::{
    PoolConfig, ShutdownMode, DEFAULT_GROW_TOLERANCE_MS, DEFAULT_MAX_THREADS, DEFAULT_MIN_THREADS,
    DEFAULT_SHRINK_TOLERANCE_MS,
};
