//! # Elastic Pool
//!
//! A self-resizing worker pool for offloading blocking work.
//!
//! The pool executes fire-and-forget tasks on a set of long-lived OS threads
//! and continuously resizes that set between a configured minimum and maximum
//! in response to observed load. A single background monitor thread samples
//! the pool every millisecond: sustained saturation grows the pool by a
//! factor of 1.5, sustained idleness halves it, and hysteresis keeps
//! transient spikes from driving oscillation.
//!
//! Tasks may also be deferred until an absolute point in time with
//! [`Pool::submit_at`] or [`Pool::submit_after`].
//!
//! ## Modules
//!
//! - [`config`] - Pool configuration and shutdown policy
//! - [`core`] - The pool itself: queue, workers, monitor, façade
//! - [`util`] - Telemetry helpers
//!
//! ## Examples
//!
//! ### Running work on a fixed-size pool
//!
//! ```
//! use elastic_pool::{Pool, PoolConfig, ShutdownMode};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! let config = PoolConfig::new()
//!     .with_min_threads(2)
//!     .with_max_threads(2)
//!     .with_shutdown_mode(ShutdownMode::Drain);
//! let pool = Pool::new(config).unwrap();
//!
//! let counter = Arc::new(AtomicUsize::new(0));
//! for _ in 0..16 {
//!     let counter = Arc::clone(&counter);
//!     pool.submit(move || {
//!         counter.fetch_add(1, Ordering::Relaxed);
//!     });
//! }
//!
//! // In drain mode, dropping the pool waits for every submitted task.
//! drop(pool);
//! assert_eq!(counter.load(Ordering::Relaxed), 16);
//! ```
//!
//! ### Letting the pool resize itself
//!
//! ```
//! use elastic_pool::{Pool, PoolConfig};
//!
//! // Between 2 and 64 workers; grow after 100 ms of saturation, shrink
//! // after 30 s of idleness.
//! let pool = Pool::new(
//!     PoolConfig::new()
//!         .with_min_threads(2)
//!         .with_max_threads(64)
//!         .with_grow_tolerance_ms(100)
//!         .with_shrink_tolerance_ms(30_000),
//! )
//! .unwrap();
//!
//! pool.submit(|| {
//!     // potentially blocking work
//! });
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod core;
pub mod util;

// Re-export main types for convenience
pub use crate::config::{PoolConfig, ShutdownMode};
pub use crate::core::{Pool, PoolError, PoolStats};
