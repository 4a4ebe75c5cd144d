//! Pool configuration structures.

use serde::{Deserialize, Serialize};

/// Default minimum number of workers kept alive.
pub const DEFAULT_MIN_THREADS: usize = 8;

/// Default upper bound on the worker count.
pub const DEFAULT_MAX_THREADS: usize = 1000;

/// Default milliseconds of sustained saturation before the pool grows.
pub const DEFAULT_GROW_TOLERANCE_MS: u64 = 100;

/// Default milliseconds of sustained idleness before the pool shrinks.
///
/// Deliberately three orders of magnitude larger than
/// [`DEFAULT_GROW_TOLERANCE_MS`]: the pool reacts quickly to saturation but
/// is patient before releasing capacity.
pub const DEFAULT_SHRINK_TOLERANCE_MS: u64 = 120_000;

fn default_min_threads() -> Option<usize> {
    Some(DEFAULT_MIN_THREADS)
}

fn default_max_threads() -> usize {
    DEFAULT_MAX_THREADS
}

fn default_grow_tolerance_ms() -> u64 {
    DEFAULT_GROW_TOLERANCE_MS
}

fn default_shrink_tolerance_ms() -> u64 {
    DEFAULT_SHRINK_TOLERANCE_MS
}

/// Default thread stack size: 2MB.
fn default_thread_stack_size() -> usize {
    2 * 1024 * 1024
}

fn default_shutdown_mode() -> ShutdownMode {
    ShutdownMode::CancelPending
}

/// What happens to queued tasks when the pool is dropped.
///
/// Tasks that are already executing always run to completion; the mode only
/// decides the fate of tasks still waiting in the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownMode {
    /// Discard every queued task and stop as soon as running tasks finish.
    CancelPending,
    /// Keep executing until the queue is empty, then stop.
    Drain,
}

/// Configuration for a [`Pool`](crate::Pool).
///
/// # Example
///
/// ```
/// use elastic_pool::{PoolConfig, ShutdownMode};
///
/// let config = PoolConfig::new()
///     .with_min_threads(4)
///     .with_max_threads(64)
///     .with_grow_tolerance_ms(100)
///     .with_shrink_tolerance_ms(30_000)
///     .with_shutdown_mode(ShutdownMode::Drain);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Minimum number of workers kept alive.
    ///
    /// `None` selects an automatic minimum of twice the hardware parallelism,
    /// clamped to `[1, max_threads]`. In JSON configuration, `null` selects
    /// the automatic minimum.
    ///
    /// Default: 8.
    #[serde(default = "default_min_threads")]
    pub min_threads: Option<usize>,

    /// Upper bound on the worker count.
    ///
    /// Default: 1000.
    #[serde(default = "default_max_threads")]
    pub max_threads: usize,

    /// Milliseconds of sustained saturation (every worker busy with a
    /// backlog queued) before the monitor grows the pool.
    ///
    /// Default: 100.
    #[serde(default = "default_grow_tolerance_ms")]
    pub grow_tolerance_ms: u64,

    /// Milliseconds of sustained idleness (at least 75% of workers idle)
    /// before the monitor shrinks the pool.
    ///
    /// Default: 120 000 (two minutes).
    #[serde(default = "default_shrink_tolerance_ms")]
    pub shrink_tolerance_ms: u64,

    /// Stack size per worker thread in bytes.
    ///
    /// Default: 2MB (2 * 1024 * 1024 bytes).
    #[serde(default = "default_thread_stack_size")]
    pub thread_stack_size: usize,

    /// What to do with queued tasks when the pool is dropped.
    ///
    /// Default: [`ShutdownMode::CancelPending`].
    #[serde(default = "default_shutdown_mode")]
    pub shutdown_mode: ShutdownMode,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_threads: default_min_threads(),
            max_threads: default_max_threads(),
            grow_tolerance_ms: default_grow_tolerance_ms(),
            shrink_tolerance_ms: default_shrink_tolerance_ms(),
            thread_stack_size: default_thread_stack_size(),
            shutdown_mode: default_shutdown_mode(),
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum worker count.
    #[must_use]
    pub fn with_min_threads(mut self, min: usize) -> Self {
        self.min_threads = Some(min);
        self
    }

    /// Derive the minimum worker count from the hardware parallelism.
    #[must_use]
    pub fn with_auto_min_threads(mut self) -> Self {
        self.min_threads = None;
        self
    }

    /// Set the maximum worker count.
    #[must_use]
    pub fn with_max_threads(mut self, max: usize) -> Self {
        self.max_threads = max;
        self
    }

    /// Set the saturation tolerance in milliseconds.
    #[must_use]
    pub fn with_grow_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.grow_tolerance_ms = tolerance_ms;
        self
    }

    /// Set the idleness tolerance in milliseconds.
    #[must_use]
    pub fn with_shrink_tolerance_ms(mut self, tolerance_ms: u64) -> Self {
        self.shrink_tolerance_ms = tolerance_ms;
        self
    }

    /// Set the thread stack size.
    #[must_use]
    pub fn with_thread_stack_size(mut self, size: usize) -> Self {
        self.thread_stack_size = size;
        self
    }

    /// Set the shutdown mode.
    #[must_use]
    pub fn with_shutdown_mode(mut self, mode: ShutdownMode) -> Self {
        self.shutdown_mode = mode;
        self
    }

    /// The minimum worker count after resolving the automatic setting.
    ///
    /// Call [`validate`](Self::validate) first; the result is unspecified for
    /// configurations that do not validate.
    #[must_use]
    pub fn resolved_min_threads(&self) -> usize {
        self.min_threads
            .unwrap_or_else(|| (num_cpus::get() * 2).clamp(1, self.max_threads))
    }

    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns a human-readable description of the first violated constraint.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_threads == 0 {
            return Err("max_threads must be greater than 0".into());
        }
        if let Some(min) = self.min_threads {
            if min > self.max_threads {
                return Err(format!(
                    "max_threads ({}) must be >= min_threads ({min})",
                    self.max_threads
                ));
            }
        }
        if self.thread_stack_size < 64 * 1024 {
            return Err("thread_stack_size must be at least 64KB".into());
        }
        Ok(())
    }

    /// Parse a pool configuration from a JSON string and validate it.
    ///
    /// # Errors
    ///
    /// Returns a description of the parse failure or of the first violated
    /// constraint.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PoolConfig::default();
        assert_eq!(cfg.min_threads, Some(8));
        assert_eq!(cfg.max_threads, 1000);
        assert_eq!(cfg.grow_tolerance_ms, 100);
        assert_eq!(cfg.shrink_tolerance_ms, 120_000);
        assert_eq!(cfg.shutdown_mode, ShutdownMode::CancelPending);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let cfg = PoolConfig::new()
            .with_min_threads(2)
            .with_max_threads(16)
            .with_grow_tolerance_ms(50)
            .with_shrink_tolerance_ms(500)
            .with_thread_stack_size(128 * 1024)
            .with_shutdown_mode(ShutdownMode::Drain);
        assert_eq!(cfg.min_threads, Some(2));
        assert_eq!(cfg.max_threads, 16);
        assert_eq!(cfg.grow_tolerance_ms, 50);
        assert_eq!(cfg.shrink_tolerance_ms, 500);
        assert_eq!(cfg.thread_stack_size, 128 * 1024);
        assert_eq!(cfg.shutdown_mode, ShutdownMode::Drain);
    }

    #[test]
    fn test_validate_rejects_inverted_bounds() {
        let cfg = PoolConfig::new().with_min_threads(8).with_max_threads(4);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_max() {
        let cfg = PoolConfig::new().with_max_threads(0);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_stack() {
        let cfg = PoolConfig::new().with_thread_stack_size(1024);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_auto_min_threads_resolves_within_bounds() {
        let cfg = PoolConfig::new().with_auto_min_threads().with_max_threads(4);
        let min = cfg.resolved_min_threads();
        assert!(min >= 1);
        assert!(min <= 4);
    }

    #[test]
    fn test_fixed_min_threads_resolves_as_given() {
        let cfg = PoolConfig::new().with_min_threads(3).with_max_threads(16);
        assert_eq!(cfg.resolved_min_threads(), 3);
    }

    #[test]
    fn test_from_json_str() {
        let cfg = PoolConfig::from_json_str(
            r#"{"min_threads": 2, "max_threads": 8, "shutdown_mode": "drain"}"#,
        )
        .unwrap();
        assert_eq!(cfg.min_threads, Some(2));
        assert_eq!(cfg.max_threads, 8);
        assert_eq!(cfg.shutdown_mode, ShutdownMode::Drain);
        // omitted fields take defaults
        assert_eq!(cfg.grow_tolerance_ms, 100);
    }

    #[test]
    fn test_from_json_str_null_min_is_auto() {
        let cfg =
            PoolConfig::from_json_str(r#"{"min_threads": null, "max_threads": 8}"#).unwrap();
        assert_eq!(cfg.min_threads, None);
    }

    #[test]
    fn test_from_json_str_rejects_invalid() {
        assert!(PoolConfig::from_json_str("not json").is_err());
        assert!(
            PoolConfig::from_json_str(r#"{"min_threads": 9, "max_threads": 4}"#).is_err()
        );
    }
}
