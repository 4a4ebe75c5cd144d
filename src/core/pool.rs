//! The pool façade: construction, submission, observation, shutdown.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::info;

use crate::config::{PoolConfig, ShutdownMode};

use super::error::PoolError;
use super::monitor;
use super::queue::TaskQueue;
use super::task::Task;
use super::worker::{self, WorkerHandle};

/// How often the drain-mode destructor re-checks for outstanding work.
const DRAIN_POLL: Duration = Duration::from_millis(2);

/// State shared between the façade, the workers, and the monitor.
pub(crate) struct PoolShared {
    /// Pending tasks plus the stop flag and the workers' wait condition.
    pub(crate) queue: TaskQueue,
    /// The worker set. The monitor holds this mutex for its entire life,
    /// releasing it only inside its timed wait. Lock order when both are
    /// needed: worker set first, then queue.
    pub(crate) workers: Mutex<Vec<WorkerHandle>>,
    /// Wakes the monitor out of its tick wait, used at shutdown.
    pub(crate) monitor_wakeup: Condvar,

    /// Workers currently executing a task body.
    pub(crate) active_tasks: AtomicUsize,
    /// Worker-set cardinality, cached so observers need no lock.
    pub(crate) pool_size: AtomicUsize,
    pub(crate) submitted_tasks: AtomicU64,
    pub(crate) completed_tasks: AtomicU64,
    pub(crate) failed_tasks: AtomicU64,
    pub(crate) next_worker_id: AtomicUsize,

    pub(crate) min_threads: usize,
    pub(crate) max_threads: usize,
    pub(crate) grow_tolerance_ms: u64,
    pub(crate) shrink_tolerance_ms: u64,
    pub(crate) thread_stack_size: usize,
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Current worker count.
    pub pool_size: usize,
    /// Tasks currently executing.
    pub active_tasks: usize,
    /// Tasks waiting in the queue.
    pub pending_tasks: usize,
    /// Total tasks accepted by the pool.
    pub submitted_tasks: u64,
    /// Total tasks that ran to completion.
    pub completed_tasks: u64,
    /// Total tasks that panicked.
    pub failed_tasks: u64,
}

/// An adaptive pool of worker threads.
///
/// Tasks submitted to the pool are executed on long-lived worker threads in
/// FIFO arrival order. When the configured bounds allow it, a background
/// monitor resizes the worker set in response to load: it grows quickly
/// under sustained saturation and shrinks patiently once most workers sit
/// idle.
///
/// Dropping the pool shuts it down according to the configured
/// [`ShutdownMode`]; the drop blocks until every worker has terminated.
///
/// # Example
///
/// ```
/// use elastic_pool::{Pool, PoolConfig};
///
/// let pool = Pool::new(PoolConfig::new().with_min_threads(2).with_max_threads(8)).unwrap();
/// pool.submit(|| println!("offloaded"));
/// assert!(pool.pool_size() >= 2);
/// ```
pub struct Pool {
    shared: Arc<PoolShared>,
    monitor: Option<JoinHandle<()>>,
    shutdown_mode: ShutdownMode,
}

impl Pool {
    /// Create a pool from `config`, spawning the initial workers and, when
    /// `min_threads < max_threads`, the monitor thread.
    ///
    /// A resizable pool starts with one worker more than the configured
    /// minimum; the extra absorbs the monitor's own thread in the
    /// accounting. The minimum itself remains the shrink floor.
    ///
    /// # Errors
    ///
    /// - [`PoolError::InvalidConfig`] if the configuration does not validate
    ///   (nothing is spawned).
    /// - [`PoolError::Spawn`] if a worker or monitor thread cannot be
    ///   spawned; workers spawned so far are joined before returning.
    pub fn new(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let min_threads = config.resolved_min_threads();
        let max_threads = config.max_threads;
        let start_size = if min_threads < max_threads {
            min_threads + 1
        } else {
            min_threads
        };

        let shared = Arc::new(PoolShared {
            queue: TaskQueue::new(),
            workers: Mutex::new(Vec::with_capacity(start_size)),
            monitor_wakeup: Condvar::new(),
            active_tasks: AtomicUsize::new(0),
            pool_size: AtomicUsize::new(0),
            submitted_tasks: AtomicU64::new(0),
            completed_tasks: AtomicU64::new(0),
            failed_tasks: AtomicU64::new(0),
            next_worker_id: AtomicUsize::new(0),
            min_threads,
            max_threads,
            grow_tolerance_ms: config.grow_tolerance_ms,
            shrink_tolerance_ms: config.shrink_tolerance_ms,
            thread_stack_size: config.thread_stack_size,
        });

        // On a spawn failure the partially built pool is dropped, which
        // joins whatever was already started.
        let mut pool = Self {
            shared,
            monitor: None,
            shutdown_mode: config.shutdown_mode,
        };
        for _ in 0..start_size {
            pool.add_worker()?;
        }
        if min_threads < max_threads {
            pool.monitor = Some(monitor::spawn(Arc::clone(&pool.shared))?);
        }

        info!(min_threads, max_threads, start_size, "pool started");
        Ok(pool)
    }

    /// Submit a task for execution as soon as a worker is available.
    ///
    /// Fire-and-forget: there is no result channel and no completion
    /// notification. After the pool has begun shutting down, submissions are
    /// silently discarded.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Task::immediate(Box::new(job)));
    }

    /// Submit a task that must not start before the absolute instant
    /// `run_at`.
    ///
    /// The pool guarantees only a lower bound: execution starts at or after
    /// `run_at`, as soon afterwards as a worker picks the task up.
    pub fn submit_at<F>(&self, job: F, run_at: Instant)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(Task::scheduled(Box::new(job), run_at));
    }

    /// Submit a task that must not start before `delay` from now.
    ///
    /// ```
    /// use elastic_pool::{Pool, PoolConfig};
    /// use std::time::Duration;
    ///
    /// let pool = Pool::new(PoolConfig::new().with_min_threads(1).with_max_threads(1)).unwrap();
    /// pool.submit_after(|| println!("later"), Duration::from_millis(10));
    /// ```
    pub fn submit_after<F>(&self, job: F, delay: Duration)
    where
        F: FnOnce() + Send + 'static,
    {
        self.submit_at(job, Instant::now() + delay);
    }

    /// The number of tasks currently executing, which is also the number of
    /// busy workers.
    #[must_use]
    pub fn active_tasks(&self) -> usize {
        self.shared.active_tasks.load(Ordering::Relaxed)
    }

    /// The number of tasks waiting for an available worker.
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        self.shared.queue.len()
    }

    /// The current worker count, between the configured minimum and maximum.
    #[must_use]
    pub fn pool_size(&self) -> usize {
        self.shared.pool_size.load(Ordering::Relaxed)
    }

    /// A point-in-time snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            pool_size: self.pool_size(),
            active_tasks: self.active_tasks(),
            pending_tasks: self.pending_tasks(),
            submitted_tasks: self.shared.submitted_tasks.load(Ordering::Relaxed),
            completed_tasks: self.shared.completed_tasks.load(Ordering::Relaxed),
            failed_tasks: self.shared.failed_tasks.load(Ordering::Relaxed),
        }
    }

    fn push(&self, task: Task) {
        if self.shared.queue.push(task) {
            self.shared.submitted_tasks.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn add_worker(&self) -> Result<(), PoolError> {
        let mut workers = self.shared.workers.lock();
        let id = self.shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        let handle = worker::spawn(id, self.shared.thread_stack_size, Arc::clone(&self.shared))?;
        workers.push(handle);
        self.shared.pool_size.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl Drop for Pool {
    /// Shut the pool down and block until every thread has terminated.
    ///
    /// Running tasks always finish. Queued tasks are discarded or drained
    /// according to the configured [`ShutdownMode`].
    fn drop(&mut self) {
        self.shared
            .queue
            .close(self.shutdown_mode == ShutdownMode::CancelPending);

        // The monitor re-checks the stop flag on every tick; wake it and
        // wait for it to release the worker-set mutex for good.
        if let Some(monitor) = self.monitor.take() {
            self.shared.monitor_wakeup.notify_one();
            monitor.join().expect("monitor thread panicked");
        }

        if self.shutdown_mode == ShutdownMode::Drain {
            while self.active_tasks() + self.pending_tasks() > 0 {
                thread::sleep(DRAIN_POLL);
            }
        }

        let mut workers = self.shared.workers.lock();
        for handle in workers.drain(..) {
            self.shared.queue.interrupt(&handle.flags);
            self.shared.pool_size.fetch_sub(1, Ordering::Relaxed);
            handle.thread.join().expect("worker thread panicked");
        }

        info!("pool shut down");
    }
}
