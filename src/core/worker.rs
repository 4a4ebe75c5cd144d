//! Worker threads and their monitor-visible state.

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, error};

use super::pool::PoolShared;
use super::queue::Dequeued;

/// Per-worker state shared between the worker thread and its handle.
///
/// Both flags are written only while the queue mutex is held, which is what
/// lets the monitor read them without a race: a worker observed as non-busy
/// under that mutex is pinned inside its queue wait.
pub(crate) struct WorkerFlags {
    /// True while the worker is executing a task or has just been woken and
    /// has not yet reached its next queue wait.
    busy: AtomicBool,
    /// Exit request. Honored at wait points and between tasks, never during
    /// task execution.
    interrupt: AtomicBool,
}

impl WorkerFlags {
    /// Workers start busy so the monitor cannot interrupt a freshly spawned
    /// thread before it reaches its first queue wait.
    pub(crate) fn new() -> Self {
        Self {
            busy: AtomicBool::new(true),
            interrupt: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Relaxed)
    }

    pub(crate) fn set_busy(&self, busy: bool) {
        self.busy.store(busy, Ordering::Relaxed);
    }

    pub(crate) fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    pub(crate) fn set_interrupted(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }
}

/// A worker as seen by the worker set: stable identity, monitor-visible
/// flags, and the join handle. The set has sole ownership of the handle; the
/// thread itself only holds the flags.
pub(crate) struct WorkerHandle {
    pub(crate) id: usize,
    pub(crate) flags: Arc<WorkerFlags>,
    pub(crate) thread: JoinHandle<()>,
}

/// Spawn a worker thread.
pub(crate) fn spawn(
    id: usize,
    stack_size: usize,
    shared: Arc<PoolShared>,
) -> io::Result<WorkerHandle> {
    let flags = Arc::new(WorkerFlags::new());
    let thread_flags = Arc::clone(&flags);
    let thread = thread::Builder::new()
        .name(format!("pool-worker-{id}"))
        .stack_size(stack_size)
        .spawn(move || run(id, &thread_flags, &shared))?;
    Ok(WorkerHandle { id, flags, thread })
}

/// The worker loop: dequeue, execute, repeat until shutdown or interrupt.
fn run(id: usize, flags: &WorkerFlags, shared: &PoolShared) {
    debug!(worker_id = id, "worker started");

    loop {
        let task = match shared.queue.next_task(flags) {
            Dequeued::Task(task) => task,
            Dequeued::Shutdown => break,
        };

        shared.active_tasks.fetch_add(1, Ordering::Relaxed);
        // The task boundary is the contract with the caller: a panicking
        // task must not take the worker down with it.
        let outcome = catch_unwind(AssertUnwindSafe(|| task.run()));
        shared.active_tasks.fetch_sub(1, Ordering::Relaxed);

        match outcome {
            Ok(()) => {
                shared.completed_tasks.fetch_add(1, Ordering::Relaxed);
            }
            Err(_) => {
                shared.failed_tasks.fetch_add(1, Ordering::Relaxed);
                error!(worker_id = id, "task panicked");
            }
        }

        // An interrupt posted while the task ran is honored here, before the
        // next queue wait.
        if flags.is_interrupted() {
            break;
        }
    }

    debug!(worker_id = id, "worker exiting");
}
