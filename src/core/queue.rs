//! FIFO task queue with blocking consumer wait.
//!
//! The queue mutex is the synchronization hub of the pool: it protects the
//! pending tasks, the observation of the stop flag, and every worker's
//! [`WorkerFlags`](super::worker::WorkerFlags). Submission notifies exactly
//! one waiter; stop, drain, and interrupts broadcast.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use super::task::Task;
use super::worker::WorkerFlags;

/// How long a worker naps after re-queueing a task that is not yet due.
const NOT_DUE_RETRY: Duration = Duration::from_millis(2);

/// Outcome of a blocking dequeue.
pub(crate) enum Dequeued {
    /// A task ready to execute.
    Task(Task),
    /// The pool is stopping, or this worker was told to exit.
    Shutdown,
}

/// FIFO queue of pending tasks, coupled with the pool-wide stop flag.
pub(crate) struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
    /// Signaled on submission (one waiter) and on stop, drain, and
    /// interrupts (all waiters).
    available: Condvar,
    /// Monotonic, false to true once. Always observed with `tasks` locked
    /// inside wait predicates.
    stopped: AtomicBool,
}

impl TaskQueue {
    pub(crate) fn new() -> Self {
        Self {
            tasks: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stopped: AtomicBool::new(false),
        }
    }

    /// Append a task and wake one waiting worker.
    ///
    /// After [`close`](Self::close) the task is dropped silently: submitters
    /// race against teardown by design and have no way to handle the refusal.
    /// Returns whether the task was accepted.
    pub(crate) fn push(&self, task: Task) -> bool {
        let mut tasks = self.tasks.lock();
        if self.stopped.load(Ordering::Acquire) {
            debug!("task submitted after shutdown, dropping");
            return false;
        }
        tasks.push_back(task);
        // One task feeds one worker; waking more would only stampede.
        self.available.notify_one();
        true
    }

    /// Block until a task is ready, the pool stops, or `flags` is
    /// interrupted.
    ///
    /// The busy flag is lowered only for the duration of the empty-queue
    /// wait, and raised again before the mutex is released, so the monitor
    /// can never mistake a just-woken worker for an idle one.
    ///
    /// A dequeued task that is not yet due goes back to the queue tail,
    /// followed by a short timed wait to keep a deferred-only queue from
    /// spinning the CPU.
    pub(crate) fn next_task(&self, flags: &WorkerFlags) -> Dequeued {
        let mut tasks = self.tasks.lock();
        loop {
            if flags.is_interrupted() {
                return Dequeued::Shutdown;
            }

            while tasks.is_empty() {
                if self.stopped.load(Ordering::Acquire) {
                    return Dequeued::Shutdown;
                }
                flags.set_busy(false);
                self.available.wait(&mut tasks);
                flags.set_busy(true);
                if flags.is_interrupted() {
                    return Dequeued::Shutdown;
                }
            }

            let Some(task) = tasks.pop_front() else {
                continue;
            };

            if !task.is_due() {
                tasks.push_back(task);
                let _ = self.available.wait_for(&mut tasks, NOT_DUE_RETRY);
                continue;
            }

            return Dequeued::Task(task);
        }
    }

    /// Stop the queue, optionally discarding pending tasks, and wake every
    /// waiter.
    ///
    /// When pending tasks are kept, workers continue to drain the queue and
    /// only observe shutdown once it is empty.
    pub(crate) fn close(&self, discard_pending: bool) {
        let mut tasks = self.tasks.lock();
        self.stopped.store(true, Ordering::Release);
        if discard_pending {
            let dropped = tasks.len();
            tasks.clear();
            if dropped > 0 {
                debug!(dropped, "discarded pending tasks on shutdown");
            }
        }
        self.available.notify_all();
    }

    /// Whether [`close`](Self::close) has been called.
    pub(crate) fn is_closed(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Number of pending tasks.
    pub(crate) fn len(&self) -> usize {
        self.tasks.lock().len()
    }

    /// Tell the worker behind `flags` to exit, but only if it is idle.
    ///
    /// Holding the queue mutex across the busy check pins the worker inside
    /// its wait: it cannot slip out and pick up a task between the check and
    /// the interrupt. Returns whether the interrupt was posted.
    pub(crate) fn interrupt_if_idle(&self, flags: &WorkerFlags) -> bool {
        let _tasks = self.tasks.lock();
        if flags.is_busy() {
            return false;
        }
        flags.set_interrupted();
        // Broadcast, not notify_one: the dying worker may have absorbed a
        // submission signal, and the other idle workers must re-check the
        // queue on its behalf.
        self.available.notify_all();
        true
    }

    /// Tell the worker behind `flags` to exit regardless of its state.
    ///
    /// Used during teardown. A busy worker finishes its current task first;
    /// interrupts are never delivered mid-execution.
    pub(crate) fn interrupt(&self, flags: &WorkerFlags) {
        let _tasks = self.tasks.lock();
        flags.set_interrupted();
        self.available.notify_all();
    }
}
