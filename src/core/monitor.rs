//! The pool monitor: a control loop that grows and shrinks the worker set.
//!
//! The monitor exists only when the pool can actually be resized
//! (`min_threads < max_threads`). It holds the worker-set mutex for its
//! entire life, releasing it only inside the per-tick timed wait, which
//! serializes grow, shrink, and pool teardown against each other.

use std::io;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::MutexGuard;
use tracing::{debug, warn};

use super::pool::PoolShared;
use super::worker::{self, WorkerHandle};

/// Sampling interval. One hysteresis step per tick.
const MONITOR_TICK: Duration = Duration::from_millis(1);

/// Load classification carried across ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResizeFlag {
    None,
    Up,
    Down,
}

/// Spawn the monitor thread.
pub(crate) fn spawn(shared: Arc<PoolShared>) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("pool-monitor".into())
        .spawn(move || run(&shared))
}

fn run(shared: &Arc<PoolShared>) {
    // Tolerances are expressed in ticks; resize only after the same
    // classification has held for the whole window, at least two ticks.
    let grow_steps = shared.grow_tolerance_ms.max(2);
    let shrink_steps = shared.shrink_tolerance_ms.max(2);

    let mut flag = ResizeFlag::None;
    let mut step_count: u64 = 0;

    debug!(grow_steps, shrink_steps, "monitor started");

    let mut workers = shared.workers.lock();
    while !shared.queue.is_closed() {
        let active = shared.active_tasks.load(Ordering::Relaxed);
        let size = shared.pool_size.load(Ordering::Relaxed);

        let step_flag = if active == size && shared.queue.len() > 0 {
            // Saturated with a backlog.
            ResizeFlag::Up
        } else if active < size / 4 {
            // At least 75% of the workers are idle.
            ResizeFlag::Down
        } else {
            ResizeFlag::None
        };

        if step_flag != flag {
            flag = step_flag;
            step_count = 0;
        } else {
            step_count += 1;
            if flag == ResizeFlag::Up && step_count == grow_steps {
                grow(shared, &mut workers);
                flag = ResizeFlag::None;
                step_count = 0;
            } else if flag == ResizeFlag::Down && step_count == shrink_steps {
                shrink(shared, &mut workers);
                flag = ResizeFlag::None;
                step_count = 0;
            }
        }

        let _ = shared
            .monitor_wakeup
            .wait_for(&mut workers, MONITOR_TICK);
    }

    debug!("monitor exiting");
}

/// Grow the pool by a factor of 1.5, capped at `max_threads`.
fn grow(shared: &Arc<PoolShared>, workers: &mut MutexGuard<'_, Vec<WorkerHandle>>) {
    let size = shared.pool_size.load(Ordering::Relaxed);
    let target = (size * 3 / 2).min(shared.max_threads);

    while shared.pool_size.load(Ordering::Relaxed) < target {
        let id = shared.next_worker_id.fetch_add(1, Ordering::Relaxed);
        match worker::spawn(id, shared.thread_stack_size, Arc::clone(shared)) {
            Ok(handle) => {
                workers.push(handle);
                shared.pool_size.fetch_add(1, Ordering::Relaxed);
            }
            Err(err) => {
                // Abort this grow step; the next sustained-load window
                // retries.
                warn!(%err, "worker spawn failed, aborting grow");
                break;
            }
        }
    }

    debug!(
        pool_size = shared.pool_size.load(Ordering::Relaxed),
        target, "pool grown"
    );
}

/// Shrink the pool by half, floored at `min_threads`, removing only idle
/// workers.
///
/// One pass over the worker set; busy workers are skipped. Falling short is
/// fine, the next idle window tries again.
fn shrink(shared: &Arc<PoolShared>, workers: &mut MutexGuard<'_, Vec<WorkerHandle>>) {
    let size = shared.pool_size.load(Ordering::Relaxed);
    // Never below one worker: a pool of zero threads could not run anything
    // that arrives later.
    let target = (size / 2).max(shared.min_threads).max(1);
    let mut to_remove = size.saturating_sub(target);

    let mut idx = 0;
    while idx < workers.len() && to_remove > 0 {
        if shared.queue.interrupt_if_idle(&workers[idx].flags) {
            let handle = workers.remove(idx);
            shared.pool_size.fetch_sub(1, Ordering::Relaxed);
            to_remove -= 1;
            debug!(worker_id = handle.id, "retiring idle worker");
            // A worker that cannot be reclaimed leaves the pool in an
            // unknown state; nothing sensible can continue from here.
            handle.thread.join().expect("worker thread panicked");
        } else {
            idx += 1;
        }
    }

    debug!(
        pool_size = shared.pool_size.load(Ordering::Relaxed),
        target, "pool shrunk"
    );
}
