//! A queued unit of work with optional schedule information.

use std::time::Instant;

/// The caller-supplied work item.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// A task plus the earliest instant it may run.
pub(crate) struct Task {
    job: Job,
    run_at: Option<Instant>,
}

impl Task {
    /// A task that is ready immediately.
    pub(crate) fn immediate(job: Job) -> Self {
        Self { job, run_at: None }
    }

    /// A task that must not start before `run_at`.
    pub(crate) fn scheduled(job: Job, run_at: Instant) -> Self {
        Self {
            job,
            run_at: Some(run_at),
        }
    }

    /// Whether the task may be executed now.
    pub(crate) fn is_due(&self) -> bool {
        self.run_at.map_or(true, |at| at <= Instant::now())
    }

    /// Execute the task body, consuming the task.
    pub(crate) fn run(self) {
        (self.job)();
    }
}
