//! A bounded queue feeding tile jobs to the rendering workers.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::renderer::RendererJob;

const DEFAULT_CAPACITY: usize = 128;

#[derive(Default)]
struct QueueState {
    jobs: VecDeque<RendererJob>,
    interrupted: bool,
}

/// FIFO of pending render jobs, filled by the UI layer as the visible
/// region changes and drained by the workers. Duplicates of a job already
/// waiting are dropped, as is everything beyond the capacity.
pub struct JobQueue {
    state: Mutex<QueueState>,
    job_available: Condvar,
    capacity: usize,
}

impl Default for JobQueue {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl JobQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            job_available: Condvar::new(),
            capacity,
        }
    }

    /// Enqueue a job. Returns `false` when the queue is full or already
    /// holds an equal job.
    pub fn add(&self, job: RendererJob) -> bool {
        let mut state = self.lock();
        if state.jobs.len() >= self.capacity {
            log::debug!("job queue is full, dropping {:?}", job.tile);
            return false;
        }
        if state.jobs.contains(&job) {
            return false;
        }

        state.jobs.push_back(job);
        self.job_available.notify_one();
        true
    }

    /// Block until a job arrives. Returns `None` once the queue has been
    /// interrupted and drained.
    pub fn take(&self) -> Option<RendererJob> {
        let mut state = self.lock();
        loop {
            if let Some(job) = state.jobs.pop_front() {
                return Some(job);
            }
            if state.interrupted {
                return None;
            }
            state = match self.job_available.wait(state) {
                Ok(state) => state,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Make all pending and future `take` calls return `None` once the
    /// remaining jobs are drained.
    pub fn interrupt(&self) {
        self.lock().interrupted = true;
        self.job_available.notify_all();
    }

    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().jobs.is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
