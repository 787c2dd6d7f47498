//! The rendering worker thread: one per tile layer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use crate::cache::FileSystemTileCache;
use crate::queue::JobQueue;
use crate::renderer::TileRenderer;
use crate::theme::RenderTheme;

struct WorkerShared {
    running: AtomicBool,
    paused: Mutex<bool>,
    resumed: Condvar,
}

/// Drives one full render pipeline per job, from the shared queue into the
/// shared tile cache. Pausing takes effect between jobs; a started tile
/// always runs to completion.
///
/// The thread is stopped and joined when the worker is dropped.
pub struct MapWorker {
    queue: Arc<JobQueue>,
    shared: Arc<WorkerShared>,
    join_handle: Option<JoinHandle<()>>,
}

impl MapWorker {
    pub fn start(
        queue: Arc<JobQueue>,
        cache: Arc<FileSystemTileCache>,
        mut renderer: TileRenderer,
        theme: Arc<dyn RenderTheme>,
        on_tile_rendered: Option<Box<dyn Fn() + Send>>,
    ) -> Self {
        let shared = Arc::new(WorkerShared {
            running: AtomicBool::new(true),
            paused: Mutex::new(false),
            resumed: Condvar::new(),
        });

        let join_handle = {
            let queue = Arc::clone(&queue);
            let shared = Arc::clone(&shared);

            std::thread::spawn(move || {
                while shared.running.load(Ordering::Acquire) {
                    let Some(job) = queue.take() else {
                        break;
                    };

                    // Pausing takes effect between jobs, never mid-pipeline.
                    shared.wait_while_paused();
                    if !shared.running.load(Ordering::Acquire) {
                        break;
                    }

                    if cache.contains_key(&job) {
                        continue;
                    }

                    match renderer.execute_job(&job, &theme) {
                        Ok(bitmap) => {
                            cache.put(&job, &bitmap);
                            if let Some(on_tile_rendered) = &on_tile_rendered {
                                on_tile_rendered();
                            }
                        }
                        Err(error) => {
                            log::warn!("discarding tile {:?}: {error}", job.tile);
                        }
                    }
                }
                log::debug!("map worker is down");
            })
        };

        Self {
            queue,
            shared,
            join_handle: Some(join_handle),
        }
    }

    /// Stop taking new jobs after the current one.
    pub fn pause(&self) {
        *self.shared.lock_paused() = true;
    }

    pub fn proceed(&self) {
        *self.shared.lock_paused() = false;
        self.shared.resumed.notify_all();
    }
}

impl WorkerShared {
    fn wait_while_paused(&self) {
        let mut paused = self.lock_paused();
        while *paused && self.running.load(Ordering::Acquire) {
            paused = match self.resumed.wait(paused) {
                Ok(paused) => paused,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    fn lock_paused(&self) -> std::sync::MutexGuard<'_, bool> {
        match self.paused.lock() {
            Ok(paused) => paused,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Drop for MapWorker {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        self.queue.interrupt();
        self.shared.resumed.notify_all();

        if let Some(join_handle) = self.join_handle.take() {
            log::debug!("waiting for the map worker to exit");
            // The worker might have panicked; nothing to do in this case.
            let _ = join_handle.join();
        }
    }
}
