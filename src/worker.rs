//! Background filter recomputation.
//!
//! The worker holds at most one pending job. Submitting while a job is pending
//! replaces it, and a result whose job was superseded mid-computation is
//! dropped, so only the latest request ever reaches the session. Every job
//! carries the session's generation counter; the session ignores results from
//! older generations (image switched or reset while computing).

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use futures::StreamExt;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::{Condvar, Mutex};

use crate::filter::{self, FilterState};
use crate::raster::{Raster, SourceImage};

/// A finished recompute
#[derive(Debug)]
pub struct FilterOutcome {
    pub generation: u64,
    pub state: FilterState,
    pub raster: Raster,
}

struct Job {
    generation: u64,
    source: SourceImage,
    state: FilterState,
}

#[derive(Default)]
struct Slot {
    pending: Option<Job>,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    slot: Mutex<Slot>,
    wake: Condvar,
}

/// Owns the filter thread. Dropping the worker stops the thread.
pub struct FilterWorker {
    shared: Arc<Shared>,
    results: UnboundedReceiver<FilterOutcome>,
    handle: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for FilterWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterWorker")
            .field("has_pending", &self.shared.slot.lock().pending.is_some())
            .finish()
    }
}

impl FilterWorker {
    pub fn spawn() -> std::io::Result<Self> {
        let shared = Arc::new(Shared::default());
        let (sender, results) = mpsc::unbounded();

        let thread_shared = Arc::clone(&shared);
        let handle = thread::Builder::new()
            .name("filter-worker".to_owned())
            .spawn(move || run(thread_shared, sender))?;

        Ok(Self {
            shared,
            results,
            handle: Some(handle),
        })
    }

    /// Queues a recompute, replacing any job that hasn't started yet.
    pub fn submit(&self, generation: u64, source: SourceImage, state: FilterState) {
        let mut slot = self.shared.slot.lock();
        if let Some(stale) = slot.pending.replace(Job {
            generation,
            source,
            state,
        }) {
            log::debug!("Filter job {} superseded by {}", stale.generation, generation);
        }
        self.shared.wake.notify_one();
    }

    /// Drops the pending job, if any. A job already running still completes.
    pub fn cancel_pending(&self) {
        self.shared.slot.lock().pending = None;
    }

    /// Returns a finished result without blocking
    pub fn try_recv(&mut self) -> Option<FilterOutcome> {
        match self.results.try_next() {
            Ok(outcome) => outcome,
            Err(_) => None,
        }
    }

    /// Blocks until the next result arrives. `None` if the thread has stopped.
    pub fn recv_blocking(&mut self) -> Option<FilterOutcome> {
        futures::executor::block_on(self.results.next())
    }
}

impl Drop for FilterWorker {
    fn drop(&mut self) {
        {
            let mut slot = self.shared.slot.lock();
            slot.shutdown = true;
            slot.pending = None;
        }
        self.shared.wake.notify_all();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Filter worker panicked");
            }
        }
    }
}

fn run(shared: Arc<Shared>, sender: UnboundedSender<FilterOutcome>) {
    log::debug!("Filter worker started");
    loop {
        let job = {
            let mut slot = shared.slot.lock();
            loop {
                if slot.shutdown {
                    log::debug!("Filter worker stopping");
                    return;
                }
                if let Some(job) = slot.pending.take() {
                    break job;
                }
                shared.wake.wait(&mut slot);
            }
        };

        let raster = filter::apply(&job.source, &job.state);

        if shared.slot.lock().pending.is_some() {
            log::debug!("Discarding filter result {}: newer request pending", job.generation);
            continue;
        }
        let outcome = FilterOutcome {
            generation: job.generation,
            state: job.state,
            raster,
        };
        if sender.unbounded_send(outcome).is_err() {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_delivers_latest_generation() {
        let mut worker = FilterWorker::spawn().unwrap();
        let source: SourceImage = Arc::new(Raster::filled(16, 16, [100, 100, 100, 255]));

        for generation in 1..=5u64 {
            let state = FilterState::NEUTRAL.with_brightness(100 + generation as u8 * 10);
            worker.submit(generation, Arc::clone(&source), state);
        }

        // Earlier generations may or may not arrive, but the last one always does.
        let mut last = None;
        while last.as_ref().map(|o: &FilterOutcome| o.generation) != Some(5) {
            last = worker.recv_blocking();
            assert!(last.is_some());
        }
        let outcome = last.unwrap();
        assert_eq!(outcome.raster.pixel(0, 0), Some([150, 150, 150, 255]));
    }

    #[test]
    fn test_drop_stops_idle_worker() {
        let worker = FilterWorker::spawn().unwrap();
        drop(worker);
    }
}
