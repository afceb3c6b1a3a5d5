//! The single background thread behind a [`Buffered`](super::Buffered) wrapper.

use std::collections::VecDeque;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, trace};

use crate::config::OffloadConfig;
use crate::error::OffloadError;

pub(crate) type Job = Box<dyn FnOnce() + Send>;

struct Queue {
    jobs: VecDeque<Job>,
    stop: bool,
}

struct Shared {
    queue: Mutex<Queue>,
    ready: Condvar,
    capacity: usize,
}

/// A FIFO of jobs drained one at a time by a dedicated thread.
///
/// Dropping the worker stops it: the running job, if any, finishes and every
/// job still queued is discarded.
pub(crate) struct Worker {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
    name: String,
}

impl Worker {
    pub(crate) fn spawn(config: &OffloadConfig) -> Result<Self, OffloadError> {
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                jobs: VecDeque::new(),
                stop: false,
            }),
            ready: Condvar::new(),
            capacity: config.capacity,
        });

        let thread = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn({
                let shared = Arc::clone(&shared);
                move || run(&shared)
            })
            .map_err(OffloadError::Spawn)?;

        debug!(
            thread = %config.thread_name,
            capacity = config.capacity,
            "Offload worker started"
        );
        Ok(Self {
            shared,
            thread: Some(thread),
            name: config.thread_name.clone(),
        })
    }

    /// Queues `job`. Returns `false` if the queue is full and the job was dropped.
    pub(crate) fn push(&self, job: Job) -> bool {
        {
            let mut queue = self.shared.queue.lock();
            if self.shared.capacity != 0 && queue.jobs.len() >= self.shared.capacity {
                debug!(
                    thread = %self.name,
                    capacity = self.shared.capacity,
                    "Offload queue full, dropping job"
                );
                return false;
            }
            queue.jobs.push_back(job);
        }
        self.shared.ready.notify_one();
        true
    }

    pub(crate) fn queued(&self) -> usize {
        self.shared.queue.lock().jobs.len()
    }
}

fn run(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.queue.lock();
            while queue.jobs.is_empty() && !queue.stop {
                shared.ready.wait(&mut queue);
            }
            if queue.stop {
                trace!(discarded = queue.jobs.len(), "Offload worker stopping");
                return;
            }
            match queue.jobs.pop_front() {
                Some(job) => job,
                None => continue,
            }
        };
        job();
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.shared.queue.lock().stop = true;
        self.shared.ready.notify_one();
        if let Some(thread) = self.thread.take()
            && thread.join().is_err()
        {
            debug!(thread = %self.name, "Offload worker exited by panic");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::mpsc;

    fn config(capacity: usize) -> OffloadConfig {
        OffloadConfig {
            capacity,
            ..OffloadConfig::default()
        }
    }

    #[test]
    fn test_jobs_run_in_order_on_the_named_thread() {
        let worker = Worker::spawn(&OffloadConfig {
            thread_name: "offload-test".to_string(),
            ..config(0)
        })
        .unwrap();
        let (tx, rx) = mpsc::channel();
        for i in 0..5 {
            let tx = tx.clone();
            assert!(worker.push(Box::new(move || {
                let name = thread::current().name().map(str::to_string);
                tx.send((i, name)).unwrap();
            })));
        }
        let seen: Vec<_> = rx.iter().take(5).collect();
        assert_eq!(seen.iter().map(|(i, _)| *i).collect::<Vec<_>>(), vec![0, 1, 2, 3, 4]);
        assert!(seen.iter().all(|(_, name)| name.as_deref() == Some("offload-test")));
    }

    #[test]
    fn test_full_queue_drops_jobs() {
        let worker = Worker::spawn(&config(1)).unwrap();
        let started = Arc::new(Barrier::new(2));
        let release = Arc::new(Barrier::new(2));
        {
            let (started, release) = (Arc::clone(&started), Arc::clone(&release));
            assert!(worker.push(Box::new(move || {
                started.wait();
                release.wait();
            })));
        }
        started.wait();

        assert!(worker.push(Box::new(|| {})));
        assert!(!worker.push(Box::new(|| {})));
        assert_eq!(worker.queued(), 1);
        release.wait();
    }

    #[test]
    fn test_drop_waits_for_the_running_job() {
        let worker = Worker::spawn(&config(0)).unwrap();
        let started = Arc::new(Barrier::new(2));
        let (tx, rx) = mpsc::channel();
        {
            let started = Arc::clone(&started);
            worker.push(Box::new(move || {
                started.wait();
                thread::sleep(std::time::Duration::from_millis(20));
                tx.send("finished").unwrap();
            }));
        }
        started.wait();
        drop(worker);
        assert_eq!(rx.try_recv(), Ok("finished"));
    }
}
