//! Bounded pool for disconnect work.
//!
//! Jobs start immediately as tasks but wait on a semaphore, so at most
//! `max_concurrent` run at once and a slow job never blocks the caller.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::{oneshot, Semaphore};

/// A unique identifier for a pooled job.
pub type JobId = usize;

/// Handle to a job running in the pool.
#[derive(Debug)]
pub struct PooledJob<T> {
    /// Unique ID for this job.
    pub id: JobId,

    result_rx: oneshot::Receiver<T>,
}

impl<T> PooledJob<T> {
    /// Wait for the job to finish and get its output.
    pub async fn wait(self) -> Result<T> {
        self.result_rx
            .await
            .context("Pooled job was dropped before completion")
    }
}

/// Concurrency-limited task pool.
pub struct WorkerPool {
    /// Semaphore for limiting concurrency.
    semaphore: Arc<Semaphore>,

    /// Counter for generating unique job IDs.
    next_id: AtomicUsize,
}

impl WorkerPool {
    /// Create a new pool with the given concurrency limit.
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            next_id: AtomicUsize::new(0),
        }
    }

    /// Spawn a job in the pool.
    ///
    /// Returns at once; the job waits for a free slot on its own task.
    /// Dropping the handle does not cancel the job.
    pub fn spawn<F, T>(&self, job: F) -> PooledJob<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let semaphore = self.semaphore.clone();
        let (result_tx, result_rx) = oneshot::channel();

        tokio::spawn(async move {
            // Acquire semaphore permit (waits if at capacity)
            let _permit = semaphore.acquire_owned().await;
            let output = job.await;
            let _ = result_tx.send(output);
        });

        PooledJob { id, result_rx }
    }

    /// Get the number of available slots in the pool.
    pub fn available_permits(&self) -> usize {
        self.semaphore.available_permits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_pool_basic() {
        let pool = WorkerPool::new(2);
        let job = pool.spawn(async { 40 + 2 });
        assert_eq!(job.wait().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_pool_unique_ids() {
        let pool = WorkerPool::new(2);
        let a = pool.spawn(async {});
        let b = pool.spawn(async {});
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_pool_concurrency_limit() {
        let pool = WorkerPool::new(2);
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let jobs: Vec<_> = (0..6)
            .map(|_| {
                let running = running.clone();
                let peak = peak.clone();
                pool.spawn(async move {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    running.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        for job in jobs {
            job.wait().await.unwrap();
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
        assert_eq!(pool.available_permits(), 2);
    }

    #[tokio::test]
    async fn test_dropped_handle_still_runs() {
        let pool = WorkerPool::new(1);
        let (tx, rx) = oneshot::channel();
        drop(pool.spawn(async move {
            let _ = tx.send(());
        }));
        rx.await.unwrap();
    }
}
