//! Semaphore-bounded worker pools.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Bounds how many units of work of one kind run at once.
///
/// Work runs on the shared tokio runtime; the pool only gates admission.
/// A permit is held for the duration of one unit and never across a wait
/// on work admitted by the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    name: Arc<str>,
    size: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(name: &str, size: usize) -> Self {
        let size = size.max(1);
        Self {
            name: Arc::from(name),
            size,
            permits: Arc::new(Semaphore::new(size)),
        }
    }

    /// Four workers per available CPU.
    pub fn default_size() -> usize {
        std::thread::available_parallelism().map_or(4, NonZeroUsize::get) * 4
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Permits currently free.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Run `work` once a permit is free.
    pub async fn run<F: Future>(&self, work: F) -> F::Output {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = self.permits.acquire().await.ok();
        work.await
    }

    /// Spawn `work` onto the runtime; it starts once a permit is free.
    pub fn spawn<F>(&self, work: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            work.await
        })
    }
}
