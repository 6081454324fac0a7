//! Bounded worker pool for file-level I/O

use sfkit_types::{ConcurrencyLimit, Error, Result};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

/// Runs jobs concurrently with at most `limit` in flight.
///
/// Each job holds one semaphore permit for its whole lifetime, which also caps
/// the number of simultaneously open file descriptors. There is no
/// cancellation: once a job fails, no further jobs are started, the jobs
/// already in flight run to completion, and the first error is returned.
#[derive(Debug, Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    limit: usize,
}

impl WorkerPool {
    /// Create a pool allowing `limit` concurrent jobs
    pub fn new(limit: ConcurrencyLimit) -> Self {
        let limit = limit.get();
        Self {
            semaphore: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Maximum number of concurrent jobs
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// A pool with the same limit and its own permits
    pub fn sibling(&self) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(self.limit)),
            limit: self.limit,
        }
    }

    /// Number of permits currently free
    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    /// Run `job` over every item, returning the outputs in completion order.
    pub async fn run<I, F, Fut, T>(&self, items: I, job: F) -> Result<Vec<T>>
    where
        I: IntoIterator,
        F: Fn(I::Item) -> Fut,
        Fut: Future<Output = Result<T>> + Send + 'static,
        T: Send + 'static,
    {
        let mut set = JoinSet::new();
        let mut outputs = Vec::new();
        let mut first_error: Option<Error> = None;

        for item in items {
            Self::reap_finished(&mut set, &mut outputs, &mut first_error);
            if first_error.is_some() {
                break;
            }

            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| Error::worker(format!("Failed to acquire worker permit: {}", e)))?;

            // A job may have failed while we waited for the permit
            Self::reap_finished(&mut set, &mut outputs, &mut first_error);
            if first_error.is_some() {
                drop(permit);
                break;
            }

            let fut = job(item);
            set.spawn(async move {
                let result = fut.await;
                drop(permit);
                result
            });
        }

        if first_error.is_some() {
            debug!("Worker pool draining {} in-flight jobs after failure", set.len());
        }

        while let Some(joined) = set.join_next().await {
            Self::record(joined, &mut outputs, &mut first_error);
        }

        match first_error {
            Some(error) => Err(error),
            None => Ok(outputs),
        }
    }

    fn reap_finished<T: 'static>(
        set: &mut JoinSet<Result<T>>,
        outputs: &mut Vec<T>,
        first_error: &mut Option<Error>,
    ) {
        while let Some(joined) = set.try_join_next() {
            Self::record(joined, outputs, first_error);
        }
    }

    fn record<T>(
        joined: std::result::Result<Result<T>, JoinError>,
        outputs: &mut Vec<T>,
        first_error: &mut Option<Error>,
    ) {
        let result = joined.unwrap_or_else(|e| Err(Error::worker(format!("Job panicked: {}", e))));
        match result {
            Ok(output) => outputs.push(output),
            Err(error) => {
                if first_error.is_none() {
                    *first_error = Some(error);
                } else {
                    warn!("Suppressed error from concurrent job: {}", error);
                }
            }
        }
    }
}

impl Default for WorkerPool {
    fn default() -> Self {
        Self::new(ConcurrencyLimit::default())
    }
}
