//! Run many independent operations under a concurrency cap.
//!
//! In-flight operations are polled on the caller's task through
//! [`FuturesUnordered`]; nothing is spawned. Results are reported in
//! completion order and failures keep the index of their input.

use std::future::Future;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tracing::debug;

use crate::core::AmegoError;

pub const DEFAULT_CONCURRENCY: usize = 5;

/// Snapshot passed to the progress callback after each completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchProgress {
    pub total: usize,
    pub completed: usize,
    pub successful: usize,
    pub failed: usize,
    /// Identifier of the item that just finished.
    pub current: Option<String>,
}

type ProgressCallback = Box<dyn Fn(&BatchProgress) + Send + Sync>;

/// Batch settings.
pub struct BatchConfig {
    /// Maximum operations in flight; `0` is treated as `1`.
    pub concurrency: usize,
    /// Stop starting new items after the first failure.
    pub stop_on_error: bool,
    pub on_progress: Option<ProgressCallback>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            stop_on_error: false,
            on_progress: None,
        }
    }
}

impl std::fmt::Debug for BatchConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchConfig")
            .field("concurrency", &self.concurrency)
            .field("stop_on_error", &self.stop_on_error)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl BatchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn stop_on_error(mut self, stop: bool) -> Self {
        self.stop_on_error = stop;
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(&BatchProgress) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(callback));
        self
    }
}

/// A failed item with its input and position in the original list.
#[derive(Debug)]
pub struct BatchFailure<I> {
    pub index: usize,
    pub input: I,
    pub error: AmegoError,
}

/// Outcome of a batch run.
#[derive(Debug)]
pub struct BatchResult<I, T> {
    /// Successful outputs in completion order.
    pub success: Vec<T>,
    /// Failures in completion order.
    pub failed: Vec<BatchFailure<I>>,
    /// Number of input items.
    pub total: usize,
}

impl<I, T> BatchResult<I, T> {
    /// Items that ran to completion, successfully or not.
    pub fn processed(&self) -> usize {
        self.success.len() + self.failed.len()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty() && self.success.len() == self.total
    }
}

/// Executes batches according to a [`BatchConfig`].
#[derive(Debug, Default)]
pub struct BatchExecutor {
    config: BatchConfig,
}

impl BatchExecutor {
    pub fn new(config: BatchConfig) -> Self {
        Self { config }
    }

    /// Run `operation` once per item.
    ///
    /// `item_id` labels items in progress reports. A failure never cancels
    /// items already in flight.
    pub async fn run<I, T, F, Fut, K>(
        &self,
        items: Vec<I>,
        operation: F,
        item_id: K,
    ) -> BatchResult<I, T>
    where
        I: Clone,
        F: Fn(I) -> Fut,
        Fut: Future<Output = Result<T, AmegoError>>,
        K: Fn(&I) -> String,
    {
        let total = items.len();
        let limit = self.config.concurrency.max(1);
        let mut pending = items.into_iter().enumerate();
        let mut in_flight = FuturesUnordered::new();
        let mut result = BatchResult {
            success: Vec::with_capacity(total),
            failed: Vec::new(),
            total,
        };
        let mut stopped = false;

        loop {
            while !stopped && in_flight.len() < limit {
                let Some((index, item)) = pending.next() else {
                    break;
                };
                let id = item_id(&item);
                let fut = operation(item.clone());
                in_flight.push(async move { (index, item, id, fut.await) });
            }

            let Some((index, item, id, outcome)) = in_flight.next().await else {
                break;
            };

            match outcome {
                Ok(output) => result.success.push(output),
                Err(error) => {
                    debug!(index, item = %id, error = %error, "Batch item failed");
                    result.failed.push(BatchFailure {
                        index,
                        input: item,
                        error,
                    });
                    if self.config.stop_on_error && !stopped {
                        debug!(index, "Stopping batch after first failure");
                        stopped = true;
                    }
                }
            }

            if let Some(callback) = &self.config.on_progress {
                callback(&BatchProgress {
                    total,
                    completed: result.processed(),
                    successful: result.success.len(),
                    failed: result.failed.len(),
                    current: Some(id),
                });
            }
        }

        result
    }
}
