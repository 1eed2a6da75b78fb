//! Bounded worker pool draining a queue of resource locations.
//!
//! The coordinator owns the hand-off between one producer (the catalog) and
//! a fixed number of workers:
//!
//! - the queue is a bounded channel, so the producer waits once
//!   `queue_capacity` locations are buffered;
//! - every worker takes the next location from the shared receiver, so each
//!   location is delivered to exactly one worker;
//! - the queue closes when the producer returns (its sender is dropped) and
//!   a worker that finds it closed and empty exits;
//! - [`DownloadCoordinator::run`] awaits every worker before returning.
//!
//! A handler error or panic is logged and counted against its location only.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use catalog_fetch::download::{DownloadCoordinator, ResumableFetcher};
//! use catalog_fetch::Session;
//! use url::Url;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let session = Session::new()?;
//! let fetcher = Arc::new(ResumableFetcher::new(session, "."));
//! let coordinator = DownloadCoordinator::new(4, 5)?;
//! let stats = coordinator
//!     .run(fetcher, |mut queue| async move {
//!         queue.send(Url::parse("https://example.com/a.mov")?).await?;
//!         Ok::<(), Box<dyn std::error::Error>>(())
//!     })
//!     .await?;
//! println!("downloaded {}, skipped {}", stats.downloaded(), stats.skipped());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use futures_util::FutureExt;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{MAX_WORKERS, MIN_WORKERS};
use super::error::DownloadError;
use super::fetch::FetchOutcome;

/// Error type for coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// Invalid worker count provided.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Queue capacity of zero.
    #[error("queue capacity must be at least 1")]
    InvalidQueueCapacity,

    /// Every worker has exited, so the queue no longer accepts locations.
    #[error("location queue closed before the producer finished")]
    QueueClosed,
}

/// Work done for one location by a worker.
///
/// [`ResumableFetcher`](super::ResumableFetcher) is the production handler.
#[async_trait]
pub trait LocationHandler: Send + Sync + 'static {
    /// Processes `location` on behalf of worker number `worker`.
    async fn handle(&self, worker: usize, location: Url) -> Result<FetchOutcome, DownloadError>;
}

/// Statistics from one coordinator run.
///
/// Uses atomic counters so concurrent workers can update them.
#[derive(Debug, Default)]
pub struct DownloadStats {
    dispatched: AtomicUsize,
    downloaded: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

impl DownloadStats {
    /// Creates a new stats tracker with zero counts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of locations handed to a worker.
    #[must_use]
    pub fn dispatched(&self) -> usize {
        self.dispatched.load(Ordering::SeqCst)
    }

    /// Returns the number of files written.
    #[must_use]
    pub fn downloaded(&self) -> usize {
        self.downloaded.load(Ordering::SeqCst)
    }

    /// Returns the number of locations skipped because the file was complete.
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped.load(Ordering::SeqCst)
    }

    /// Returns the number of locations that failed.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    fn increment_dispatched(&self) {
        self.dispatched.fetch_add(1, Ordering::SeqCst);
    }

    fn record(&self, outcome: &FetchOutcome) {
        match outcome {
            FetchOutcome::Downloaded { .. } => self.downloaded.fetch_add(1, Ordering::SeqCst),
            FetchOutcome::Skipped { .. } => self.skipped.fetch_add(1, Ordering::SeqCst),
        };
    }

    fn increment_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    fn snapshot(&self) -> Self {
        Self {
            dispatched: AtomicUsize::new(self.dispatched()),
            downloaded: AtomicUsize::new(self.downloaded()),
            skipped: AtomicUsize::new(self.skipped()),
            failed: AtomicUsize::new(self.failed()),
        }
    }
}

/// Producer side of the location queue.
///
/// Dropping it closes the queue.
#[derive(Debug)]
pub struct LocationSender {
    tx: mpsc::Sender<Url>,
    sent: usize,
}

impl LocationSender {
    /// Enqueues a location, waiting while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::QueueClosed`] if no worker is left to receive it.
    pub async fn send(&mut self, location: Url) -> Result<(), CoordinatorError> {
        self.tx
            .send(location)
            .await
            .map_err(|_| CoordinatorError::QueueClosed)?;
        self.sent += 1;
        Ok(())
    }

    /// Returns how many locations have been enqueued so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent
    }
}

/// Fixed-size pool of download workers fed by a bounded queue.
#[derive(Debug, Clone)]
pub struct DownloadCoordinator {
    workers: usize,
    queue_capacity: usize,
}

impl DownloadCoordinator {
    /// Creates a coordinator with `workers` workers and a queue of `queue_capacity` locations.
    ///
    /// # Errors
    ///
    /// Returns [`CoordinatorError::InvalidWorkers`] if `workers` is outside
    /// 1-100, or [`CoordinatorError::InvalidQueueCapacity`] if the capacity is zero.
    #[instrument(level = "debug")]
    pub fn new(workers: usize, queue_capacity: usize) -> Result<Self, CoordinatorError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&workers) {
            return Err(CoordinatorError::InvalidWorkers { value: workers });
        }
        if queue_capacity == 0 {
            return Err(CoordinatorError::InvalidQueueCapacity);
        }

        Ok(Self {
            workers,
            queue_capacity,
        })
    }

    /// Returns the configured worker count.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the configured queue capacity.
    #[must_use]
    pub fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Runs `produce` against a fresh queue while the workers drain it.
    ///
    /// Returns once the producer has finished (closing the queue) and every
    /// worker has exited. Locations already queued when the producer fails are
    /// still processed before the producer's error is returned.
    ///
    /// # Errors
    ///
    /// Returns the producer's error. Individual location failures do NOT
    /// cause this method to error; they are logged and counted in stats.
    #[instrument(skip_all, fields(workers = self.workers, queue_capacity = self.queue_capacity))]
    pub async fn run<H, P, Fut, E>(
        &self,
        handler: Arc<H>,
        produce: P,
    ) -> Result<DownloadStats, E>
    where
        H: LocationHandler,
        P: FnOnce(LocationSender) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let (tx, rx) = mpsc::channel::<Url>(self.queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let stats = Arc::new(DownloadStats::new());
        let mut workers = JoinSet::new();

        for worker in 0..self.workers {
            workers.spawn(worker_loop(
                worker,
                Arc::clone(&rx),
                Arc::clone(&handler),
                Arc::clone(&stats),
            ));
        }
        debug!("workers started");

        let produced = produce(LocationSender { tx, sent: 0 }).await;
        debug!(
            producer_ok = produced.is_ok(),
            "producer finished, queue closed; waiting for workers to drain"
        );

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                warn!(error = %e, "download worker terminated abnormally");
            }
        }

        info!(
            dispatched = stats.dispatched(),
            downloaded = stats.downloaded(),
            skipped = stats.skipped(),
            failed = stats.failed(),
            "all workers finished"
        );

        produced?;

        // Every worker has been joined, so this is normally the sole owner.
        Ok(Arc::try_unwrap(stats).unwrap_or_else(|shared| shared.snapshot()))
    }
}

async fn worker_loop<H: LocationHandler>(
    worker: usize,
    rx: Arc<Mutex<mpsc::Receiver<Url>>>,
    handler: Arc<H>,
    stats: Arc<DownloadStats>,
) {
    loop {
        // The lock is released as soon as a location (or the close signal) arrives.
        let next = rx.lock().await.recv().await;
        let Some(location) = next else {
            break;
        };

        stats.increment_dispatched();
        debug!(worker, url = %location, "dequeued location");

        let attempt = AssertUnwindSafe(handler.handle(worker, location.clone()))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok(outcome)) => stats.record(&outcome),
            Ok(Err(e)) => {
                warn!(worker, url = %location, error = %e, "download failed");
                stats.increment_failed();
            }
            Err(_) => {
                warn!(worker, url = %location, "download handler panicked");
                stats.increment_failed();
            }
        }
    }

    debug!(worker, "queue drained, worker exiting");
}
