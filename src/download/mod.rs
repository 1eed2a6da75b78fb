//! Concurrent download pipeline.
//!
//! Locations flow from a producer into a bounded queue, a fixed pool of
//! workers drains it, and each worker fetches its location into a file named
//! after the resolved URL.
//!
//! # Features
//!
//! - Bounded queue with backpressure on the producer
//! - Each location dispatched to exactly one worker
//! - Size-based skip of complete files, full restart of stale ones
//! - Streaming downloads (memory-efficient for large files)
//! - Per-location failures logged and counted, never fatal to the run

pub mod constants;
mod coordinator;
mod error;
mod fetch;
mod filename;

pub use coordinator::{
    CoordinatorError, DownloadCoordinator, DownloadStats, LocationHandler, LocationSender,
};
pub use error::DownloadError;
pub use fetch::{FetchOutcome, ResumableFetcher};
pub use filename::target_filename;
