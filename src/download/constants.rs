//! Constants for the download module (timeouts, pool sizing).

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (1 hour; screencast files are large).
pub const READ_TIMEOUT_SECS: u64 = 3600;

/// Minimum allowed worker count.
pub const MIN_WORKERS: usize = 1;

/// Maximum allowed worker count.
pub const MAX_WORKERS: usize = 100;

/// Default capacity of the location queue between the catalog and the workers.
pub const DEFAULT_QUEUE_CAPACITY: usize = 5;

/// Default worker count: one per available processing unit, clamped to the valid range.
#[must_use]
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map_or(MIN_WORKERS, std::num::NonZeroUsize::get)
        .clamp(MIN_WORKERS, MAX_WORKERS)
}
