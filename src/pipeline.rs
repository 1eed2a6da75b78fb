//! One run: sign in, enumerate the catalog into the worker pool, wait for it to drain.
//!
//! This is the only layer that decides what is fatal. Configuration, sign-in
//! and catalog errors end the run; per-location failures are already absorbed
//! by the coordinator and only show up in the returned [`DownloadStats`].

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use crate::auth::{AuthError, sign_in};
use crate::catalog::{CatalogError, CatalogLister};
use crate::config::RunConfig;
use crate::download::{CoordinatorError, DownloadCoordinator, DownloadStats, ResumableFetcher};
use crate::session::{Session, SessionError};

/// Errors that end a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Worker pool settings were rejected.
    #[error("invalid worker pool configuration: {0}")]
    Coordinator(#[from] CoordinatorError),

    /// The HTTP session could not be created.
    #[error("failed to create HTTP session: {0}")]
    Session(#[from] SessionError),

    /// Signing in failed.
    #[error("sign-in failed: {0}")]
    Auth(#[from] AuthError),

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// The directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog could not be enumerated.
    #[error("catalog enumeration failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Runs one authenticate → discover → download cycle.
///
/// # Errors
///
/// Returns [`PipelineError`] for anything that prevents the run as a whole.
/// Individual download failures are logged and counted, not returned.
#[instrument(skip_all, fields(workers = config.workers, output_dir = %config.output_dir.display()))]
pub async fn run(config: &RunConfig) -> Result<DownloadStats, PipelineError> {
    let coordinator = DownloadCoordinator::new(config.workers, config.queue_capacity)?;
    let session = Session::with_timeouts(config.connect_timeout, config.request_timeout)?;

    sign_in(&session, &config.site, &config.credentials).await?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| PipelineError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

    let fetcher = Arc::new(ResumableFetcher::new(
        session.clone(),
        config.output_dir.clone(),
    ));
    let lister = CatalogLister::new(config.site.clone());

    let stats = coordinator
        .run(fetcher, |mut queue| async move {
            for location in lister.list(&session).await? {
                queue.send(location).await?;
            }
            debug!(enqueued = queue.sent(), "catalog fully enqueued");
            Ok::<(), PipelineError>(())
        })
        .await?;

    Ok(stats)
}
