//! Per-location fetch: skip complete files, restart stale ones, stream the rest.
//!
//! This is deliberately not a byte-range resume. An existing file is either
//! exactly the declared size (skip) or rewritten from scratch. A body that
//! breaks off mid-stream leaves its partial file behind, and the next run
//! notices the size mismatch and restarts it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, HeaderMap};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::coordinator::LocationHandler;
use super::error::DownloadError;
use super::filename::target_filename;
use crate::session::Session;

/// Sizes known during one fetch attempt. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TransferState {
    /// Size of the existing local file, `None` when there is no file.
    pub(crate) local_size: Option<u64>,
    /// Size declared by the server, `None` when absent or unparseable.
    pub(crate) remote_size: Option<u64>,
    /// Bytes written to disk by this attempt.
    pub(crate) bytes_written: u64,
}

/// What to do with a location once its sizes are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TransferPlan {
    /// No local file: download it.
    Fresh,
    /// Local file matches the declared size: leave it alone.
    Skip,
    /// Local file has the wrong size: truncate and download again.
    Restart,
    /// Local file exists but the remote size is unknown: give up on this location.
    UnknownRemote,
}

impl TransferState {
    /// Decides the plan for this attempt.
    #[must_use]
    pub(crate) fn plan(&self) -> TransferPlan {
        match (self.local_size, self.remote_size) {
            (None, _) => TransferPlan::Fresh,
            (Some(_), None) => TransferPlan::UnknownRemote,
            (Some(local), Some(remote)) if local == remote => TransferPlan::Skip,
            (Some(_), Some(_)) => TransferPlan::Restart,
        }
    }
}

/// Result of a fetch that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The body was written to `path`.
    Downloaded {
        /// Target file.
        path: PathBuf,
        /// Bytes written.
        bytes: u64,
        /// Whether an existing file of the wrong size was overwritten.
        restarted: bool,
    },
    /// The local file already had the declared size; nothing was written.
    Skipped {
        /// Target file.
        path: PathBuf,
        /// Its size.
        bytes: u64,
    },
}

/// Parses the declared body size from `Content-Length`.
#[must_use]
pub(crate) fn declared_size(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

/// Fetches locations into an output directory over a shared session.
#[derive(Debug, Clone)]
pub struct ResumableFetcher {
    session: Session,
    output_dir: PathBuf,
}

impl ResumableFetcher {
    /// Creates a fetcher writing into `output_dir`.
    #[must_use]
    pub fn new(session: Session, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            session,
            output_dir: output_dir.into(),
        }
    }

    /// Fetches one location.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] if the request fails, the server answers with
    /// a non-success status, no filename can be derived, an existing file
    /// cannot be judged because the remote size is unknown, or the file
    /// cannot be written. Nothing on disk is touched unless the response was
    /// a success.
    #[instrument(skip(self, location), fields(url = %location))]
    pub async fn fetch(&self, location: &Url) -> Result<FetchOutcome, DownloadError> {
        info!("trying");

        let response = self.session.get(location).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(location.as_str(), status.as_u16()));
        }

        // Servers redirect to a canonical download path; name the file after that.
        let resolved = response.url().clone();
        let filename = target_filename(&resolved).ok_or_else(|| DownloadError::NoFilename {
            url: resolved.to_string(),
        })?;
        let path = self.output_dir.join(&filename);

        let mut state = TransferState {
            local_size: local_size(&path).await?,
            remote_size: declared_size(response.headers()),
            bytes_written: 0,
        };
        debug!(
            path = %path.display(),
            resolved = %resolved,
            local_size = ?state.local_size,
            remote_size = ?state.remote_size,
            "resolved download target"
        );

        let restarted = match state.plan() {
            TransferPlan::Fresh => false,
            TransferPlan::Skip => {
                info!(path = %path.display(), "already fully downloaded, skipping");
                return Ok(FetchOutcome::Skipped {
                    bytes: state.local_size.unwrap_or_default(),
                    path,
                });
            }
            TransferPlan::UnknownRemote => {
                return Err(DownloadError::UnknownRemoteSize { path });
            }
            TransferPlan::Restart => {
                info!(
                    path = %path.display(),
                    local = state.local_size.unwrap_or_default(),
                    remote = state.remote_size.unwrap_or_default(),
                    "partially downloaded, restarting"
                );
                true
            }
        };

        let mut file = File::create(&path)
            .await
            .map_err(|e| DownloadError::io(path.clone(), e))?;

        info!(path = %path.display(), "started writing");
        state.bytes_written = stream_to_file(&mut file, response, location, &path).await?;

        if let Some(expected) = state.remote_size
            && expected != state.bytes_written
        {
            warn!(
                path = %path.display(),
                expected,
                written = state.bytes_written,
                "written size differs from declared size"
            );
        }

        info!(path = %path.display(), bytes = state.bytes_written, "download complete");

        Ok(FetchOutcome::Downloaded {
            path,
            bytes: state.bytes_written,
            restarted,
        })
    }
}

#[async_trait]
impl LocationHandler for ResumableFetcher {
    async fn handle(&self, _worker: usize, location: Url) -> Result<FetchOutcome, DownloadError> {
        self.fetch(&location).await
    }
}

async fn local_size(path: &Path) -> Result<Option<u64>, DownloadError> {
    match tokio::fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DownloadError::io(path, e)),
    }
}

/// Streams response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &Url,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::stream(url.as_str(), e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
mod tests {
    use reqwest::header::HeaderValue;

    use super::*;

    fn state(local: Option<u64>, remote: Option<u64>) -> TransferState {
        TransferState {
            local_size: local,
            remote_size: remote,
            bytes_written: 0,
        }
    }

    #[test]
    fn test_plan_fresh_without_local_file() {
        assert_eq!(state(None, Some(100)).plan(), TransferPlan::Fresh);
        assert_eq!(state(None, None).plan(), TransferPlan::Fresh);
    }

    #[test]
    fn test_plan_skip_when_sizes_match() {
        assert_eq!(state(Some(100), Some(100)).plan(), TransferPlan::Skip);
    }

    #[test]
    fn test_plan_zero_byte_file_is_complete() {
        assert_eq!(state(Some(0), Some(0)).plan(), TransferPlan::Skip);
    }

    #[test]
    fn test_plan_restart_when_sizes_differ() {
        assert_eq!(state(Some(40), Some(100)).plan(), TransferPlan::Restart);
        assert_eq!(state(Some(120), Some(100)).plan(), TransferPlan::Restart);
    }

    #[test]
    fn test_plan_unknown_remote_with_local_file() {
        assert_eq!(state(Some(40), None).plan(), TransferPlan::UnknownRemote);
    }

    #[test]
    fn test_declared_size_parses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("1048576"));
        assert_eq!(declared_size(&headers), Some(1_048_576));
    }

    #[test]
    fn test_declared_size_missing_header() {
        assert_eq!(declared_size(&HeaderMap::new()), None);
    }

    #[test]
    fn test_declared_size_unparseable_header() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("lots"));
        assert_eq!(declared_size(&headers), None);

        headers.insert(CONTENT_LENGTH, HeaderValue::from_static("-5"));
        assert_eq!(declared_size(&headers), None);
    }
}
