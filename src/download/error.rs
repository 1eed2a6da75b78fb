//! Error types for the download module.
//!
//! Every variant is recoverable at the granularity of one location: the
//! coordinator logs it and the worker moves on to its next location.

use std::path::PathBuf;

use thiserror::Error;

use crate::session::SessionError;

/// Errors that can occur while fetching one resource.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The GET never produced a response (connection error, timeout).
    #[error(transparent)]
    Transport(#[from] SessionError),

    /// HTTP error response (4xx client errors, 5xx server errors).
    #[error("HTTP {status} downloading {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The body stream broke off after the response headers arrived.
    #[error("network error streaming {url}: {source}")]
    Stream {
        /// The URL being streamed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// The resolved URL has no path segment to name the file after.
    #[error("cannot derive a filename from {url}")]
    NoFilename {
        /// The resolved URL.
        url: String,
    },

    /// A local file exists but the server did not declare a usable size, so
    /// completeness cannot be judged.
    #[error("{path} exists and the remote size is unknown; skipping")]
    UnknownRemoteSize {
        /// The existing local file.
        path: PathBuf,
    },

    /// File system error during download (stat, create file, write, etc.)
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}

impl DownloadError {
    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
        }
    }

    /// Creates a body streaming error.
    pub fn stream(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Stream {
            url: url.into(),
            source,
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
