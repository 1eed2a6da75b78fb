//! Catalog Fetch Library
//!
//! Signs in to a site, scrapes its catalog page for downloadable items and
//! fetches every item into a local directory with a pool of workers. Files
//! that are already complete are skipped, so an interrupted run is finished
//! by simply running again.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//! - [`session`] - HTTP client with a shared cookie jar
//! - [`auth`] - Form-based sign-in
//! - [`catalog`] - Catalog page scraping
//! - [`download`] - Worker pool and per-location resumable fetch
//! - [`pipeline`] - One complete run, deciding which errors are fatal
//! - [`config`] - Site layout and run settings

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod catalog;
pub mod config;
pub mod download;
pub mod pipeline;
pub mod session;
mod user_agent;

// Re-export commonly used types
pub use auth::{AuthError, sign_in};
pub use catalog::{CatalogError, CatalogLister};
pub use config::{ConfigError, Credentials, RunConfig, SiteConfig};
pub use download::{
    CoordinatorError, DownloadCoordinator, DownloadError, DownloadStats, FetchOutcome,
    LocationHandler, ResumableFetcher, target_filename,
};
pub use pipeline::{PipelineError, run};
pub use session::{Session, SessionError};
