//! Run configuration: which site to talk to and how to run the pool.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::download::constants::{
    CONNECT_TIMEOUT_SECS, DEFAULT_QUEUE_CAPACITY, READ_TIMEOUT_SECS, default_workers,
};

/// Default site the tool signs in to.
pub const DEFAULT_BASE_URL: &str = "https://www.destroyallsoftware.com";

/// Errors produced while assembling site URLs.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configured URL or path could not be parsed or joined.
    #[error("invalid URL {value}: {source}")]
    InvalidUrl {
        /// The offending URL text.
        value: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },
}

/// Where the site keeps its sign-in form and catalog, and how to recognise them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteConfig {
    /// Scheme and host every path below is joined onto.
    pub base_url: Url,
    /// Path of the page holding the sign-in form; the form is posted back here.
    pub sign_in_path: String,
    /// Path of the catalog page listing every item.
    pub catalog_path: String,
    /// Only catalog links whose `href` starts with this prefix are items.
    pub link_prefix: String,
    /// Appended to an item link to reach its download endpoint.
    pub download_suffix: String,
    /// Form field that receives the account identifier.
    pub account_field: String,
    /// Form field that receives the credential.
    pub credential_field: String,
    /// Text the sign-in response must contain for the login to count.
    pub confirmation_phrase: String,
}

impl Default for SiteConfig {
    #[allow(clippy::expect_used)]
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_BASE_URL).expect("default base URL is a valid literal"),
            sign_in_path: "/screencasts/users/sign_in".to_string(),
            catalog_path: "/screencasts/catalog".to_string(),
            link_prefix: "/screencasts/catalog/".to_string(),
            download_suffix: "/download".to_string(),
            account_field: "user[email]".to_string(),
            credential_field: "user[password]".to_string(),
            confirmation_phrase: "Signed in successfully".to_string(),
        }
    }
}

impl SiteConfig {
    /// Default site layout rooted at a different base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if `base_url` is not an absolute URL.
    pub fn with_base_url(base_url: &str) -> Result<Self, ConfigError> {
        let base_url = Url::parse(base_url).map_err(|source| ConfigError::InvalidUrl {
            value: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base_url,
            ..Self::default()
        })
    }

    /// Absolute URL of the sign-in page.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the path cannot be joined.
    pub fn sign_in_url(&self) -> Result<Url, ConfigError> {
        self.join(&self.sign_in_path)
    }

    /// Absolute URL of the catalog page.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the path cannot be joined.
    pub fn catalog_url(&self) -> Result<Url, ConfigError> {
        self.join(&self.catalog_path)
    }

    /// Download URL for a catalog item link (`{base}{href}{suffix}`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidUrl`] if the result is not a valid URL.
    pub fn download_url(&self, href: &str) -> Result<Url, ConfigError> {
        self.join(&format!("{href}{}", self.download_suffix))
    }

    fn join(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path)
            .map_err(|source| ConfigError::InvalidUrl {
                value: format!("{}{path}", self.base_url),
                source,
            })
    }
}

/// Account identifier and credential used for sign-in.
#[derive(Clone)]
pub struct Credentials {
    /// Account identifier (e-mail address).
    pub account: String,
    /// Secret; never logged.
    pub credential: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("credential", &"<redacted>")
            .finish()
    }
}

/// Everything one run needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Site layout.
    pub site: SiteConfig,
    /// Sign-in credentials.
    pub credentials: Credentials,
    /// Number of download workers.
    pub workers: usize,
    /// Capacity of the location queue.
    pub queue_capacity: usize,
    /// Directory the files are written to.
    pub output_dir: PathBuf,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP whole-request timeout.
    pub request_timeout: Duration,
}

impl RunConfig {
    /// Builds a config with default pool sizing, timeouts and output directory.
    #[must_use]
    pub fn new(site: SiteConfig, credentials: Credentials) -> Self {
        Self {
            site,
            credentials,
            workers: default_workers(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            output_dir: PathBuf::from("."),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            request_timeout: Duration::from_secs(READ_TIMEOUT_SECS),
        }
    }
}
