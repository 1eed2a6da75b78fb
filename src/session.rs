//! Authenticated HTTP session.
//!
//! A [`Session`] wraps one `reqwest` connection pool together with an
//! in-process cookie jar. Cookies set during sign-in are attached to every
//! later request automatically. Cloning is cheap and shares both the pool and
//! the jar, so the signed-in session can be handed to every worker.

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response};
use thiserror::Error;
use tracing::{debug, instrument};
use url::Url;

use crate::download::constants::{CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS};
use crate::user_agent;

/// Transport-level errors raised by [`Session`] requests.
///
/// Non-success HTTP statuses are not errors at this level; callers decide
/// what a given status means for them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The underlying HTTP client could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// Request timed out before completion.
    #[error("timeout requesting {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
    },

    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error requesting {url}: {source}")]
    Network {
        /// The URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },
}

impl SessionError {
    fn from_request(url: &Url, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Network {
                url: url.to_string(),
                source,
            }
        }
    }
}

/// HTTP client with a persistent cookie jar, shared by sign-in, catalog and downloads.
#[derive(Debug, Clone)]
pub struct Session {
    client: Client,
    cookies: Arc<Jar>,
}

impl Session {
    /// Creates a session with the default timeouts (30s connect, 1h per request).
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SessionError> {
        Self::with_timeouts(
            Duration::from_secs(CONNECT_TIMEOUT_SECS),
            Duration::from_secs(READ_TIMEOUT_SECS),
        )
    }

    /// Creates a session with explicit timeouts.
    ///
    /// `request_timeout` bounds a whole request, body included.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Build`] if the HTTP client cannot be built.
    #[instrument(level = "debug")]
    pub fn with_timeouts(
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, SessionError> {
        let cookies = Arc::new(Jar::default());
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .user_agent(user_agent::default_session_user_agent())
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(SessionError::Build)?;

        Ok(Self { client, cookies })
    }

    /// Issues a GET request, following redirects.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Timeout`] or [`SessionError::Network`] when the
    /// request cannot be completed. HTTP error statuses are returned as `Ok`.
    #[instrument(level = "debug", skip(self), fields(url = %url))]
    pub async fn get(&self, url: &Url) -> Result<Response, SessionError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| SessionError::from_request(url, e))?;
        debug!(status = %response.status(), final_url = %response.url(), "GET completed");
        Ok(response)
    }

    /// Submits `fields` as an `application/x-www-form-urlencoded` POST body.
    ///
    /// # Errors
    ///
    /// Same as [`get`](Self::get).
    #[instrument(level = "debug", skip(self, fields), fields(url = %url, field_count = fields.len()))]
    pub async fn post_form(
        &self,
        url: &Url,
        fields: &[(String, String)],
    ) -> Result<Response, SessionError> {
        let response = self
            .client
            .post(url.clone())
            .form(fields)
            .send()
            .await
            .map_err(|e| SessionError::from_request(url, e))?;
        debug!(status = %response.status(), final_url = %response.url(), "POST completed");
        Ok(response)
    }

    /// Returns true when the jar holds at least one cookie that would be sent to `url`.
    #[must_use]
    pub fn has_cookies_for(&self, url: &Url) -> bool {
        self.cookies.cookies(url).is_some()
    }
}
