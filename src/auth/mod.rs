//! Form-based sign-in.
//!
//! Fetches the sign-in page, posts its form back with the account and
//! credential filled in, and checks the response for the site's confirmation
//! phrase. The session cookie set along the way stays in the [`Session`] jar
//! for every later request.

mod form;

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::config::{ConfigError, Credentials, SiteConfig};
use crate::session::{Session, SessionError};

/// Sign-in failures. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The sign-in URL could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The sign-in page or form post never produced a response.
    #[error(transparent)]
    Transport(#[from] SessionError),

    /// The sign-in page or form post returned an error status.
    #[error("HTTP {status} from sign-in at {url}")]
    HttpStatus {
        /// The URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// A response body could not be read.
    #[error("failed to read sign-in response from {url}: {source}")]
    Body {
        /// The URL being read.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// A built-in CSS selector failed to parse.
    #[error("invalid built-in selector {selector:?}")]
    Selector {
        /// The selector text.
        selector: &'static str,
    },

    /// The response to the form post did not contain the confirmation phrase.
    #[error("sign-in rejected at {url}: response did not contain {phrase:?}")]
    Rejected {
        /// The sign-in URL.
        url: String,
        /// The phrase that was expected.
        phrase: String,
    },
}

/// Signs `session` in to `site` with `credentials`.
///
/// # Errors
///
/// Returns [`AuthError`] when the form cannot be fetched or posted, or when
/// the site does not confirm the login.
#[instrument(skip_all, fields(account = %credentials.account))]
pub async fn sign_in(
    session: &Session,
    site: &SiteConfig,
    credentials: &Credentials,
) -> Result<(), AuthError> {
    let url = site.sign_in_url()?;

    info!(url = %url, "fetching sign-in form");
    let page = fetch_text(session.get(&url).await?).await?;

    let mut fields = form::extract_form_fields(&page)?;
    debug!(fields = fields.len(), "extracted sign-in form fields");
    form::set_field(&mut fields, &site.account_field, &credentials.account);
    form::set_field(&mut fields, &site.credential_field, &credentials.credential);

    info!("submitting sign-in form");
    let body = fetch_text(session.post_form(&url, &fields).await?).await?;

    if !body.contains(&site.confirmation_phrase) {
        return Err(AuthError::Rejected {
            url: url.to_string(),
            phrase: site.confirmation_phrase.clone(),
        });
    }

    debug!(
        has_cookies = session.has_cookies_for(&site.base_url),
        "session cookies after sign-in"
    );
    info!("signed in");
    Ok(())
}

async fn fetch_text(response: reqwest::Response) -> Result<String, AuthError> {
    let url = response.url().to_string();
    let status = response.status();
    if !status.is_success() {
        return Err(AuthError::HttpStatus {
            url,
            status: status.as_u16(),
        });
    }
    response
        .text()
        .await
        .map_err(|source| AuthError::Body { url, source })
}
