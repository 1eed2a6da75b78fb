//! Catalog discovery.
//!
//! The catalog is a single HTML page. Every `<a href>` whose target starts
//! with the configured prefix is an item, and `{base}{href}{suffix}` is where
//! that item downloads from.

use std::collections::HashSet;

use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

use crate::config::{ConfigError, SiteConfig};
use crate::session::{Session, SessionError};

/// Catalog enumeration failures. All of them are fatal to a run.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog URL could not be built.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The catalog page never produced a response.
    #[error(transparent)]
    Transport(#[from] SessionError),

    /// The catalog page returned an error status.
    #[error("HTTP {status} fetching catalog {url}")]
    HttpStatus {
        /// The catalog URL.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The catalog body could not be read.
    #[error("failed to read catalog {url}: {source}")]
    Body {
        /// The catalog URL.
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

    /// A discovered link did not form a valid download URL.
    #[error("malformed catalog link {href:?}: {source}")]
    InvalidLocation {
        /// The `href` as found in the page.
        href: String,
        /// Why the download URL could not be built.
        #[source]
        source: ConfigError,
    },
}

/// Produces the download locations listed on a site's catalog page.
#[derive(Debug, Clone)]
pub struct CatalogLister {
    site: SiteConfig,
}

impl CatalogLister {
    /// Creates a lister for `site`.
    #[must_use]
    pub fn new(site: SiteConfig) -> Self {
        Self { site }
    }

    /// Fetches the catalog page and returns every item's download URL, in page order.
    ///
    /// Links that appear more than once are returned once.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the page cannot be fetched or read, or if
    /// any matching link does not form a valid URL.
    #[instrument(skip_all)]
    pub async fn list(&self, session: &Session) -> Result<Vec<Url>, CatalogError> {
        let url = self.site.catalog_url()?;
        info!(url = %url, "fetching catalog");

        let response = session.get(&url).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        let page = response.text().await.map_err(|source| CatalogError::Body {
            url: url.to_string(),
            source,
        })?;

        let hrefs = extract_item_links(&page, &self.site.link_prefix)?;
        let locations = hrefs
            .into_iter()
            .map(|href| {
                self.site
                    .download_url(&href)
                    .map_err(|source| CatalogError::InvalidLocation { href, source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        info!(count = locations.len(), "found catalog items");
        Ok(locations)
    }
}

/// Returns the distinct `href`s starting with `prefix`, in document order.
///
/// # Errors
///
/// Returns [`CatalogError::Selector`] if the built-in selector fails to parse.
pub(crate) fn extract_item_links(html: &str, prefix: &str) -> Result<Vec<String>, CatalogError> {
    const LINKS: &str = "a[href]";

    let selector = Selector::parse(LINKS).map_err(|_| CatalogError::Selector { selector: LINKS })?;
    let document = Html::parse_document(html);

    let mut seen = HashSet::new();
    let mut links = Vec::new();
    for href in document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter(|href| href.starts_with(prefix))
    {
        if seen.insert(href) {
            links.push(href.to_string());
        } else {
            debug!(href, "duplicate catalog link");
        }
    }
    Ok(links)
}
