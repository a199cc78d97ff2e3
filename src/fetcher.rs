//! Article retrieval with per-fetch deadlines.
//!
//! This module retrieves the raw HTML of one article page per call. Every
//! failure is returned as a [`FetchError`]; nothing here panics or retries,
//! so the caller can degrade a single article without touching the others.
//!
//! # Architecture
//!
//! The module uses a trait-based design:
//! - [`FetchAsync`]: Core trait, one identifier in, one document out
//! - [`HttpFetcher`]: Same-origin HTTP retrieval relative to the listing page
//! - [`DirFetcher`]: Reads built pages from a local site directory
//! - [`WithTimeout`]: Decorator that bounds any [`FetchAsync`] by a deadline
//! - [`SiteFetcher`]: Runtime choice between the two concrete fetchers

use crate::models::ArticleId;
use reqwest::{header, redirect, Client, StatusCode};
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, instrument};
use url::Url;

/// Default per-article deadline.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

const MAX_REDIRECTS: usize = 10;

/// Why one article could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot resolve `{id}` against the site: {source}")]
    InvalidUrl {
        id: ArticleId,
        #[source]
        source: url::ParseError,
    },
    #[error("{url} is not on the listing page's origin {origin}")]
    CrossOrigin { url: String, origin: String },
    #[error("`{0}` is not a valid article identifier")]
    InvalidIdentifier(ArticleId),
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered {status}")]
    Status { url: String, status: StatusCode },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no response within {0:?}")]
    Timeout(Duration),
}

/// Why a fetcher could not be constructed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid base url `{url}`: {source}")]
    BaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("base url `{0}` cannot serve relative article pages")]
    OpaqueBaseUrl(String),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Retrieves the raw document for one article.
pub trait FetchAsync {
    async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError>;
}

/// Same-origin HTTP fetcher.
///
/// Article pages are resolved relative to `base` exactly as a browser
/// resolves a relative link: a base of `https://site/kegiatan/berita.html`
/// serves `berita-a` from `https://site/kegiatan/berita-a.html`. Requests
/// and redirects that would leave the base origin are refused, and the
/// optional cookie is only ever sent to that origin.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    base: Url,
    cookie: Option<String>,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("base", &self.base.as_str())
            .field("cookie", &self.cookie.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl HttpFetcher {
    pub fn new(
        base_url: &str,
        user_agent: &str,
        cookie: Option<String>,
    ) -> Result<Self, BuildError> {
        let base = Url::parse(base_url).map_err(|source| BuildError::BaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if base.cannot_be_a_base() {
            return Err(BuildError::OpaqueBaseUrl(base_url.to_string()));
        }

        let origin = base.origin();
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                attempt.error("too many redirects")
            } else if attempt.url().origin() != origin {
                // Surfaces as a 3xx status, which the caller treats as failure.
                attempt.stop()
            } else {
                attempt.follow()
            }
        });

        let client = Client::builder()
            .user_agent(user_agent)
            .redirect(policy)
            .build()?;

        Ok(Self {
            client,
            base,
            cookie,
        })
    }

    /// Absolute location of an article page, refused if it leaves the origin.
    pub fn resolve(&self, id: &ArticleId) -> Result<Url, FetchError> {
        let url = self
            .base
            .join(&id.href())
            .map_err(|source| FetchError::InvalidUrl {
                id: id.clone(),
                source,
            })?;
        if url.origin() != self.base.origin() {
            return Err(FetchError::CrossOrigin {
                url: url.to_string(),
                origin: self.base.origin().ascii_serialization(),
            });
        }
        Ok(url)
    }
}

impl FetchAsync for HttpFetcher {
    #[instrument(level = "debug", skip_all, fields(%id))]
    async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError> {
        let url = self.resolve(id)?;
        let t0 = Instant::now();

        let mut request = self.client.get(url.clone());
        if let Some(cookie) = &self.cookie {
            request = request.header(header::COOKIE, cookie);
        }

        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        debug!(
            %url,
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched article page"
        );
        Ok(body)
    }
}

/// Reads article pages from a directory holding the built site.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Path of an article page, refused if the identifier would escape `root`.
    pub fn resolve(&self, id: &ArticleId) -> Result<PathBuf, FetchError> {
        let raw = id.as_str();
        if raw.is_empty() || raw.contains(['/', '\\']) || raw.contains("..") {
            return Err(FetchError::InvalidIdentifier(id.clone()));
        }
        Ok(self.root.join(id.href()))
    }
}

impl FetchAsync for DirFetcher {
    #[instrument(level = "debug", skip_all, fields(%id))]
    async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError> {
        let path = self.resolve(id)?;
        let body = tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| FetchError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), bytes = body.len(), "Read article page");
        Ok(body)
    }
}

/// Wrapper that bounds every fetch of the inner [`FetchAsync`] by `limit`.
///
/// Expiry drops the inner future, which releases its connection, and is
/// reported as [`FetchError::Timeout`]. There is no retry.
#[derive(Debug, Clone)]
pub struct WithTimeout<F> {
    inner: F,
    limit: Duration,
}

impl<F> WithTimeout<F>
where
    F: FetchAsync,
{
    pub fn new(inner: F, limit: Duration) -> Self {
        Self { inner, limit }
    }
}

impl<F> FetchAsync for WithTimeout<F>
where
    F: FetchAsync,
{
    async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError> {
        match timeout(self.limit, self.inner.fetch(id)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.limit)),
        }
    }
}

/// The fetcher chosen at startup from the configuration.
#[derive(Debug, Clone)]
pub enum SiteFetcher {
    Http(HttpFetcher),
    Dir(DirFetcher),
}

impl FetchAsync for SiteFetcher {
    async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError> {
        match self {
            SiteFetcher::Http(fetcher) => fetcher.fetch(id).await,
            SiteFetcher::Dir(fetcher) => fetcher.fetch(id).await,
        }
    }
}
