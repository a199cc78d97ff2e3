//! Runtime configuration.
//!
//! Settings come from an optional YAML file and are then overridden by
//! command-line flags. Every key is optional:
//!
//! ```yaml
//! articles: [berita-a, berita-b, berita-c]
//! base_url: https://example.org/kegiatan/berita.html
//! # site_dir: ./public/kegiatan
//! container_selector: .news-grid
//! listing_page_marker: 'berita\.html'
//! fetch_timeout_secs: 5
//! read_more_label: Baca Selengkapnya
//! ```
//!
//! When neither `base_url` nor `site_dir` is set, articles are read from the
//! directory holding the host page, which is where a relative link on that
//! page would point.

use crate::cli::Cli;
use crate::fetcher::{
    BuildError, DirFetcher, HttpFetcher, SiteFetcher, WithTimeout, DEFAULT_FETCH_TIMEOUT,
};
use crate::page::{
    parse_selector, PageError, DEFAULT_CONTAINER_SELECTOR, DEFAULT_LISTING_PAGE_MARKER,
};
use crate::renderer::{RenderOptions, DEFAULT_READ_MORE_LABEL};
use crate::sources::{FixedSources, DEFAULT_ARTICLES};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument};

const DEFAULT_USER_AGENT: &str = concat!("news_listing/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid listing_page_marker: {0}")]
    Marker(#[from] regex::Error),
    #[error(transparent)]
    Selector(#[from] PageError),
    #[error(transparent)]
    Fetcher(#[from] BuildError),
    #[error("set either base_url or site_dir, not both")]
    ConflictingSources,
    #[error("no article source: set base_url or site_dir, or pass a host page")]
    NoSource,
    #[error("fetch_timeout_secs must be greater than zero")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListingConfig {
    /// Article identifiers, in listing order.
    pub articles: Vec<String>,
    /// Where article pages are served: the listing page URL or its directory.
    pub base_url: Option<String>,
    /// Local directory holding the built article pages.
    pub site_dir: Option<PathBuf>,
    pub container_selector: String,
    /// Regex a page path must match to be treated as the listing page.
    pub listing_page_marker: String,
    pub fetch_timeout_secs: u64,
    pub read_more_label: String,
    /// Cookie header sent with every article request.
    pub cookie: Option<String>,
    pub user_agent: String,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            articles: DEFAULT_ARTICLES.iter().map(ToString::to_string).collect(),
            base_url: None,
            site_dir: None,
            container_selector: DEFAULT_CONTAINER_SELECTOR.to_string(),
            listing_page_marker: DEFAULT_LISTING_PAGE_MARKER.to_string(),
            fetch_timeout_secs: DEFAULT_FETCH_TIMEOUT.as_secs(),
            read_more_label: DEFAULT_READ_MORE_LABEL.to_string(),
            cookie: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Load a YAML config file. Missing keys take their defaults.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<ListingConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ListingConfig = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(articles = config.articles.len(), "Loaded configuration");
    Ok(config)
}

impl ListingConfig {
    /// Overlay flags given on the command line. `--site-dir` wins over
    /// `--base-url`, and either one replaces both file settings.
    pub fn apply_cli(mut self, cli: &Cli) -> Self {
        if !cli.articles.is_empty() {
            self.articles = cli.articles.clone();
        }
        if let Some(dir) = &cli.site_dir {
            self.site_dir = Some(dir.clone());
            self.base_url = None;
        } else if let Some(url) = &cli.base_url {
            self.base_url = Some(url.clone());
            self.site_dir = None;
        }
        if let Some(secs) = cli.timeout_secs {
            self.fetch_timeout_secs = secs;
        }
        if let Some(cookie) = &cli.cookie {
            self.cookie = Some(cookie.clone());
        }
        self
    }

    /// Check everything that can be checked before any I/O happens.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_url.is_some() && self.site_dir.is_some() {
            return Err(ConfigError::ConflictingSources);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        self.marker()?;
        parse_selector(&self.container_selector)?;
        Ok(())
    }

    pub fn marker(&self) -> Result<Regex, ConfigError> {
        Ok(Regex::new(&self.listing_page_marker)?)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn sources(&self) -> FixedSources {
        FixedSources::new(self.articles.iter().cloned())
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            read_more_label: self.read_more_label.clone(),
        }
    }

    /// Build the article fetcher, bounded by the configured timeout.
    ///
    /// `host_page` supplies the fallback directory when no source is set.
    pub fn fetcher(&self, host_page: Option<&Path>) -> Result<WithTimeout<SiteFetcher>, ConfigError> {
        let fetcher = match (&self.base_url, &self.site_dir) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingSources),
            (Some(url), None) => SiteFetcher::Http(HttpFetcher::new(
                url,
                &self.user_agent,
                self.cookie.clone(),
            )?),
            (None, Some(dir)) => SiteFetcher::Dir(DirFetcher::new(dir)),
            (None, None) => {
                let page = host_page.ok_or(ConfigError::NoSource)?;
                let dir = page
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .unwrap_or_else(|| Path::new("."));
                SiteFetcher::Dir(DirFetcher::new(dir))
            }
        };
        Ok(WithTimeout::new(fetcher, self.fetch_timeout()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::SourceList;
    use clap::Parser;
    use std::fs;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["news_listing"];
        argv.extend_from_slice(args);
        Cli::parse_from(argv)
    }

    #[test]
    fn test_defaults() {
        let config = ListingConfig::default();
        assert_eq!(config.articles.len(), 6);
        assert_eq!(config.container_selector, ".news-grid");
        assert_eq!(config.fetch_timeout(), Duration::from_secs(5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "articles: [rups-2024, csr-banjir]\nbase_url: https://example.org/kegiatan/\nfetch_timeout_secs: 2\n",
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.articles, vec!["rups-2024", "csr-banjir"]);
        assert_eq!(config.base_url.as_deref(), Some("https://example.org/kegiatan/"));
        assert_eq!(config.fetch_timeout_secs, 2);
        assert_eq!(config.read_more_label, DEFAULT_READ_MORE_LABEL);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "artikel: [a]\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/news_listing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_cli_overrides_file() {
        let file = ListingConfig {
            base_url: Some("https://example.org/".to_string()),
            ..ListingConfig::default()
        };
        let config = file.apply_cli(&cli(&[
            "--site-dir",
            "public",
            "--article",
            "x",
            "--article",
            "y",
            "--timeout-secs",
            "9",
        ]));

        assert_eq!(config.site_dir, Some(PathBuf::from("public")));
        assert_eq!(config.base_url, None);
        assert_eq!(config.articles, vec!["x", "y"]);
        assert_eq!(config.fetch_timeout_secs, 9);
        let ids: Vec<String> = config
            .sources()
            .identifiers()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let both = ListingConfig {
            base_url: Some("https://example.org/".to_string()),
            site_dir: Some(PathBuf::from("public")),
            ..ListingConfig::default()
        };
        assert!(matches!(both.validate(), Err(ConfigError::ConflictingSources)));

        let zero = ListingConfig {
            fetch_timeout_secs: 0,
            ..ListingConfig::default()
        };
        assert!(matches!(zero.validate(), Err(ConfigError::ZeroTimeout)));

        let marker = ListingConfig {
            listing_page_marker: "(".to_string(),
            ..ListingConfig::default()
        };
        assert!(matches!(marker.validate(), Err(ConfigError::Marker(_))));

        let selector = ListingConfig {
            container_selector: "div[".to_string(),
            ..ListingConfig::default()
        };
        assert!(matches!(selector.validate(), Err(ConfigError::Selector(_))));
    }

    #[test]
    fn test_fetcher_selection() {
        let http = ListingConfig {
            base_url: Some("https://example.org/".to_string()),
            ..ListingConfig::default()
        };
        assert!(http.fetcher(None).is_ok());

        let none = ListingConfig::default();
        assert!(matches!(none.fetcher(None), Err(ConfigError::NoSource)));
        assert!(none.fetcher(Some(Path::new("site/berita.html"))).is_ok());
        assert!(none.fetcher(Some(Path::new("berita.html"))).is_ok());

        let bad = ListingConfig {
            base_url: Some("::".to_string()),
            ..ListingConfig::default()
        };
        assert!(matches!(bad.fetcher(None), Err(ConfigError::Fetcher(_))));
    }
}
