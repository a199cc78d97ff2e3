//! Data models for article identifiers and their listing summaries.
//!
//! This module defines the core data structures used throughout the application:
//! - [`ArticleId`]: Opaque token naming one article page on the site
//! - [`ArticleSummary`]: Normalized, display-ready record for one article
//! - [`ListingExport`]: A run's records plus a timestamp, for the JSON export

use serde::{Deserialize, Serialize};
use std::fmt;

/// Icon class used when an article has neither an image nor its own icon.
pub const DEFAULT_ICON_CLASS: &str = "fas fa-newspaper";

/// An opaque identifier naming one article resource.
///
/// The identifier maps to the resource location `"<id>.html"`, resolved
/// against the site the listing page lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArticleId(String);

impl ArticleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resource location of the article page, relative to the site.
    pub fn href(&self) -> String {
        format!("{}.html", self.0)
    }

    /// Title shown when the article could not be read.
    ///
    /// Separators become spaces and the result is upper-cased, so
    /// `"berita-a"` becomes `"BERITA A"`.
    pub fn humanize(&self) -> String {
        self.0.replace(['-', '_'], " ").to_uppercase()
    }
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArticleId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ArticleId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// The normalized result of processing one [`ArticleId`].
///
/// Optional fields are empty strings rather than `Option`s: the renderer
/// treats "absent" and "empty" the same way, and the JSON export keeps a
/// stable shape for every card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleSummary {
    /// Resource location, always derived from the identifier.
    pub href: String,
    /// Heading text, or the humanized identifier on fallback.
    pub title: String,
    /// Date-like text from the article, or empty.
    pub date: String,
    /// First paragraph, bounded to 180 characters.
    pub summary: String,
    /// Illustration URL, or empty when the article has none.
    pub image_src: String,
    /// Icon class, only consulted when `image_src` is empty.
    pub icon_class: String,
}

impl ArticleSummary {
    /// The degraded record used when an article cannot be fetched or parsed.
    pub fn fallback(id: &ArticleId) -> Self {
        Self {
            href: id.href(),
            title: id.humanize(),
            date: String::new(),
            summary: String::new(),
            image_src: String::new(),
            icon_class: DEFAULT_ICON_CLASS.to_string(),
        }
    }
}

/// The records of one run, as written to the JSON export.
#[derive(Debug, Serialize, Deserialize)]
pub struct ListingExport {
    /// The date of the run in `YYYY-MM-DD` format.
    pub local_date: String,
    /// The local time of the run.
    pub local_time: String,
    /// One record per identifier, in source-list order.
    pub articles: Vec<ArticleSummary>,
}
