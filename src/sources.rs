//! The ordered list of articles that make up the listing.
//!
//! The listing is built from a fixed set of article pages. Keeping the list
//! behind [`SourceList`] lets the configuration file, the command line, and
//! tests substitute their own identifiers without touching fetch or parse
//! logic.

use crate::models::ArticleId;

/// The site's articles, in the order they appear on the listing page.
pub const DEFAULT_ARTICLES: [&str; 6] = [
    "berita-a", "berita-b", "berita-c", "berita-d", "berita-e", "berita-f",
];

/// Supplies the ordered identifiers to fetch. Infallible.
pub trait SourceList {
    fn identifiers(&self) -> Vec<ArticleId>;
}

/// A fixed, ordered list of identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedSources {
    ids: Vec<ArticleId>,
}

impl FixedSources {
    pub fn new<I, T>(ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ArticleId>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for FixedSources {
    fn default() -> Self {
        Self::new(DEFAULT_ARTICLES)
    }
}

impl SourceList for FixedSources {
    fn identifiers(&self) -> Vec<ArticleId> {
        self.ids.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sources_are_site_articles() {
        let ids = FixedSources::default().identifiers();
        assert_eq!(ids.len(), 6);
        assert_eq!(ids[0].as_str(), "berita-a");
        assert_eq!(ids[5].as_str(), "berita-f");
    }

    #[test]
    fn test_custom_sources_keep_order() {
        let sources = FixedSources::new(["z", "a", "m"]);
        let ids: Vec<String> = sources
            .identifiers()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(ids, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_identifiers_are_stable_across_calls() {
        let sources = FixedSources::new(vec![String::from("a"), String::from("b")]);
        assert_eq!(sources.identifiers(), sources.identifiers());
    }
}
