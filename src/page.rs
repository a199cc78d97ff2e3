//! The host page: where the listing goes, and whether it goes anywhere.
//!
//! A page is only eligible when two things hold: its identity marks it as
//! the listing page ([`PageContext`]) and it actually contains the listing
//! container ([`ListingContainer::is_present`]). The container is then
//! rewritten in one tree mutation, so a reader never sees half a listing.

use crate::renderer::ListingFragment;
use ego_tree::{NodeMut, NodeRef};
use regex::Regex;
use scraper::{Html, Node, Selector};
use thiserror::Error;
use tracing::debug;

/// Selector of the listing container on the site's listing page.
pub const DEFAULT_CONTAINER_SELECTOR: &str = ".news-grid";
/// Pattern a page path must match to count as the listing page.
pub const DEFAULT_LISTING_PAGE_MARKER: &str = r"berita\.html";

/// Identity of the page being processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageContext {
    ListingPage,
    Other,
}

impl PageContext {
    pub fn detect(page_path: &str, marker: &Regex) -> Self {
        if marker.is_match(page_path) {
            PageContext::ListingPage
        } else {
            PageContext::Other
        }
    }
}

#[derive(Debug, Error)]
pub enum PageError {
    #[error("invalid container selector `{selector}`: {reason}")]
    Selector { selector: String, reason: String },
}

/// Something the rendered listing can be written into.
pub trait ListingContainer {
    /// Whether the container exists. Absence is normal on every page but one.
    fn is_present(&self) -> bool;

    /// Drop the container's current contents and write `fragment` in their place.
    fn replace_contents(&mut self, fragment: &ListingFragment);
}

pub fn parse_selector(css: &str) -> Result<Selector, PageError> {
    Selector::parse(css).map_err(|e| PageError::Selector {
        selector: css.to_string(),
        reason: e.to_string(),
    })
}

/// A parsed host page with a listing container addressed by selector.
#[derive(Debug)]
pub struct HostPage {
    document: Html,
    container: Selector,
}

impl HostPage {
    pub fn parse(markup: &str, container_selector: &str) -> Result<Self, PageError> {
        Ok(Self {
            document: Html::parse_document(markup),
            container: parse_selector(container_selector)?,
        })
    }

    /// Serialize the whole page, including any rewritten container.
    pub fn to_html(&self) -> String {
        self.document.html()
    }
}

impl ListingContainer for HostPage {
    fn is_present(&self) -> bool {
        self.document.select(&self.container).next().is_some()
    }

    fn replace_contents(&mut self, fragment: &ListingFragment) {
        let Some(id) = self.document.select(&self.container).next().map(|el| el.id()) else {
            return;
        };
        let parsed = Html::parse_fragment(&fragment.to_html());
        let Some(mut container) = self.document.tree.get_mut(id) else {
            return;
        };

        let mut removed = 0usize;
        while let Some(mut child) = container.first_child() {
            child.detach();
            removed += 1;
        }
        graft(&mut container, *parsed.root_element());

        debug!(removed, cards = fragment.len(), "Replaced listing container contents");
    }
}

/// Deep-copy the children of `source` under `dest`.
fn graft(dest: &mut NodeMut<'_, Node>, source: NodeRef<'_, Node>) {
    for child in source.children() {
        let mut copy = dest.append(child.value().clone());
        graft(&mut copy, child);
    }
}

/// Container used when there is no host page: it is the listing itself.
#[derive(Debug, Default)]
pub struct FragmentOnly {
    markup: String,
}

impl FragmentOnly {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

impl ListingContainer for FragmentOnly {
    fn is_present(&self) -> bool {
        true
    }

    fn replace_contents(&mut self, fragment: &ListingFragment) {
        self.markup = fragment.to_html();
    }
}
