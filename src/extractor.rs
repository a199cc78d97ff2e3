//! Turns one fetched article page into an [`ArticleSummary`].
//!
//! Article pages share a fixed layout:
//!
//! | Field | Selector |
//! |-------|----------|
//! | Title | `.page-header .page-title`, else the first `h1` |
//! | Date | `.news-date` |
//! | Summary | first `p` inside `.news-content-full` |
//! | Image | `src` of the first `img` inside `.news-image-large` |
//! | Icon | `class` of the first `i` inside `.news-image-large` |
//!
//! Missing elements leave their field empty. Only a document with nothing
//! to parse is an [`ExtractError`], which callers turn into
//! [`ArticleSummary::fallback`].

use crate::models::{ArticleId, ArticleSummary, DEFAULT_ICON_CLASS};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use tracing::{debug, instrument};

/// Longest summary kept verbatim.
pub const SUMMARY_MAX_CHARS: usize = 180;
/// Characters kept in front of the ellipsis when a summary is cut.
pub const SUMMARY_CUT_CHARS: usize = 177;
pub const ELLIPSIS: char = '…';

static PAGE_TITLE: Lazy<Selector> = Lazy::new(|| selector(".page-header .page-title"));
static HEADING: Lazy<Selector> = Lazy::new(|| selector("h1"));
static DATE: Lazy<Selector> = Lazy::new(|| selector(".news-date"));
static FIRST_PARAGRAPH: Lazy<Selector> = Lazy::new(|| selector(".news-content-full p"));
static LARGE_IMAGE: Lazy<Selector> = Lazy::new(|| selector(".news-image-large img"));
static LARGE_ICON: Lazy<Selector> = Lazy::new(|| selector(".news-image-large i"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("article selectors are static and valid")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("article page is empty")]
    EmptyDocument,
}

/// Extract the summary record for `id` from its page markup.
#[instrument(level = "debug", skip_all, fields(%id))]
pub fn extract(id: &ArticleId, raw: &str) -> Result<ArticleSummary, ExtractError> {
    if raw.trim().is_empty() {
        return Err(ExtractError::EmptyDocument);
    }

    let document = Html::parse_document(raw);

    let title = document
        .select(&PAGE_TITLE)
        .next()
        .or_else(|| document.select(&HEADING).next())
        .map(text_content)
        .unwrap_or_default();
    let date = first_text(&document, &DATE).unwrap_or_default();
    let summary = first_text(&document, &FIRST_PARAGRAPH)
        .map(|text| truncate_summary(&text))
        .unwrap_or_default();
    let image_src = image_src(&document);
    let icon_class = if image_src.is_empty() {
        icon_class(&document)
    } else {
        String::new()
    };

    debug!(
        title_chars = title.chars().count(),
        has_date = !date.is_empty(),
        summary_chars = summary.chars().count(),
        has_image = !image_src.is_empty(),
        "Extracted article summary"
    );

    Ok(ArticleSummary {
        href: id.href(),
        title,
        date,
        summary,
        image_src,
        icon_class,
    })
}

/// Bound a paragraph to [`SUMMARY_MAX_CHARS`].
///
/// Text longer than the bound keeps its first [`SUMMARY_CUT_CHARS`]
/// characters followed by [`ELLIPSIS`]. Counts are in characters, not bytes.
pub fn truncate_summary(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= SUMMARY_MAX_CHARS {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(SUMMARY_CUT_CHARS).collect();
    cut.push(ELLIPSIS);
    cut
}

/// Trimmed text content of the first match, if it has any.
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(text_content)
        .filter(|text| !text.is_empty())
}

fn text_content(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn image_src(document: &Html) -> String {
    document
        .select(&LARGE_IMAGE)
        .next()
        .and_then(|img| img.value().attr("src"))
        .map(str::trim)
        .unwrap_or_default()
        .to_string()
}

fn icon_class(document: &Html) -> String {
    document
        .select(&LARGE_ICON)
        .next()
        .and_then(|icon| icon.value().attr("class"))
        .map(str::trim)
        .filter(|class| !class.is_empty())
        .unwrap_or(DEFAULT_ICON_CLASS)
        .to_string()
}
