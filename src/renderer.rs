//! Listing rendering.
//!
//! [`render`] is a pure function from ordered records to a
//! [`ListingFragment`]; writing the fragment into a page is the job of a
//! [`ListingContainer`](crate::page::ListingContainer). The fragment serializes to the card markup the
//! site's stylesheet expects:
//!
//! ```text
//! <article class="news-card">
//!   <div class="news-image"><img ...> or <i class="..."></i></div>
//!   <div class="news-content">
//!     <div class="news-date">...</div>   (only when there is a date)
//!     <h3>title</h3>
//!     <p>summary</p>
//!     <a href="..." class="read-more-btn">label <i class="fas fa-arrow-right"></i></a>
//!   </div>
//! </article>
//! ```

use crate::models::{ArticleSummary, DEFAULT_ICON_CLASS};
use crate::utils::escape_html;
use std::fmt;

pub const DEFAULT_READ_MORE_LABEL: &str = "Baca Selengkapnya";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub read_more_label: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            read_more_label: DEFAULT_READ_MORE_LABEL.to_string(),
        }
    }
}

/// Illustration of a card. An image always wins over an icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardVisual {
    Image { src: String, alt: String },
    Icon { class: String },
}

/// Display fragment for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsCard {
    pub visual: CardVisual,
    pub date: Option<String>,
    pub title: String,
    pub summary: String,
    pub href: String,
}

impl From<&ArticleSummary> for NewsCard {
    fn from(record: &ArticleSummary) -> Self {
        let visual = if !record.image_src.is_empty() {
            CardVisual::Image {
                src: record.image_src.clone(),
                alt: record.title.clone(),
            }
        } else if !record.icon_class.is_empty() {
            CardVisual::Icon {
                class: record.icon_class.clone(),
            }
        } else {
            CardVisual::Icon {
                class: DEFAULT_ICON_CLASS.to_string(),
            }
        };

        Self {
            visual,
            date: Some(record.date.clone()).filter(|d| !d.is_empty()),
            title: record.title.clone(),
            summary: record.summary.clone(),
            href: record.href.clone(),
        }
    }
}

/// Every card of one listing, in record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingFragment {
    pub cards: Vec<NewsCard>,
    pub read_more_label: String,
}

impl ListingFragment {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Serialize all cards into one markup string.
    pub fn to_html(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ListingFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for card in &self.cards {
            write_card(f, card, &self.read_more_label)?;
        }
        Ok(())
    }
}

/// Build the fragment tree for `records`. One card per record, same order.
pub fn render(records: &[ArticleSummary], options: &RenderOptions) -> ListingFragment {
    ListingFragment {
        cards: records.iter().map(NewsCard::from).collect(),
        read_more_label: options.read_more_label.clone(),
    }
}

fn write_card(out: &mut fmt::Formatter<'_>, card: &NewsCard, read_more_label: &str) -> fmt::Result {
    writeln!(out, r#"<article class="news-card">"#)?;
    match &card.visual {
        CardVisual::Image { src, alt } => writeln!(
            out,
            r#"<div class="news-image"><img src="{}" alt="{}" loading="lazy"></div>"#,
            escape_html(src),
            escape_html(alt)
        )?,
        CardVisual::Icon { class } => writeln!(
            out,
            r#"<div class="news-image"><i class="{}"></i></div>"#,
            escape_html(class)
        )?,
    }
    writeln!(out, r#"<div class="news-content">"#)?;
    if let Some(date) = &card.date {
        writeln!(out, r#"<div class="news-date">{}</div>"#, escape_html(date))?;
    }
    writeln!(out, "<h3>{}</h3>", escape_html(&card.title))?;
    writeln!(out, "<p>{}</p>", escape_html(&card.summary))?;
    writeln!(
        out,
        r#"<a href="{}" class="read-more-btn">{} <i class="fas fa-arrow-right"></i></a>"#,
        escape_html(&card.href),
        escape_html(read_more_label)
    )?;
    writeln!(out, "</div>")?;
    writeln!(out, "</article>")
}
