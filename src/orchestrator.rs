//! Drives one listing run: detect → fetch → extract → render.
//!
//! # State machine
//!
//! ```text
//! Idle → Detecting ─┬─ not applicable ─→ Idle
//!                   └─ applicable ─→ Fetching → Rendering → Done
//! ```
//!
//! Fetch and extraction overlap per article inside `Fetching`. Once `Done`,
//! further runs are refused, mirroring a single run per page load.
//!
//! Every identifier yields exactly one record. Fetch and parse failures are
//! logged and replaced by [`ArticleSummary::fallback`], and results are
//! slotted back by their original index so completion order never leaks
//! into the listing.

use crate::extractor::{extract, ExtractError};
use crate::fetcher::{FetchAsync, FetchError};
use crate::models::{ArticleId, ArticleSummary};
use crate::page::{ListingContainer, PageContext};
use crate::renderer::{render, RenderOptions};
use crate::sources::SourceList;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Detecting,
    Fetching,
    Rendering,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// One record per identifier, in source-list order.
    pub records: Vec<ArticleSummary>,
    /// How many of `records` are fallbacks.
    pub fallbacks: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Wrong page, or no listing container on it.
    NotApplicable,
    Rendered(RunReport),
    /// The orchestrator already completed a run.
    AlreadyDone,
}

#[derive(Debug, Error)]
enum ItemError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Extract(#[from] ExtractError),
}

pub struct Orchestrator<S, F> {
    sources: S,
    fetcher: F,
    options: RenderOptions,
    state: RunState,
}

impl<S, F> Orchestrator<S, F>
where
    S: SourceList,
    F: FetchAsync,
{
    pub fn new(sources: S, fetcher: F, options: RenderOptions) -> Self {
        Self {
            sources,
            fetcher,
            options,
            state: RunState::Idle,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Build the listing into `container` if `context` is the listing page.
    ///
    /// Never fails: per-article problems become fallback cards.
    #[instrument(level = "info", skip_all, fields(?context))]
    pub async fn run<C>(&mut self, context: PageContext, container: &mut C) -> RunOutcome
    where
        C: ListingContainer,
    {
        if self.state == RunState::Done {
            debug!("Listing already rendered; ignoring repeat run");
            return RunOutcome::AlreadyDone;
        }

        self.state = RunState::Detecting;
        if context != PageContext::ListingPage {
            info!("Not the listing page; nothing to do");
            self.state = RunState::Idle;
            return RunOutcome::NotApplicable;
        }
        if !container.is_present() {
            info!("Listing container not found; nothing to do");
            self.state = RunState::Idle;
            return RunOutcome::NotApplicable;
        }

        self.state = RunState::Fetching;
        let t0 = Instant::now();
        let ids = self.sources.identifiers();
        info!(count = ids.len(), "Fetching articles");
        let (records, fallbacks) = collect_records(&self.fetcher, &ids).await;

        self.state = RunState::Rendering;
        let fragment = render(&records, &self.options);
        if fragment.is_empty() {
            warn!("No articles configured; the listing container will be emptied");
        }
        container.replace_contents(&fragment);
        self.state = RunState::Done;

        info!(
            cards = fragment.len(),
            fallbacks,
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Rendered news listing"
        );

        RunOutcome::Rendered(RunReport { records, fallbacks })
    }
}

/// Fetch and extract every identifier concurrently, in identifier order.
async fn collect_records<F>(fetcher: &F, ids: &[ArticleId]) -> (Vec<ArticleSummary>, usize)
where
    F: FetchAsync,
{
    let mut slots: Vec<Option<ArticleSummary>> = vec![None; ids.len()];
    let mut fallbacks = 0usize;

    let mut settled = stream::iter(ids.iter().enumerate())
        .map(|(index, id)| async move { (index, summarize(fetcher, id).await) })
        .buffer_unordered(ids.len().max(1));

    while let Some((index, result)) = settled.next().await {
        let id = &ids[index];
        let record = match result {
            Ok(record) => {
                debug!(index, %id, "Article summarized");
                record
            }
            Err(e) => {
                warn!(index, %id, error = %e, "Article unavailable; using fallback card");
                fallbacks += 1;
                ArticleSummary::fallback(id)
            }
        };
        slots[index] = Some(record);
    }

    let records = slots
        .into_iter()
        .zip(ids)
        .map(|(slot, id)| slot.unwrap_or_else(|| ArticleSummary::fallback(id)))
        .collect();
    (records, fallbacks)
}

async fn summarize<F>(fetcher: &F, id: &ArticleId) -> Result<ArticleSummary, ItemError>
where
    F: FetchAsync,
{
    let raw = fetcher.fetch(id).await?;
    Ok(extract(id, &raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::{DirFetcher, WithTimeout};
    use crate::models::DEFAULT_ICON_CLASS;
    use crate::page::{HostPage, DEFAULT_CONTAINER_SELECTOR};
    use crate::renderer::{CardVisual, ListingFragment};
    use crate::sources::FixedSources;
    use std::collections::HashMap;
    use std::io;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::sleep;

    enum Reply {
        Page(&'static str),
        NetworkError,
    }

    /// Serves canned replies after a per-article delay.
    #[derive(Default)]
    struct StubFetcher {
        replies: HashMap<String, (Duration, Reply)>,
        calls: AtomicUsize,
    }

    impl StubFetcher {
        fn page(mut self, id: &str, delay_ms: u64, body: &'static str) -> Self {
            self.replies
                .insert(id.to_string(), (Duration::from_millis(delay_ms), Reply::Page(body)));
            self
        }

        fn failing(mut self, id: &str, delay_ms: u64) -> Self {
            self.replies
                .insert(id.to_string(), (Duration::from_millis(delay_ms), Reply::NetworkError));
            self
        }
    }

    impl FetchAsync for StubFetcher {
        async fn fetch(&self, id: &ArticleId) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let network_error = || FetchError::Io {
                path: PathBuf::from(id.href()),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused"),
            };
            match self.replies.get(id.as_str()) {
                Some((delay, reply)) => {
                    sleep(*delay).await;
                    match reply {
                        Reply::Page(body) => Ok(body.to_string()),
                        Reply::NetworkError => Err(network_error()),
                    }
                }
                None => Err(network_error()),
            }
        }
    }

    /// Records every write so tests can count them.
    struct RecordingContainer {
        present: bool,
        writes: Vec<ListingFragment>,
    }

    impl RecordingContainer {
        fn present() -> Self {
            Self {
                present: true,
                writes: Vec::new(),
            }
        }
    }

    impl ListingContainer for RecordingContainer {
        fn is_present(&self) -> bool {
            self.present
        }

        fn replace_contents(&mut self, fragment: &ListingFragment) {
            self.writes.push(fragment.clone());
        }
    }

    const EVENT_A: &str = r#"<html><body><h1>Event A</h1>
        <div class="news-content-full"><p>Lorem ipsum</p></div></body></html>"#;

    fn report(outcome: RunOutcome) -> RunReport {
        match outcome {
            RunOutcome::Rendered(report) => report,
            other => panic!("expected a rendered listing, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_success_and_failure_scenario() {
        let fetcher = StubFetcher::default().page("a", 0, EVENT_A).failing("b", 0);
        let mut orchestrator =
            Orchestrator::new(FixedSources::new(["a", "b"]), fetcher, RenderOptions::default());
        let mut container = RecordingContainer::present();

        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);

        assert_eq!(report.fallbacks, 1);
        let first = &report.records[0];
        assert_eq!(first.title, "Event A");
        assert_eq!(first.summary, "Lorem ipsum");
        assert_eq!(first.href, "a.html");

        let second = &report.records[1];
        assert_eq!(second.title, "B");
        assert_eq!(second.href, "b.html");
        assert_eq!(second.summary, "");
        assert_eq!(second.image_src, "");
        assert_eq!(second.icon_class, DEFAULT_ICON_CLASS);

        assert_eq!(container.writes.len(), 1);
        let cards = &container.writes[0].cards;
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Event A");
        assert_eq!(cards[1].title, "B");
        assert_eq!(
            cards[1].visual,
            CardVisual::Icon {
                class: DEFAULT_ICON_CLASS.to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_every_identifier_rendered_when_all_fail() {
        let ids = ["berita-a", "berita-b", "berita-c", "berita-d"];
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(ids),
            StubFetcher::default(),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);

        assert_eq!(report.records.len(), ids.len());
        assert_eq!(report.fallbacks, ids.len());
        assert_eq!(container.writes[0].len(), ids.len());
        assert_eq!(report.records[2].title, "BERITA C");
    }

    #[tokio::test]
    async fn test_order_follows_source_list_not_completion() {
        let fetcher = StubFetcher::default()
            .page("one", 60, "<h1>one</h1>")
            .page("two", 30, "<h1>two</h1>")
            .page("three", 0, "<h1>three</h1>");
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["one", "two", "three"]),
            fetcher,
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);

        let titles: Vec<&str> = report.records.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["one", "two", "three"]);
        let card_titles: Vec<&str> = container.writes[0]
            .cards
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(card_titles, titles);
    }

    #[tokio::test]
    async fn test_fetches_overlap() {
        let fetcher = StubFetcher::default()
            .page("one", 150, "<h1>one</h1>")
            .page("two", 150, "<h1>two</h1>")
            .page("three", 150, "<h1>three</h1>");
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["one", "two", "three"]),
            fetcher,
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let t0 = Instant::now();
        orchestrator.run(PageContext::ListingPage, &mut container).await;
        assert!(t0.elapsed() < Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_hung_article_times_out_to_fallback() {
        let fetcher = WithTimeout::new(
            StubFetcher::default()
                .page("fast", 0, EVENT_A)
                .page("hung", 60_000, EVENT_A),
            Duration::from_millis(50),
        );
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["hung", "fast"]),
            fetcher,
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let t0 = Instant::now();
        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);

        assert!(t0.elapsed() < Duration::from_secs(5));
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.records[0].title, "HUNG");
        assert_eq!(report.records[1].title, "Event A");
    }

    #[tokio::test]
    async fn test_other_page_does_nothing() {
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["a"]),
            StubFetcher::default().page("a", 0, EVENT_A),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let outcome = orchestrator.run(PageContext::Other, &mut container).await;

        assert_eq!(outcome, RunOutcome::NotApplicable);
        assert_eq!(orchestrator.state(), RunState::Idle);
        assert!(container.writes.is_empty());
        assert_eq!(orchestrator.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_container_does_nothing() {
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["a"]),
            StubFetcher::default().page("a", 0, EVENT_A),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer {
            present: false,
            writes: Vec::new(),
        };

        let outcome = orchestrator.run(PageContext::ListingPage, &mut container).await;

        assert_eq!(outcome, RunOutcome::NotApplicable);
        assert!(container.writes.is_empty());
        assert_eq!(orchestrator.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_single_run_per_orchestrator() {
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["a"]),
            StubFetcher::default().page("a", 0, EVENT_A),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        assert!(matches!(
            orchestrator.run(PageContext::ListingPage, &mut container).await,
            RunOutcome::Rendered(_)
        ));
        assert_eq!(orchestrator.state(), RunState::Done);
        assert_eq!(
            orchestrator.run(PageContext::ListingPage, &mut container).await,
            RunOutcome::AlreadyDone
        );
        assert_eq!(container.writes.len(), 1);
        assert_eq!(orchestrator.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_empty_source_list_clears_container() {
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(Vec::<String>::new()),
            StubFetcher::default(),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);

        assert!(report.records.is_empty());
        assert_eq!(container.writes.len(), 1);
        assert!(container.writes[0].is_empty());
    }

    #[tokio::test]
    async fn test_blank_page_is_parse_failure() {
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["blank"]),
            StubFetcher::default().page("blank", 0, "   "),
            RenderOptions::default(),
        );
        let mut container = RecordingContainer::present();

        let report = report(orchestrator.run(PageContext::ListingPage, &mut container).await);
        assert_eq!(report.fallbacks, 1);
        assert_eq!(report.records[0].title, "BLANK");
    }

    #[tokio::test]
    async fn test_site_directory_into_host_page() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("berita-a.html"),
            r#"<html><body>
                <section class="page-header"><h1 class="page-title">Peresmian Kantor</h1></section>
                <div class="news-date">3 Mei 2024</div>
                <div class="news-image-large"><img src="img/kantor.jpg"></div>
                <div class="news-content-full"><p>Kantor baru resmi dibuka.</p></div>
            </body></html>"#,
        )
        .unwrap();

        let mut page = HostPage::parse(
            r#"<html><body><div class="news-grid"><p>old</p></div></body></html>"#,
            DEFAULT_CONTAINER_SELECTOR,
        )
        .unwrap();
        let mut orchestrator = Orchestrator::new(
            FixedSources::new(["berita-a", "berita-z"]),
            DirFetcher::new(dir.path()),
            RenderOptions::default(),
        );

        let report = report(orchestrator.run(PageContext::ListingPage, &mut page).await);
        let html = page.to_html();

        assert_eq!(report.fallbacks, 1);
        assert!(!html.contains("<p>old</p>"));
        assert!(html.contains(r#"<img src="img/kantor.jpg" alt="Peresmian Kantor" loading="lazy">"#));
        assert!(html.contains(r#"<div class="news-date">3 Mei 2024</div>"#));
        assert!(html.contains("<h3>BERITA Z</h3>"));
        assert!(html.find("Peresmian Kantor").unwrap() < html.find("BERITA Z").unwrap());
    }
}
