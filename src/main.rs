//! # News Listing
//!
//! Builds the news listing page of a static site from its individual
//! article pages. Each article is fetched, its title, date, first paragraph,
//! and illustration are extracted, and one card per article is written into
//! the listing page's `.news-grid` container in a single replacement.
//!
//! ## Usage
//!
//! ```sh
//! news_listing -p public/kegiatan/berita.html -o public/kegiatan/berita.html
//! ```
//!
//! ## Architecture
//!
//! 1. **Detecting**: Is this the listing page, and does it have a container?
//! 2. **Fetching**: Retrieve every article concurrently, each under a deadline
//! 3. **Extracting**: Summarize each page, falling back to a placeholder card
//! 4. **Rendering**: Write all cards, in source-list order, in one update

use chrono::Local;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{fmt as tfmt, EnvFilter};

mod cli;
mod config;
mod extractor;
mod fetcher;
mod models;
mod orchestrator;
mod outputs;
mod page;
mod renderer;
mod sources;
mod utils;

use cli::Cli;
use config::{load_config, ListingConfig};
use fetcher::FetchAsync;
use models::ListingExport;
use orchestrator::{Orchestrator, RunOutcome, RunReport};
use outputs::{html, json};
use page::{FragmentOnly, HostPage, ListingContainer, PageContext};
use sources::SourceList;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    // stderr keeps stdout free for the rendered markup.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("news_listing starting up");

    // Parse CLI
    let args = Cli::parse();
    debug!(?args.page, ?args.output, ?args.json_output_dir, "Parsed CLI arguments");

    // ---- Configuration ----
    let file_config = match &args.config {
        Some(path) => load_config(path)?,
        None => ListingConfig::default(),
    };
    let config = file_config.apply_cli(&args);
    config.validate()?;
    info!(
        articles = config.articles.len(),
        timeout_secs = config.fetch_timeout_secs,
        "Configuration ready"
    );

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = ensure_writable_dir(dir).await {
            error!(
                path = %dir,
                error = %e,
                "JSON output directory is not writable (fix perms or choose a different path)"
            );
            return Err(e);
        }
    }

    let fetcher = config.fetcher(args.page.as_deref())?;
    let mut orchestrator = Orchestrator::new(config.sources(), fetcher, config.render_options());

    // ---- Run against the host page, or emit the bare listing ----
    let report = match &args.page {
        Some(page_path) => {
            let markup = tokio::fs::read_to_string(page_path).await?;
            let mut page = HostPage::parse(&markup, &config.container_selector)?;
            let context = PageContext::detect(&page_path.to_string_lossy(), &config.marker()?);

            match run_until_interrupted(&mut orchestrator, context, &mut page).await? {
                RunOutcome::Rendered(report) => {
                    html::write_markup(&page.to_html(), args.output.as_deref()).await?;
                    Some(report)
                }
                outcome => {
                    info!(?outcome, page = %page_path.display(), "Page left unchanged");
                    None
                }
            }
        }
        None => {
            let mut fragment = FragmentOnly::new();
            match run_until_interrupted(&mut orchestrator, PageContext::ListingPage, &mut fragment)
                .await?
            {
                RunOutcome::Rendered(report) => {
                    html::write_markup(fragment.markup(), args.output.as_deref()).await?;
                    Some(report)
                }
                outcome => {
                    info!(?outcome, "Nothing rendered");
                    None
                }
            }
        }
    };
    debug!(state = ?orchestrator.state(), "Orchestrator finished");

    // ---- JSON export ----
    if let (Some(report), Some(dir)) = (&report, &args.json_output_dir) {
        let now = Local::now();
        let export = ListingExport {
            local_date: now.date_naive().to_string(),
            local_time: now.time().to_string(),
            articles: report.records.clone(),
        };
        if let Err(e) = json::write_listing(&export, dir).await {
            error!(error = %e, "Failed to write JSON export");
        }
    }

    let elapsed = start_time.elapsed();
    let (cards, fallbacks) = report
        .as_ref()
        .map(|r: &RunReport| (r.records.len(), r.fallbacks))
        .unwrap_or_default();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        cards,
        fallbacks,
        "Execution complete"
    );

    Ok(())
}

/// Run the orchestrator unless Ctrl-C arrives first.
///
/// Interruption drops the run future, which drops every in-flight request.
async fn run_until_interrupted<S, F, C>(
    orchestrator: &mut Orchestrator<S, F>,
    context: PageContext,
    container: &mut C,
) -> Result<RunOutcome, Box<dyn Error>>
where
    S: SourceList,
    F: FetchAsync,
    C: ListingContainer,
{
    tokio::select! {
        outcome = orchestrator.run(context, container) => Ok(outcome),
        _ = tokio::signal::ctrl_c() => {
            warn!("Interrupted; abandoning in-flight article requests");
            Err("interrupted before the listing was rendered".into())
        }
    }
}
