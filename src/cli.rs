//! Command-line interface definitions for the news listing builder.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Flags override the values in the optional YAML config file.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the news listing builder.
///
/// # Examples
///
/// ```sh
/// # Rewrite the listing page in place, reading articles next to it
/// news_listing -p public/kegiatan/berita.html -o public/kegiatan/berita.html
///
/// # Fetch articles from the live site and print only the cards
/// news_listing -b https://example.org/kegiatan/berita.html
///
/// # Also export the records as JSON
/// news_listing -p berita.html -o out/berita.html -j ./json
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to config.yaml file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// URL the article pages are served from (the listing page URL or its directory)
    #[arg(short, long, env = "NEWS_LISTING_BASE_URL")]
    pub base_url: Option<String>,

    /// Local directory holding the article pages (wins over --base-url)
    #[arg(short = 'd', long)]
    pub site_dir: Option<PathBuf>,

    /// Host listing page whose container receives the cards
    #[arg(short, long)]
    pub page: Option<PathBuf>,

    /// Where to write the result (stdout when absent)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output directory for the JSON export of the listing records
    #[arg(short, long)]
    pub json_output_dir: Option<String>,

    /// Article identifier to include, in order; repeat to build the list
    #[arg(long = "article", value_name = "ID")]
    pub articles: Vec<String>,

    /// Per-article fetch deadline in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Cookie header sent with every article request
    #[arg(long, env = "NEWS_LISTING_COOKIE", hide_env_values = true)]
    pub cookie: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "news_listing",
            "--page",
            "public/berita.html",
            "--output",
            "out/berita.html",
        ]);

        assert_eq!(cli.page, Some(PathBuf::from("public/berita.html")));
        assert_eq!(cli.output, Some(PathBuf::from("out/berita.html")));
        assert!(cli.articles.is_empty());
    }

    #[test]
    fn test_cli_short_flags() {
        let cli = Cli::parse_from([
            "news_listing",
            "-d",
            "/srv/site",
            "-j",
            "/tmp/json",
            "-c",
            "listing.yaml",
        ]);

        assert_eq!(cli.site_dir, Some(PathBuf::from("/srv/site")));
        assert_eq!(cli.json_output_dir.as_deref(), Some("/tmp/json"));
        assert_eq!(cli.config, Some(PathBuf::from("listing.yaml")));
    }

    #[test]
    fn test_cli_repeated_articles_keep_order() {
        let cli = Cli::parse_from([
            "news_listing",
            "--article",
            "berita-c",
            "--article",
            "berita-a",
            "--timeout-secs",
            "3",
        ]);

        assert_eq!(cli.articles, vec!["berita-c", "berita-a"]);
        assert_eq!(cli.timeout_secs, Some(3));
    }
}
