//! JSON export of the listing records.
//!
//! # Output Structure
//!
//! Files are organized by date:
//! ```text
//! json_output_dir/
//! └── 2025-05-06/
//!     └── listing.json
//! ```
//!
//! A later run on the same day overwrites that day's file.

use crate::models::ListingExport;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument};

/// Write a [`ListingExport`] to `{json_output_dir}/{local_date}/listing.json`.
///
/// # Returns
///
/// The path written, or an error if directory creation or file writing fails.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir))]
pub async fn write_listing(
    export: &ListingExport,
    json_output_dir: &str,
) -> Result<PathBuf, Box<dyn Error>> {
    let json = serde_json::to_string_pretty(export)?;

    let full_json_dir = PathBuf::from(json_output_dir).join(&export.local_date);
    info!(full_json_dir = %full_json_dir.display(), "Ensuring JSON directory exists");
    if let Err(e) = fs::create_dir_all(&full_json_dir).await {
        error!(full_json_dir = %full_json_dir.display(), error = %e, "Failed to create JSON dir");
        return Err(e.into());
    }

    let output_json_filename = full_json_dir.join("listing.json");
    fs::write(&output_json_filename, json).await?;
    info!(
        path = %output_json_filename.display(),
        articles = export.articles.len(),
        "Wrote JSON listing export"
    );

    Ok(output_json_filename)
}
