//! Markup output.
//!
//! A file target is written to a sibling temporary file first and then
//! renamed over the destination, so a page rewritten in place is never
//! observed half-written.

use std::error::Error;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::{self, AsyncWriteExt};
use tracing::{info, instrument};

/// Write `markup` to `output`, or to stdout when no path is given.
#[instrument(level = "info", skip_all, fields(output = ?output))]
pub async fn write_markup(markup: &str, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = output else {
        let mut stdout = io::stdout();
        stdout.write_all(markup.as_bytes()).await?;
        stdout.flush().await?;
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let staging = staging_path(path);
    fs::write(&staging, markup).await?;
    if let Err(e) = fs::rename(&staging, path).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }

    info!(path = %path.display(), bytes = markup.len(), "Wrote listing markup");
    Ok(())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
