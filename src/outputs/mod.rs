//! Output generation for the rendered listing and its JSON export.
//!
//! # Submodules
//!
//! - [`html`]: Writes the rewritten host page (or the bare fragment)
//! - [`json`]: Writes the run's records for API consumption
//!
//! # Output Structure
//!
//! ```text
//! --output berita.html          # rewritten page, replaced atomically
//!
//! json_output_dir/
//! └── 2025-05-06/
//!     └── listing.json
//! ```

pub mod html;
pub mod json;
