//! JSON output of a run's result.
//!
//! The document is the serialized [`PostDetails`] or `null` when no post was
//! found, so a consumer can tell "nothing new" from a failed run (which
//! writes nothing and exits non-zero).
//!
//! ```json
//! {
//!   "title": "New Finality Gadget Proposal",
//!   "link": "https://ethresear.ch/t/new-finality-gadget-proposal/4821",
//!   "topic_id": "4821",
//!   "authors": ["alice"],
//!   "timestamp": "2024-03-01T10:00:00+00:00"
//! }
//! ```

use std::path::Path;

use tokio::fs;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::PostDetails;

/// Render the result as pretty-printed JSON.
pub fn render_result(post: Option<&PostDetails>) -> Result<String> {
    Ok(serde_json::to_string_pretty(&post)?)
}

/// Write the result to `path`, creating parent directories as needed.
#[instrument(level = "info", skip_all, fields(path = %path.display()))]
pub async fn write_result(post: Option<&PostDetails>, path: &Path) -> Result<()> {
    let json = render_result(post)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create output dir");
            return Err(e.into());
        }
    }

    fs::write(path, json).await?;
    info!(found = post.is_some(), "Wrote JSON result");
    Ok(())
}
