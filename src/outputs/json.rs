//! JSON output of collected postings.

use crate::error::RunError;
use crate::models::JobPosting;
use crate::utils::slugify;
use chrono::{DateTime, Utc};
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Path of a source's JSON file for the run at `now`.
///
/// The file is named `{slug}-{date}.json`, so one run per day per source
/// keeps a single file and later runs that day overwrite it.
pub fn output_path(json_out_dir: &str, source_name: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}-{}.json",
        json_out_dir.trim_end_matches('/'),
        slugify(source_name),
        now.date_naive()
    )
}

/// Write `postings` for `source_name` under `json_out_dir`.
///
/// Returns the path written.
#[instrument(level = "info", skip_all, fields(json_out_dir = %json_out_dir, source = %source_name))]
pub async fn write_postings(
    postings: &[JobPosting],
    source_name: &str,
    json_out_dir: &str,
    now: DateTime<Utc>,
) -> Result<String, RunError> {
    let path = output_path(json_out_dir, source_name, now);
    let output = |source: std::io::Error| RunError::Output {
        path: path.clone(),
        source,
    };

    let json = serde_json::to_string_pretty(postings).map_err(|e| output(e.into()))?;
    if let Some(parent) = Path::new(&path).parent() {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(error = %e, "Failed to create JSON dir");
            return Err(output(e));
        }
    }
    fs::write(&path, json).await.map_err(output)?;
    info!(%path, count = postings.len(), "Wrote postings JSON");
    Ok(path)
}
