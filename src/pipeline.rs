//! One run: collect, filter, cap, render, deliver.
//!
//! ```text
//! JobSource::collect ─► keyword refilter ─► dedupe ─► cap ─► digest::render ─► Notify::send
//! ```
//!
//! Sources run one after another. A digest is sent even when nothing
//! matched; the first delivery error ends the run.

use crate::config::WatchConfig;
use crate::digest;
use crate::error::RunError;
use crate::extract::{ExtractContext, dedupe, matches_keywords};
use crate::fetch::Fetch;
use crate::models::{JobPosting, RunReport};
use crate::notify::{DigestMessage, Notify};
use crate::scrapers::{JobSource, Source};
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

/// Build every configured source.
pub fn build_sources(config: &WatchConfig) -> Result<Vec<Source>, RunError> {
    Ok(config
        .sources
        .iter()
        .map(Source::from_config)
        .collect::<Result<Vec<_>, _>>()?)
}

/// Collect one source's postings, merged and capped at `max_results`.
#[instrument(level = "info", skip_all, fields(source = source.name()))]
pub async fn collect_postings<S: JobSource, F: Fetch>(
    config: &WatchConfig,
    source: &S,
    fetcher: &F,
    now: DateTime<Utc>,
) -> Vec<JobPosting> {
    let ctx = ExtractContext::new(&config.role_keywords, now);
    let collected = source.collect(fetcher, &ctx).await;
    let merged = collected.len();

    let mut postings = dedupe(
        collected
            .into_iter()
            .filter(|job| matches_keywords(&job.title, &ctx.keywords))
            .collect(),
    );
    postings.truncate(config.max_results);
    info!(merged, kept = postings.len(), cap = config.max_results, "Merged postings");
    postings
}

/// Scrape one source and email its digest to `recipient`.
#[instrument(level = "info", skip_all, fields(source = source.name(), %recipient))]
pub async fn run_source<S: JobSource, F: Fetch, N: Notify>(
    config: &WatchConfig,
    source: &S,
    fetcher: &F,
    notifier: &N,
    recipient: &str,
    now: DateTime<Utc>,
) -> Result<RunReport, RunError> {
    let postings = collect_postings(config, source, fetcher, now).await;
    deliver(config, source.company(), &postings, notifier, recipient).await
}

/// Render and send the digest for already collected postings.
pub async fn deliver<N: Notify>(
    config: &WatchConfig,
    company: &str,
    postings: &[JobPosting],
    notifier: &N,
    recipient: &str,
) -> Result<RunReport, RunError> {
    let rendered = digest::render(company, &config.role_keywords, postings);
    notifier
        .send(&DigestMessage::new(recipient, rendered))
        .await?;

    let report = RunReport {
        company: company.to_string(),
        recipient: recipient.to_string(),
        count: postings.len(),
    };
    info!(company, count = report.count, "Digest delivered");
    Ok(report)
}

/// Run every source in order, one digest each.
pub async fn run_all<F: Fetch, N: Notify>(
    config: &WatchConfig,
    sources: &[Source],
    fetcher: &F,
    notifier: &N,
    recipient: &str,
    now: DateTime<Utc>,
) -> Result<Vec<RunReport>, RunError> {
    let mut reports = Vec::with_capacity(sources.len());
    for source in sources {
        reports.push(run_source(config, source, fetcher, notifier, recipient, now).await?);
    }
    Ok(reports)
}
