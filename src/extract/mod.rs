//! Turning fetched payloads into [`JobPosting`]s.
//!
//! Two modes share the same filtering rules:
//!
//! | Mode | Module | Input |
//! |------|--------|-------|
//! | HTML | [`html`] | A listing page; titles found by pluggable candidate predicates |
//! | JSON | [`json`] | A search API response whose result key is not guaranteed |
//!
//! In both modes a posting is emitted only when its title contains a role
//! keyword and its link survives the source's [`LinkPolicy`]. Each page's
//! result is deduplicated before it is returned.

pub mod html;
pub mod json;

use crate::links::LinkPolicy;
use crate::models::JobPosting;
use chrono::{DateTime, Utc};
use itertools::Itertools;

/// Run-wide extraction settings.
#[derive(Debug, Clone)]
pub struct ExtractContext {
    /// Lower-cased role keywords.
    pub keywords: Vec<String>,
    /// Reference time for relative dates.
    pub now: DateTime<Utc>,
}

impl ExtractContext {
    pub fn new(keywords: &[String], now: DateTime<Utc>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            now,
        }
    }
}

/// Per-source extraction settings.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub company: String,
    pub location_tokens: Vec<String>,
    pub links: LinkPolicy,
}

/// Case-insensitive substring match against any keyword.
pub fn matches_keywords(title: &str, keywords: &[String]) -> bool {
    let title = title.to_lowercase();
    keywords.iter().any(|k| title.contains(k.as_str()))
}

/// First token, in configured order, that appears in `context`.
pub fn find_location(context: &str, tokens: &[String]) -> String {
    tokens
        .iter()
        .find(|token| context.contains(token.as_str()))
        .cloned()
        .unwrap_or_default()
}

/// Keep the first posting for each `(title, link)` pair.
pub fn dedupe(postings: Vec<JobPosting>) -> Vec<JobPosting> {
    postings.into_iter().unique_by(JobPosting::identity).collect()
}
