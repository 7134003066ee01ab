//! Data models for scraped postings and the payloads they come from.
//!
//! - [`JobPosting`]: one normalized job listing, the only domain entity
//! - [`Payload`]: a raw fetched body plus the URL it came from
//! - [`RunReport`]: what a finished run tells the trigger
//!
//! Everything here lives for a single run. Nothing is persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single job listing extracted from a source.
///
/// `(title, link)` is the identity used for deduplication. `link` has always
/// passed the source's link policy by the time a posting is constructed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct JobPosting {
    /// Visible title text, trimmed, inner whitespace collapsed.
    pub title: String,
    /// Employer name, constant per source.
    pub company: String,
    /// First known location token found near the posting, or empty.
    pub location: String,
    /// Canonical absolute URL of the job-detail page.
    pub link: String,
    /// The original recency fragment, e.g. `"5 days ago"`, or empty.
    pub posted_text: String,
    /// `posted_text` resolved to a point in time, when it could be.
    pub posted_at: Option<DateTime<Utc>>,
}

impl JobPosting {
    /// Identity key for deduplication.
    pub fn identity(&self) -> (String, String) {
        (self.title.clone(), self.link.clone())
    }
}

/// A fetched response body, tagged with how it should be extracted.
#[derive(Debug, Clone)]
pub enum Payload {
    Html { body: String, base_url: String },
    Json {
        value: serde_json::Value,
        base_url: String,
    },
}

impl Payload {
    pub fn base_url(&self) -> &str {
        match self {
            Payload::Html { base_url, .. } | Payload::Json { base_url, .. } => base_url,
        }
    }
}

/// Result of delivering one digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub company: String,
    pub recipient: String,
    pub count: usize,
}

impl RunReport {
    /// The human-readable line returned by the trigger.
    pub fn message(&self) -> String {
        format!(
            "Sent email to {} with {} item(s).",
            self.recipient, self.count
        )
    }
}
