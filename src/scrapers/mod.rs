//! Employer job sources.
//!
//! Every employer is scraped through the same [`JobSource`] capability:
//!
//! 1. **Fetch**: request the configured endpoints and return raw payloads
//! 2. **Extract**: turn each payload into filtered, deduplicated postings
//!
//! Which implementation backs an employer is decided by its configuration:
//!
//! | Variant | Module | Chosen when | Method |
//! |---------|--------|-------------|--------|
//! | [`ListingSource`] | [`listing`] | no `search_api` | HTML listing page plus `?q=` variants |
//! | [`SearchApiSource`] | [`search_api`] | `search_api` set | JSON variants in order, HTML listing as fallback |
//!
//! # Common Patterns
//!
//! - Requests are made one at a time, in configured order
//! - A failed request is logged and contributes nothing
//! - An optional warm-up request picks up session cookies first

pub mod listing;
pub mod search_api;

pub use listing::ListingSource;
pub use search_api::SearchApiSource;

use crate::config::SourceConfig;
use crate::error::ConfigError;
use crate::extract::{ExtractContext, SourceProfile};
use crate::fetch::Fetch;
use crate::links::LinkPolicy;
use crate::models::{JobPosting, Payload};
use tracing::{debug, info};

/// The fetch-then-extract capability shared by all employers.
pub trait JobSource {
    /// Short identifier, e.g. `adp`.
    fn name(&self) -> &str;

    /// Employer name shown in the digest.
    fn company(&self) -> &str;

    /// Request this source's endpoints and return every usable payload.
    ///
    /// `ctx` lets a source that probes alternatives judge whether a payload
    /// actually yields postings before settling on it.
    async fn fetch<F: Fetch>(&self, fetcher: &F, ctx: &ExtractContext) -> Vec<Payload>;

    /// Extract postings from one payload.
    fn extract(&self, payload: &Payload, ctx: &ExtractContext) -> Vec<JobPosting>;

    /// Fetch, then extract every payload, in order.
    async fn collect<F: Fetch>(&self, fetcher: &F, ctx: &ExtractContext) -> Vec<JobPosting> {
        let payloads = self.fetch(fetcher, ctx).await;
        let postings: Vec<JobPosting> = payloads
            .iter()
            .flat_map(|payload| {
                let found = self.extract(payload, ctx);
                debug!(base_url = payload.base_url(), count = found.len(), "Extracted payload");
                found
            })
            .collect();
        info!(
            source = self.name(),
            payloads = payloads.len(),
            count = postings.len(),
            "Collected postings"
        );
        postings
    }
}

/// A configured employer, dispatching to its concrete source.
#[derive(Debug)]
pub enum Source {
    Listing(ListingSource),
    SearchApi(SearchApiSource),
}

impl Source {
    pub fn from_config(cfg: &SourceConfig) -> Result<Self, ConfigError> {
        let listing = ListingSource::from_config(cfg)?;
        Ok(match &cfg.search_api {
            Some(api) => Source::SearchApi(SearchApiSource::new(api.clone(), listing)),
            None => Source::Listing(listing),
        })
    }
}

impl JobSource for Source {
    fn name(&self) -> &str {
        match self {
            Source::Listing(s) => s.name(),
            Source::SearchApi(s) => s.name(),
        }
    }

    fn company(&self) -> &str {
        match self {
            Source::Listing(s) => s.company(),
            Source::SearchApi(s) => s.company(),
        }
    }

    async fn fetch<F: Fetch>(&self, fetcher: &F, ctx: &ExtractContext) -> Vec<Payload> {
        match self {
            Source::Listing(s) => s.fetch(fetcher, ctx).await,
            Source::SearchApi(s) => s.fetch(fetcher, ctx).await,
        }
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext) -> Vec<JobPosting> {
        match self {
            Source::Listing(s) => s.extract(payload, ctx),
            Source::SearchApi(s) => s.extract(payload, ctx),
        }
    }
}

pub(crate) fn profile_from_config(cfg: &SourceConfig) -> Result<SourceProfile, ConfigError> {
    Ok(SourceProfile {
        company: cfg.company.clone(),
        location_tokens: cfg.location_tokens.clone(),
        links: LinkPolicy::from_config(&cfg.name, &cfg.links)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_kind_follows_config() {
        let adp = Source::from_config(&SourceConfig::adp()).unwrap();
        assert!(matches!(adp, Source::Listing(_)));
        assert_eq!(adp.name(), "adp");
        assert_eq!(adp.company(), "ADP");

        let amazon = Source::from_config(&SourceConfig::amazon()).unwrap();
        assert!(matches!(amazon, Source::SearchApi(_)));
        assert_eq!(amazon.company(), "Amazon");
    }

    #[test]
    fn test_bad_link_pattern_fails_source_build() {
        let mut cfg = SourceConfig::adp();
        cfg.links.relative_prefix = "[".to_string();
        assert!(matches!(
            Source::from_config(&cfg),
            Err(ConfigError::Pattern { .. })
        ));
    }
}
