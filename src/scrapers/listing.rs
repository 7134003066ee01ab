//! HTML listing-page source.
//!
//! Requests the configured listing URL, then the same URL once per query
//! term (`?q=software`, `?q=engineer`, ...) since many career sites filter
//! server-side on a query parameter. Every page that loads is run through the
//! heuristic [`HtmlExtractor`].

use super::{JobSource, profile_from_config};
use crate::config::{ListingConfig, SourceConfig};
use crate::error::ConfigError;
use crate::extract::html::HtmlExtractor;
use crate::extract::{ExtractContext, SourceProfile, json};
use crate::fetch::{Fetch, FetchRequest, fetch_payload};
use crate::models::{JobPosting, Payload};
use futures::stream::{self, StreamExt};
use tracing::{info, instrument};

#[derive(Debug)]
pub struct ListingSource {
    name: String,
    listing: ListingConfig,
    warmup_url: Option<String>,
    profile: SourceProfile,
    extractor: HtmlExtractor,
}

impl ListingSource {
    pub fn from_config(cfg: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            name: cfg.name.clone(),
            listing: cfg.listing.clone(),
            warmup_url: cfg.warmup_url.clone(),
            profile: profile_from_config(cfg)?,
            extractor: HtmlExtractor::from_config(&cfg.name, &cfg.candidates)?,
        })
    }

    pub fn warmup_url(&self) -> Option<&str> {
        self.warmup_url.as_deref()
    }

    /// Base listing first, then one request per query term.
    pub fn requests(&self) -> Vec<FetchRequest> {
        std::iter::once(FetchRequest::html(&self.listing.url))
            .chain(self.listing.query_terms.iter().map(|term| {
                FetchRequest::html(&self.listing.url).with_query(&self.listing.query_param, term)
            }))
            .collect()
    }

    /// Fetch the listing pages without the warm-up request.
    #[instrument(level = "info", skip_all, fields(source = %self.name))]
    pub async fn fetch_pages<F: Fetch>(&self, fetcher: &F) -> Vec<Payload> {
        let base_url = self.listing.url.as_str();
        let pages: Vec<Payload> = stream::iter(self.requests())
            .then(|request| async move { fetch_payload(fetcher, &request, base_url).await })
            .filter_map(std::future::ready)
            .collect()
            .await;
        info!(count = pages.len(), "Fetched listing pages");
        pages
    }

    pub(crate) fn extract_payload(&self, payload: &Payload, ctx: &ExtractContext) -> Vec<JobPosting> {
        match payload {
            Payload::Html { body, base_url } => {
                self.extractor.extract(body, base_url, &self.profile, ctx)
            }
            Payload::Json { value, base_url } => json::extract(value, base_url, &self.profile, ctx),
        }
    }
}

impl JobSource for ListingSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn company(&self) -> &str {
        &self.profile.company
    }

    async fn fetch<F: Fetch>(&self, fetcher: &F, _ctx: &ExtractContext) -> Vec<Payload> {
        if let Some(url) = self.warmup_url() {
            fetcher.warm_up(url).await;
        }
        self.fetch_pages(fetcher).await
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext) -> Vec<JobPosting> {
        self.extract_payload(payload, ctx)
    }
}
