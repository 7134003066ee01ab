//! JSON search-API source with HTML fallback.
//!
//! Some career sites expose an undocumented search endpoint that is far more
//! reliable than their listing markup. Query variants are probed in priority
//! order and probing stops at the first variant that produces at least one
//! usable posting. Only when every variant comes back empty, or fails, are
//! the HTML listing pages scraped instead.

use super::{JobSource, ListingSource};
use crate::config::SearchApiConfig;
use crate::extract::ExtractContext;
use crate::fallback::first_non_empty;
use crate::fetch::{Fetch, FetchRequest, fetch_payload};
use crate::models::{JobPosting, Payload};
use std::collections::BTreeMap;
use tracing::{info, instrument, warn};

#[derive(Debug)]
pub struct SearchApiSource {
    api: SearchApiConfig,
    listing: ListingSource,
}

impl SearchApiSource {
    pub fn new(api: SearchApiConfig, listing: ListingSource) -> Self {
        Self { api, listing }
    }

    pub fn request(&self, variant: &BTreeMap<String, String>) -> FetchRequest {
        variant
            .iter()
            .fold(FetchRequest::json(&self.api.endpoint), |req, (k, v)| {
                req.with_query(k, v)
            })
    }

    /// Probe the JSON variants; `None` when none yields a posting.
    #[instrument(level = "info", skip_all, fields(source = %self.listing.name()))]
    async fn probe_variants<F: Fetch>(
        &self,
        fetcher: &F,
        ctx: &ExtractContext,
    ) -> Option<Vec<Payload>> {
        first_non_empty(self.api.variants.iter().enumerate(), |(index, variant)| async move {
            let request = self.request(variant);
            let Some(payload) = fetch_payload(fetcher, &request, &self.api.endpoint).await else {
                return Vec::new();
            };
            let usable = self.extract(&payload, ctx).len();
            info!(variant = index, usable, "Probed search variant");
            if usable > 0 { vec![payload] } else { Vec::new() }
        })
        .await
    }
}

impl JobSource for SearchApiSource {
    fn name(&self) -> &str {
        self.listing.name()
    }

    fn company(&self) -> &str {
        self.listing.company()
    }

    /// The first JSON variant with postings, or else the HTML listing pages.
    async fn fetch<F: Fetch>(&self, fetcher: &F, ctx: &ExtractContext) -> Vec<Payload> {
        if let Some(url) = self.listing.warmup_url() {
            fetcher.warm_up(url).await;
        }
        match self.probe_variants(fetcher, ctx).await {
            Some(payloads) => payloads,
            None => {
                warn!(
                    source = self.name(),
                    "Search API yielded no postings; falling back to HTML listing"
                );
                self.listing.fetch_pages(fetcher).await
            }
        }
    }

    fn extract(&self, payload: &Payload, ctx: &ExtractContext) -> Vec<JobPosting> {
        self.listing.extract_payload(payload, ctx)
    }
}
