//! Canonical job-link resolution.
//!
//! Career sites mix job-detail links with login gates, account pages and
//! "apply" redirects. A [`LinkPolicy`] accepts only hrefs that point at a
//! job-detail page of the expected domain and path shape, and rejects
//! everything else with `None`. It never guesses.

use crate::config::LinkPolicyConfig;
use crate::error::ConfigError;
use regex::Regex;
use url::Url;

/// Compiled link rules for one source.
#[derive(Debug, Clone)]
pub struct LinkPolicy {
    domain: String,
    path_segment: String,
    relative_prefix: Regex,
    root: Url,
}

impl LinkPolicy {
    /// Compile a policy from its configuration.
    pub fn from_config(source_name: &str, cfg: &LinkPolicyConfig) -> Result<Self, ConfigError> {
        let relative_prefix = Regex::new(&cfg.relative_prefix).map_err(|source| ConfigError::Pattern {
            source_name: source_name.to_string(),
            source,
        })?;
        let root = Url::parse(&cfg.root_url).map_err(|source| ConfigError::RootUrl {
            source_name: source_name.to_string(),
            source,
        })?;
        Ok(Self {
            domain: cfg.domain.trim_start_matches("www.").to_lowercase(),
            path_segment: cfg.path_segment.clone(),
            relative_prefix,
            root,
        })
    }

    /// Resolve `href` to a canonical job URL, or reject it.
    pub fn normalize(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() || href.starts_with('#') {
            return None;
        }
        let lower = href.to_lowercase();
        if ["javascript:", "mailto:", "tel:", "data:"]
            .iter()
            .any(|scheme| lower.starts_with(scheme))
        {
            return None;
        }

        if let Some(rest) = href.strip_prefix("//") {
            return self.accept_absolute(&format!("https://{rest}"));
        }
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return self.accept_absolute(href);
        }
        if lower.contains(':') && !lower.starts_with('/') {
            // Some other scheme
            return None;
        }

        if !self.relative_prefix.is_match(href) {
            return None;
        }
        let joined = self.root.join(href).ok()?;
        self.accept_url(joined)
    }

    fn accept_absolute(&self, href: &str) -> Option<String> {
        self.accept_url(Url::parse(href).ok()?)
    }

    fn accept_url(&self, mut url: Url) -> Option<String> {
        if !matches!(url.scheme(), "http" | "https") {
            return None;
        }
        let host = url.host_str()?.to_lowercase();
        let on_domain = host == self.domain || host.ends_with(&format!(".{}", self.domain));
        if !on_domain || !url.path().contains(&self.path_segment) {
            return None;
        }
        url.set_fragment(None);
        Some(url.to_string())
    }
}
