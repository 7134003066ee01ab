//! Run configuration.
//!
//! [`WatchConfig`] holds everything a run needs that used to be hard-coded:
//! role keywords, result cap, HTTP settings and the list of sources. It loads
//! from a YAML file, or falls back to [`WatchConfig::default`], which watches
//! ADP and Amazon for software roles.
//!
//! SMTP credentials never live in the file. [`SmtpSettings`] reads them from
//! the environment through a lookup function so tests can supply their own.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;
pub const RECIPIENT_ENV: &str = "RECIPIENT_EMAIL";

/// Top-level configuration for a run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Case-insensitive substrings; a title must contain at least one.
    pub role_keywords: Vec<String>,
    /// Postings kept per digest after deduplication.
    pub max_results: usize,
    /// Per-request timeout in seconds.
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub sources: Vec<SourceConfig>,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            role_keywords: vec![
                "software".to_string(),
                "developer".to_string(),
                "engineer".to_string(),
            ],
            max_results: 200,
            http_timeout_secs: 30,
            user_agent: "Mozilla/5.0".to_string(),
            sources: vec![SourceConfig::adp(), SourceConfig::amazon()],
        }
    }
}

impl WatchConfig {
    /// Load from `path` if given, otherwise use the built-in defaults.
    #[instrument(level = "info")]
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using built-in sources");
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        info!(sources = config.sources.len(), "Loaded configuration");
        Ok(config)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(raw)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn source(&self, name: &str) -> Result<&SourceConfig, ConfigError> {
        self.sources
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| ConfigError::UnknownSource(name.to_string()))
    }
}

/// One employer to watch.
///
/// A source with `search_api` set probes the JSON endpoint first and only
/// scrapes `listing` if every variant comes back empty.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    /// Short identifier used by the trigger and CLI, e.g. `adp`.
    pub name: String,
    /// Employer name shown in the digest.
    pub company: String,
    pub listing: ListingConfig,
    /// Page requested once before anything else to pick up session cookies.
    #[serde(default)]
    pub warmup_url: Option<String>,
    #[serde(default)]
    pub search_api: Option<SearchApiConfig>,
    pub links: LinkPolicyConfig,
    /// Checked in order against the text around each posting.
    #[serde(default)]
    pub location_tokens: Vec<String>,
    #[serde(default)]
    pub candidates: CandidateConfig,
}

/// HTML listing page plus its keyword-query variants.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ListingConfig {
    pub url: String,
    #[serde(default = "default_query_param")]
    pub query_param: String,
    /// One extra request per term, as `?{query_param}={term}`.
    #[serde(default)]
    pub query_terms: Vec<String>,
}

fn default_query_param() -> String {
    "q".to_string()
}

/// JSON search endpoint and the query variants to probe, in priority order.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchApiConfig {
    pub endpoint: String,
    pub variants: Vec<BTreeMap<String, String>>,
}

/// What a canonical job link looks like for a source.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LinkPolicyConfig {
    /// Registrable domain; subdomains are accepted.
    pub domain: String,
    /// Path fragment every job-detail URL contains, e.g. `/jobs/`.
    pub path_segment: String,
    /// Regex a relative href must match to be resolved.
    pub relative_prefix: String,
    /// Base for resolving accepted relative hrefs.
    pub root_url: String,
}

/// Which elements count as candidate job titles in HTML mode.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CandidateConfig {
    /// Substrings looked for in attribute values (case-insensitive).
    pub attribute_hints: Vec<String>,
    /// Extra CSS selectors whose matches are always candidates.
    pub selectors: Vec<String>,
}

impl Default for CandidateConfig {
    fn default() -> Self {
        Self {
            attribute_hints: vec!["job".to_string(), "title".to_string()],
            selectors: Vec::new(),
        }
    }
}

impl SourceConfig {
    pub fn adp() -> Self {
        Self {
            name: "adp".to_string(),
            company: "ADP".to_string(),
            listing: ListingConfig {
                url: "https://jobs.adp.com/en/jobs/".to_string(),
                query_param: default_query_param(),
                query_terms: vec![
                    "software".to_string(),
                    "engineer".to_string(),
                    "developer".to_string(),
                ],
            },
            warmup_url: None,
            search_api: None,
            links: LinkPolicyConfig {
                domain: "jobs.adp.com".to_string(),
                path_segment: "/jobs/".to_string(),
                relative_prefix: r"^/(?:[a-z]{2}/)?jobs/\d+".to_string(),
                root_url: "https://jobs.adp.com".to_string(),
            },
            location_tokens: ["United States", "India", "Canada", "Remote", "Hybrid"]
                .into_iter()
                .map(String::from)
                .collect(),
            candidates: CandidateConfig::default(),
        }
    }

    pub fn amazon() -> Self {
        let variant = |query: &str| {
            BTreeMap::from([
                ("base_query".to_string(), query.to_string()),
                ("offset".to_string(), "0".to_string()),
                ("result_limit".to_string(), "100".to_string()),
                ("sort".to_string(), "recent".to_string()),
                ("country".to_string(), "USA".to_string()),
            ])
        };
        Self {
            name: "amazon".to_string(),
            company: "Amazon".to_string(),
            listing: ListingConfig {
                url: "https://www.amazon.jobs/content/en/job-categories/software-development"
                    .to_string(),
                query_param: default_query_param(),
                query_terms: Vec::new(),
            },
            warmup_url: Some("https://www.amazon.jobs/en/".to_string()),
            search_api: Some(SearchApiConfig {
                endpoint: "https://www.amazon.jobs/en/search.json".to_string(),
                variants: vec![
                    variant("software development engineer"),
                    variant("software engineer"),
                    variant("software"),
                ],
            }),
            links: LinkPolicyConfig {
                domain: "amazon.jobs".to_string(),
                path_segment: "/jobs/".to_string(),
                relative_prefix: r"^/(?:[a-z]{2}(?:-[a-z]{2})?/)?jobs/\d+".to_string(),
                root_url: "https://www.amazon.jobs".to_string(),
            },
            location_tokens: [
                "Seattle",
                "Arlington",
                "Austin",
                "New York",
                "Sunnyvale",
                "Boston",
                "United States",
                "Remote",
                "Hybrid",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            candidates: CandidateConfig::default(),
        }
    }
}

/// SMTP relay settings, from `SMTP_USER`, `SMTP_PASS`, `SMTP_HOST`, `SMTP_PORT`.
#[derive(Clone)]
pub struct SmtpSettings {
    pub user: String,
    pub pass: String,
    pub host: String,
    pub port: u16,
}

impl std::fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .finish_non_exhaustive()
    }
}

impl SmtpSettings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build settings from any key lookup. Blank values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let user = get("SMTP_USER").ok_or(ConfigError::MissingEnv { name: "SMTP_USER" })?;
        let pass = get("SMTP_PASS").ok_or(ConfigError::MissingEnv { name: "SMTP_PASS" })?;
        let host = get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string());
        let port = match get("SMTP_PORT") {
            Some(raw) => raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                ConfigError::InvalidEnv {
                    name: "SMTP_PORT",
                    reason: e.to_string(),
                }
            })?,
            None => DEFAULT_SMTP_PORT,
        };
        Ok(Self {
            user,
            // App passwords are displayed with spaces; the relay wants them without.
            pass: pass.split_whitespace().collect(),
            host,
            port,
        })
    }
}

/// Read the digest recipient from the environment.
pub fn recipient_from_env() -> Result<String, ConfigError> {
    recipient_from_lookup(|name| std::env::var(name).ok())
}

pub fn recipient_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
    lookup(RECIPIENT_ENV)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::MissingEnv {
            name: RECIPIENT_ENV,
        })
}
