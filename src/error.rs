//! Typed errors for each stage of a run.
//!
//! Only [`ConfigError`] and [`NotifyError`] can fail a run. A [`FetchError`]
//! is absorbed by the source that hit it: the failing candidate contributes
//! zero postings and the pipeline moves on. The one exception is failing to
//! build the HTTP client at all.

use thiserror::Error;

/// Missing or invalid configuration. Fatal to the request, never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment value is absent or blank
    #[error("Missing {name} env var")]
    MissingEnv { name: &'static str },

    /// An environment value is present but unusable
    #[error("invalid value for {name}: {reason}")]
    InvalidEnv { name: &'static str, reason: String },

    /// The config file could not be read
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid YAML for [`crate::config::WatchConfig`]
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// A link policy pattern failed to compile
    #[error("invalid link pattern for source {source_name}: {source}")]
    Pattern {
        source_name: String,
        #[source]
        source: regex::Error,
    },

    /// A link policy root URL failed to parse
    #[error("invalid root URL for source {source_name}: {source}")]
    RootUrl {
        source_name: String,
        #[source]
        source: url::ParseError,
    },

    /// A candidate CSS selector failed to parse
    #[error("invalid title selector for source {source_name}: {reason}")]
    Selector { source_name: String, reason: String },

    /// No configured source has the requested name
    #[error("unknown source: {0}")]
    UnknownSource(String),
}

/// A single candidate request failed.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS, or timeout failure
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body was expected to be JSON and was not
    #[error("malformed JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client itself could not be built
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Digest delivery failed. Fatal to the request, never retried.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Sender or recipient is not a valid mailbox
    #[error("invalid address {address}: {source}")]
    Address {
        address: String,
        #[source]
        source: lettre::address::AddressError,
    },

    /// The MIME message could not be assembled
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    /// The SMTP relay refused or dropped the message
    #[error("SMTP delivery failed: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Anything that ends a run early, as surfaced to the trigger.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Notify(#[from] NotifyError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
