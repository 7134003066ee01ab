//! HTTP fetching behind a small trait.
//!
//! # Architecture
//!
//! - [`Fetch`]: the one capability sources need, "GET this and give me the body"
//! - [`HttpFetcher`]: the reqwest implementation used in production
//! - [`fetch_payload`]: turns a body into a [`Payload`] and absorbs failures
//!
//! A failed candidate request is never fatal. Callers get `None` and the
//! source simply contributes nothing from that URL.

use crate::error::FetchError;
use crate::models::Payload;
use crate::utils::truncate_for_log;
use reqwest::header::{ACCEPT, HeaderValue};
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// What kind of body a request expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Html,
    Json,
}

impl PayloadKind {
    fn accept(self) -> &'static str {
        match self {
            PayloadKind::Html => "text/html,application/xhtml+xml;q=0.9,*/*;q=0.8",
            PayloadKind::Json => "application/json, text/plain, */*",
        }
    }
}

/// A single GET request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub kind: PayloadKind,
}

impl FetchRequest {
    pub fn html(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            kind: PayloadKind::Html,
        }
    }

    pub fn json(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            query: Vec::new(),
            kind: PayloadKind::Json,
        }
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

/// Trait for issuing GET requests.
///
/// Implementors return the response body as text, or an error for transport
/// failures and non-success statuses.
pub trait Fetch {
    async fn get(&self, request: &FetchRequest) -> Result<String, FetchError>;

    /// Request `url` once to establish session cookies. Failure is logged only.
    async fn warm_up(&self, url: &str) {
        match self.get(&FetchRequest::html(url)).await {
            Ok(_) => debug!(%url, "Warm-up request succeeded"),
            Err(e) => warn!(%url, error = %e, "Warm-up request failed; continuing without it"),
        }
    }
}

/// reqwest-backed [`Fetch`] with a cookie jar that lives for one run.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }
}

impl Fetch for HttpFetcher {
    #[instrument(level = "info", skip_all, fields(url = %request.url))]
    async fn get(&self, request: &FetchRequest) -> Result<String, FetchError> {
        let t0 = Instant::now();
        let transport = |source| FetchError::Transport {
            url: request.url.clone(),
            source,
        };

        let response = self
            .client
            .get(&request.url)
            .query(&request.query)
            .header(ACCEPT, HeaderValue::from_static(request.kind.accept()))
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: request.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(transport)?;
        info!(
            bytes = body.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched"
        );
        Ok(body)
    }
}

/// Fetch `request` and wrap the body as a [`Payload`].
///
/// `base_url` is recorded on the payload for resolving relative links. Any
/// failure, including a JSON body that does not parse, is logged and turned
/// into `None`.
pub async fn fetch_payload<F: Fetch>(
    fetcher: &F,
    request: &FetchRequest,
    base_url: &str,
) -> Option<Payload> {
    let result = match fetcher.get(request).await {
        Ok(body) => into_payload(request, body, base_url),
        Err(e) => Err(e),
    };
    match result {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(url = %request.url, query = ?request.query, error = %e, "Skipping source");
            None
        }
    }
}

fn into_payload(request: &FetchRequest, body: String, base_url: &str) -> Result<Payload, FetchError> {
    match request.kind {
        PayloadKind::Html => Ok(Payload::Html {
            body,
            base_url: base_url.to_string(),
        }),
        PayloadKind::Json => {
            let value = serde_json::from_str(&body).map_err(|source| {
                debug!(preview = %truncate_for_log(&body, 200), "Body is not JSON");
                FetchError::Json {
                    url: request.url.clone(),
                    source,
                }
            })?;
            Ok(Payload::Json {
                value,
                base_url: base_url.to_string(),
            })
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory [`Fetch`] for tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned bodies keyed by URL plus query string; anything else is a 404.
    #[derive(Debug, Default)]
    pub struct FakeFetcher {
        pages: HashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, key: &str, body: &str) -> Self {
            self.pages.insert(key.to_string(), body.to_string());
            self
        }

        pub fn key(request: &FetchRequest) -> String {
            if request.query.is_empty() {
                return request.url.clone();
            }
            let query = request
                .query
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("&");
            format!("{}?{}", request.url, query)
        }

        pub fn seen(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Fetch for FakeFetcher {
        async fn get(&self, request: &FetchRequest) -> Result<String, FetchError> {
            let key = Self::key(request);
            self.requests.lock().unwrap().push(key.clone());
            self.pages.get(&key).cloned().ok_or(FetchError::Status {
                url: request.url.clone(),
                status: 404,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeFetcher;
    use super::*;

    #[test]
    fn test_request_builders() {
        let req = FetchRequest::json("https://api.example/search")
            .with_query("q", "rust")
            .with_query("offset", "0");
        assert_eq!(req.kind, PayloadKind::Json);
        assert_eq!(FakeFetcher::key(&req), "https://api.example/search?q=rust&offset=0");
        assert_eq!(FetchRequest::html("https://a.example").kind, PayloadKind::Html);
    }

    #[tokio::test]
    async fn test_fetch_payload_html() {
        let fetcher = FakeFetcher::new().with("https://a.example/list", "<html></html>");
        let payload = fetch_payload(&fetcher, &FetchRequest::html("https://a.example/list"), "https://a.example/list")
            .await
            .unwrap();
        assert!(matches!(payload, Payload::Html { ref body, .. } if body == "<html></html>"));
        assert_eq!(payload.base_url(), "https://a.example/list");
    }

    #[tokio::test]
    async fn test_fetch_payload_failure_is_none() {
        let fetcher = FakeFetcher::new();
        let payload = fetch_payload(&fetcher, &FetchRequest::html("https://down.example"), "https://down.example").await;
        assert!(payload.is_none());
        assert_eq!(fetcher.seen(), vec!["https://down.example".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_payload_malformed_json_is_none() {
        let fetcher = FakeFetcher::new().with("https://api.example/s", "<html>blocked</html>");
        let payload = fetch_payload(&fetcher, &FetchRequest::json("https://api.example/s"), "https://api.example").await;
        assert!(payload.is_none());
    }

    #[tokio::test]
    async fn test_fetch_payload_json() {
        let fetcher = FakeFetcher::new().with("https://api.example/s", r#"{"jobs": []}"#);
        let payload = fetch_payload(&fetcher, &FetchRequest::json("https://api.example/s"), "https://api.example").await;
        assert!(matches!(payload, Some(Payload::Json { .. })));
    }

    #[tokio::test]
    async fn test_warm_up_failure_does_not_panic() {
        let fetcher = FakeFetcher::new();
        fetcher.warm_up("https://www.amazon.jobs/en/").await;
        assert_eq!(fetcher.seen().len(), 1);
    }

    #[test]
    fn test_http_fetcher_builds() {
        assert!(HttpFetcher::new("Mozilla/5.0", Duration::from_secs(5)).is_ok());
    }
}
