//! HTTP trigger.
//!
//! An external scheduler hits `/` (or `/sources/:name`) and gets a one-line
//! report per source back. Recipient and SMTP settings are read from the
//! environment on every request, so fixing a missing variable does not need a
//! restart.
//!
//! | Route | Methods | Effect |
//! |-------|---------|--------|
//! | `/` | GET, POST | Run every configured source |
//! | `/sources/:name` | GET, POST | Run one source; 404 when unknown |
//! | `/healthz` | GET | `ok` |

use crate::config::{SmtpSettings, WatchConfig, recipient_from_env};
use crate::error::{ConfigError, RunError};
use crate::fetch::HttpFetcher;
use crate::models::RunReport;
use crate::notify::SmtpNotifier;
use crate::pipeline::{build_sources, run_all};
use crate::scrapers::Source;
use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use chrono::Utc;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WatchConfig>,
}

pub fn router(config: WatchConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(trigger_all).post(trigger_all))
        .route("/sources/:name", get(trigger_one).post(trigger_one))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until the process is stopped.
pub async fn serve(addr: &str, config: WatchConfig) -> std::io::Result<()> {
    if let Err(e) = SmtpSettings::from_env() {
        warn!(error = %e, "SMTP is not configured; triggers will fail until it is");
    }
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, sources = config.sources.len(), "Listening");
    axum::serve(listener, router(config)).await
}

async fn health() -> &'static str {
    "ok"
}

async fn trigger_all(State(state): State<AppState>) -> (StatusCode, String) {
    respond(trigger(&state.config, None).await)
}

async fn trigger_one(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> (StatusCode, String) {
    respond(trigger(&state.config, Some(&name)).await)
}

#[instrument(level = "info", skip(config))]
async fn trigger(config: &WatchConfig, only: Option<&str>) -> Result<Vec<RunReport>, RunError> {
    let sources = match only {
        Some(name) => vec![Source::from_config(config.source(name)?)?],
        None => build_sources(config)?,
    };
    let recipient = recipient_from_env()?;
    let notifier = SmtpNotifier::new(&SmtpSettings::from_env()?)?;
    let fetcher = HttpFetcher::new(&config.user_agent, config.http_timeout())?;
    run_all(config, &sources, &fetcher, &notifier, &recipient, Utc::now()).await
}

/// Turn a run outcome into the trigger's status and body.
pub fn respond(result: Result<Vec<RunReport>, RunError>) -> (StatusCode, String) {
    match result {
        Ok(reports) => {
            let body = reports
                .iter()
                .map(RunReport::message)
                .collect::<Vec<_>>()
                .join("\n");
            (StatusCode::OK, body)
        }
        Err(RunError::Config(e @ ConfigError::UnknownSource(_))) => {
            warn!(error = %e, "Rejected trigger");
            (StatusCode::NOT_FOUND, format!("Error: {e}"))
        }
        Err(RunError::Config(e @ ConfigError::MissingEnv { .. })) => {
            error!(error = %e, "Trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
        Err(e) => {
            error!(error = %e, "Trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn call(uri: &str) -> (StatusCode, String) {
        let response = router(WatchConfig::default())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_healthz() {
        assert_eq!(call("/healthz").await, (StatusCode::OK, "ok".to_string()));
    }

    #[tokio::test]
    async fn test_unknown_source_is_404() {
        let (status, body) = call("/sources/initech").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "Error: unknown source: initech");
    }

    #[test]
    fn test_respond_reports_one_line_per_source() {
        let reports = vec![
            RunReport {
                company: "ADP".to_string(),
                recipient: "me@example.com".to_string(),
                count: 4,
            },
            RunReport {
                company: "Amazon".to_string(),
                recipient: "me@example.com".to_string(),
                count: 0,
            },
        ];
        let (status, body) = respond(Ok(reports));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            "Sent email to me@example.com with 4 item(s).\nSent email to me@example.com with 0 item(s)."
        );
    }

    #[test]
    fn test_respond_missing_recipient() {
        let err = ConfigError::MissingEnv {
            name: "RECIPIENT_EMAIL",
        };
        let (status, body) = respond(Err(err.into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, "Missing RECIPIENT_EMAIL env var");
    }

    #[test]
    fn test_respond_other_errors_are_prefixed() {
        let err = ConfigError::InvalidEnv {
            name: "SMTP_PORT",
            reason: "invalid digit found in string".to_string(),
        };
        let (status, body) = respond(Err(err.into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("Error: invalid value for SMTP_PORT"));
    }
}
