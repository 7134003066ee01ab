//! # Job Watch
//!
//! Scrapes employer career pages, keeps the postings whose titles mention a
//! role keyword, and emails a digest per employer.
//!
//! ## Features
//!
//! - HTML listing pages scraped with loose, pluggable candidate predicates
//! - Undocumented JSON search APIs probed first where an employer has one
//! - Canonical job links only; apply and sign-in redirects are rejected
//! - Free-text posting dates normalized to UTC
//! - HTML digest with a plain-text fallback and a `jobs.csv` attachment
//!
//! ## Usage
//!
//! ```sh
//! job_watch serve --bind 0.0.0.0:8080
//! job_watch run --source adp --dry-run
//! ```
//!
//! ## Architecture
//!
//! The application follows a pipeline architecture, one source at a time:
//! 1. **Fetching**: request listing pages or search API variants
//! 2. **Extracting**: find postings, filter by keyword, normalize links and dates
//! 3. **Merging**: deduplicate and cap
//! 4. **Delivery**: render the digest and send it (or print it on `--dry-run`)

use chrono::Utc;
use clap::Parser;
use std::error::Error;
use tracing::{debug, error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod dates;
mod digest;
mod error;
mod extract;
mod fallback;
mod fetch;
mod links;
mod models;
mod notify;
mod outputs;
mod pipeline;
mod scrapers;
mod server;
mod utils;

use cli::{Cli, Command};
use config::{RECIPIENT_ENV, SmtpSettings, WatchConfig};
use error::{ConfigError, RunError};
use fetch::HttpFetcher;
use notify::SmtpNotifier;
use outputs::json;
use scrapers::{JobSource, Source};
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("job_watch starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.command, "Parsed CLI arguments");

    let config = WatchConfig::load(args.config.as_deref())?;

    match args.command {
        Command::Serve { bind } => server::serve(&bind, config).await?,
        Command::Run {
            source,
            recipient,
            dry_run,
            json_out,
        } => {
            let options = RunOptions {
                source,
                recipient,
                dry_run,
                json_out,
            };
            if let Err(e) = run_once(&config, &options).await {
                error!(error = %e, "Run failed");
                return Err(e.into());
            }
        }
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    Ok(())
}

#[derive(Debug)]
struct RunOptions {
    source: Option<String>,
    recipient: Option<String>,
    dry_run: bool,
    json_out: Option<String>,
}

/// One CLI run: every source (or just `--source`), sequentially.
async fn run_once(config: &WatchConfig, options: &RunOptions) -> Result<(), RunError> {
    let sources = match &options.source {
        Some(name) => vec![Source::from_config(config.source(name)?)?],
        None => pipeline::build_sources(config)?,
    };

    // Early check: ensure JSON output dir is writable
    if let Some(dir) = &options.json_out {
        ensure_writable_dir(dir).await.map_err(|source| RunError::Output {
            path: dir.clone(),
            source,
        })?;
    }

    let notifier = if options.dry_run {
        None
    } else {
        let recipient = options
            .recipient
            .clone()
            .ok_or(ConfigError::MissingEnv {
                name: RECIPIENT_ENV,
            })?;
        Some((SmtpNotifier::new(&SmtpSettings::from_env()?)?, recipient))
    };

    let fetcher = HttpFetcher::new(&config.user_agent, config.http_timeout())?;
    let now = Utc::now();

    for source in &sources {
        let postings = pipeline::collect_postings(config, source, &fetcher, now).await;

        if let Some(dir) = &options.json_out {
            json::write_postings(&postings, source.name(), dir, now).await?;
        }

        match &notifier {
            Some((notifier, recipient)) => {
                let report =
                    pipeline::deliver(config, source.company(), &postings, notifier, recipient)
                        .await?;
                println!("{}", report.message());
            }
            None => {
                let rendered = digest::render(source.company(), &config.role_keywords, &postings);
                println!("{}", rendered.html);
            }
        }
    }
    Ok(())
}
