//! Command-line interface definitions for Job Watch.
//!
//! All options can be provided via command-line flags or environment
//! variables.

use clap::{Parser, Subcommand};

/// Scrape employer career pages and email a digest of matching roles.
///
/// # Examples
///
/// ```sh
/// # Serve the HTTP trigger
/// job_watch serve --bind 0.0.0.0:8080
///
/// # One run against a single source, printing the digest instead of mailing it
/// job_watch run --source adp --dry-run
///
/// # Mail every source's digest and keep the postings as JSON
/// job_watch --config watch.yaml run --recipient me@example.com --json-out ./out
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML config file; built-in sources are used otherwise
    #[arg(short, long, global = true, env = "JOB_WATCH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Serve the HTTP trigger
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
        bind: String,
    },

    /// Run once and exit
    Run {
        /// Only run this source (by name, e.g. `adp`)
        #[arg(short, long)]
        source: Option<String>,

        /// Digest recipient
        #[arg(short, long, env = "RECIPIENT_EMAIL")]
        recipient: Option<String>,

        /// Print the HTML digest instead of sending it
        #[arg(long)]
        dry_run: bool,

        /// Directory to write each source's postings to as JSON
        #[arg(short, long)]
        json_out: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_parsing() {
        let cli = Cli::parse_from(["job_watch", "serve", "--bind", "127.0.0.1:9000"]);
        assert_eq!(
            cli.command,
            Command::Serve {
                bind: "127.0.0.1:9000".to_string()
            }
        );
    }

    #[test]
    fn test_run_flags() {
        let cli = Cli::parse_from([
            "job_watch",
            "run",
            "-s",
            "amazon",
            "--recipient",
            "me@example.com",
            "--dry-run",
            "-j",
            "/tmp/jobs",
        ]);
        assert_eq!(
            cli.command,
            Command::Run {
                source: Some("amazon".to_string()),
                recipient: Some("me@example.com".to_string()),
                dry_run: true,
                json_out: Some("/tmp/jobs".to_string()),
            }
        );
    }

    #[test]
    fn test_config_is_global() {
        let cli = Cli::parse_from(["job_watch", "run", "--dry-run", "--config", "watch.yaml"]);
        assert_eq!(cli.config.as_deref(), Some("watch.yaml"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["job_watch"]).is_err());
    }
}
