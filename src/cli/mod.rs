//! Command-line interface for traceloom.
//!
//! Runs a single query against the configured backend and prints the
//! normalized results as NDJSON, following the pagination cursor for as
//! many pages as requested.

use crate::backend::{platform_for, FetchQuery, Platform};
use crate::core::{Config, ConfigBuilder, LoomError, Result};
use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trace reconstruction engine for observability backends
#[derive(Parser, Debug)]
#[command(name = "traceloom")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (default: ~/.config/traceloom/config.yaml)
    #[arg(short, long, env = "TRACELOOM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "TRACELOOM_DEBUG")]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Shared time-range and paging arguments
#[derive(clap::Args, Debug)]
pub struct RangeArgs {
    /// Range start, RFC 3339 (default: one hour ago)
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Range end, RFC 3339 (default: now)
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,

    /// Results per page (default: from configuration)
    #[arg(long)]
    pub limit: Option<usize>,

    /// Pages to follow before stopping
    #[arg(long, default_value = "1")]
    pub pages: usize,
}

impl RangeArgs {
    fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let end = self.end.unwrap_or_else(Utc::now);
        let start = self.start.unwrap_or(end - Duration::hours(1));
        (start, end)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Search logs
    Logs {
        /// Backend-specific query string
        #[arg(default_value = "")]
        query: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Search spans
    Spans {
        #[arg(default_value = "")]
        query: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Search and reconstruct traces
    Traces {
        #[arg(default_value = "")]
        query: String,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Enumerate distinct log facet values
    LogFacets {
        /// Facet names (default: from configuration)
        facets: Vec<String>,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Enumerate distinct span facet values
    SpanFacets {
        facets: Vec<String>,
        #[command(flatten)]
        range: RangeArgs,
    },
    /// Print the backend's query-language guidance
    Guidance,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Initialize logging for the binary. The library itself never
    /// installs a subscriber.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::EnvFilter;

        let default_level = if self.debug { "debug" } else { "warn" };
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .try_init()
            .map_err(|e| LoomError::config(format!("Failed to initialize logging: {}", e)))?;
        Ok(())
    }

    /// Load configuration with file then environment precedence.
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = if let Some(path) = &self.config {
            Some(path.clone())
        } else {
            dirs::config_dir()
                .map(|dir| dir.join("traceloom").join("config.yaml"))
                .filter(|path| path.exists())
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                    tracing::debug!("Loaded configuration from {:?}", path);
                }
                Err(e) => {
                    return Err(LoomError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                }
            }
        }

        builder.from_env()?.build()
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

/// Follows the cursor for up to `pages` pages, printing each page's items
macro_rules! run_paged {
    ($platform:expr, $query:expr, $pages:expr, $fetch:ident) => {{
        let mut query = $query;
        for _ in 0..$pages.max(1) {
            let page = $platform.$fetch(&query).await?;
            for item in &page.items {
                print_json(item)?;
            }
            match page.next_cursor {
                Some(cursor) => query.cursor = Some(cursor),
                None => break,
            }
        }
        Ok(())
    }};
}

/// Execute the parsed command.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;
    let config = cli.load_config().await?;
    let platform = platform_for(&config)?;

    match &cli.command {
        Command::Logs { query, range } => {
            let (start, end) = range.window();
            let limit = range.limit.unwrap_or(config.query.default_limit);
            let fetch_query = FetchQuery::new(query.clone(), start, end, limit);
            run_paged!(platform, fetch_query, range.pages, fetch_logs)
        }
        Command::Spans { query, range } => {
            let (start, end) = range.window();
            let limit = range.limit.unwrap_or(config.query.default_limit);
            let fetch_query = FetchQuery::new(query.clone(), start, end, limit);
            run_paged!(platform, fetch_query, range.pages, fetch_spans)
        }
        Command::Traces { query, range } => {
            let (start, end) = range.window();
            let limit = range.limit.unwrap_or(config.query.default_limit);
            let fetch_query = FetchQuery::new(query.clone(), start, end, limit);
            run_paged!(platform, fetch_query, range.pages, fetch_traces)
        }
        Command::LogFacets { facets, range } => {
            let (start, end) = range.window();
            let facets = if facets.is_empty() {
                &config.facets.log_facets
            } else {
                facets
            };
            let values = platform.log_facet_values(start, end, facets).await?;
            print_json(&values)
        }
        Command::SpanFacets { facets, range } => {
            let (start, end) = range.window();
            let facets = if facets.is_empty() {
                &config.facets.span_facets
            } else {
                facets
            };
            let values = platform.span_facet_values(start, end, facets).await?;
            print_json(&values)
        }
        Command::Guidance => {
            println!("{}", platform.query_guidance());
            Ok(())
        }
    }
}
