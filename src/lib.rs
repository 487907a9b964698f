//! Traceloom - trace reconstruction engine for observability backends.
//!
//! Traceloom ingests raw, flat span records from heterogeneous
//! observability backends and reconstructs them into a normalized,
//! hierarchical trace model with per-service latency attribution, error
//! detection, and platform-agnostic pagination.
//!
//! # Features
//!
//! - **Root resolution**: deterministic root-span selection even when the
//!   backend truncates the span set
//! - **Hierarchy rebuilding**: flat parent references become an owned
//!   tree, cycle-safe against corrupted input
//! - **Latency attribution**: per-service wall-clock shares with
//!   overlapping intervals merged, never double-counted
//! - **Platform adapters**: Datadog and Grafana (Loki/Tempo) wire formats
//!   normalized at the boundary, pagination cursors kept opaque
//!
//! # Architecture
//!
//! - `core`: domain models, configuration, and errors
//! - `trace`: the pure reconstruction pipeline
//! - `backend`: platform adapters and the dispatcher
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use traceloom::backend::{platform_for, FetchQuery, Platform};
//! use traceloom::core::ConfigBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigBuilder::new().from_env()?.build()?;
//!     let platform = platform_for(&config)?;
//!     let end = chrono::Utc::now();
//!     let start = end - chrono::Duration::hours(1);
//!     let query = FetchQuery::new("service:checkout", start, end, 50);
//!     let page = platform.fetch_traces(&query).await?;
//!     for trace in &page.items {
//!         println!("{} spans={}", trace.trace_id, trace.display.span_count());
//!     }
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod backend;
pub mod cli;
pub mod core;
pub mod trace;

// Re-export core types for convenience
pub use crate::core::{Config, LoomError, Result};
