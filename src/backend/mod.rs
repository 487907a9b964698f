//! Platform adapters for observability backends.
//!
//! Each adapter speaks one backend's wire format and normalizes field
//! names, timestamps, and pagination cursors into the shared data model
//! before anything else sees them. Vendor-specific shapes never leak past
//! this module boundary.
//!
//! Adapters perform no retries and no caching; every call is
//! independently retryable by the caller, and failures surface as typed
//! errors rather than silently-empty pages.

pub mod datadog;
pub mod grafana;

pub use datadog::DatadogPlatform;
pub use grafana::GrafanaPlatform;

use crate::core::config::{BackendKind, Config};
use crate::core::error::{LoomError, Result};
use crate::core::types::{Log, Span};
use crate::trace::Trace;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// A span or log query against a backend
#[derive(Debug, Clone)]
pub struct FetchQuery {
    /// Backend-specific query string, passed through verbatim
    pub query: String,
    /// Inclusive start of the time range
    pub start: DateTime<Utc>,
    /// Inclusive end of the time range
    pub end: DateTime<Utc>,
    /// Maximum results per page
    pub limit: usize,
    /// Opaque cursor from a previous page, if continuing
    pub cursor: Option<String>,
}

impl FetchQuery {
    /// Creates a query over a time range with the given page size
    pub fn new<S: Into<String>>(
        query: S,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Self {
        Self {
            query: query.into(),
            start,
            end,
            limit,
            cursor: None,
        }
    }

    /// Continue from an opaque cursor returned by a previous page
    pub fn with_cursor<S: Into<String>>(mut self, cursor: S) -> Self {
        self.cursor = Some(cursor.into());
        self
    }
}

/// One page of results plus an opaque continuation cursor.
///
/// Presence of the cursor means "more results may exist, re-call with
/// it"; absence means this is the final page. The cursor's content is
/// backend-specific and must never be interpreted by callers — only the
/// adapter that minted it may decode it.
#[derive(Debug, Clone)]
pub struct Page<T> {
    /// Results on this page
    pub items: Vec<T>,
    /// Opaque continuation cursor, absent on the final page
    pub next_cursor: Option<String>,
}

impl<T> Page<T> {
    /// A final page with no continuation
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_cursor: None,
        }
    }

    /// True when no further pages exist
    pub fn is_last(&self) -> bool {
        self.next_cursor.is_none()
    }
}

/// Distinct values per facet name
pub type FacetValues = HashMap<String, Vec<String>>;

/// Uniform async contract over backend variants.
///
/// Implementations are object-safe so the dispatcher can hand callers a
/// single polymorphic interface.
#[async_trait::async_trait]
pub trait Platform: Send + Sync {
    /// Fetch one page of logs matching the query
    async fn fetch_logs(&self, query: &FetchQuery) -> Result<Page<Log>>;

    /// Fetch one page of normalized spans matching the query
    async fn fetch_spans(&self, query: &FetchQuery) -> Result<Page<Span>>;

    /// Fetch one page of reconstructed traces matching the query.
    ///
    /// A single span search is not sufficient: the matching span may not
    /// be the root, so adapters fetch the complete span set per matched
    /// trace id before reconstruction.
    async fn fetch_traces(&self, query: &FetchQuery) -> Result<Page<Trace>>;

    /// Distinct values for each log facet over the time range,
    /// deduplicated, one aggregation round trip per facet
    async fn log_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues>;

    /// Distinct values for each span facet over the time range
    async fn span_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues>;

    /// Free-form query-language documentation for this backend, passed
    /// through to the calling agent rather than parsed
    fn query_guidance(&self) -> &'static str;
}

/// Selects the adapter for the configured backend.
///
/// Fails fast on a missing credential or endpoint; a misconfigured
/// adapter is never constructed.
pub fn platform_for(config: &Config) -> Result<Box<dyn Platform>> {
    config.validate()?;
    match config.backend {
        BackendKind::Datadog => {
            let dd = config
                .datadog
                .clone()
                .ok_or_else(|| LoomError::config("datadog configuration missing"))?;
            Ok(Box::new(DatadogPlatform::new(dd, config.query.clone())?))
        }
        BackendKind::Grafana => {
            let gf = config
                .grafana
                .clone()
                .ok_or_else(|| LoomError::config("grafana configuration missing"))?;
            Ok(Box::new(GrafanaPlatform::new(gf, config.query.clone())?))
        }
    }
}

/// Surfaces a non-2xx response as a typed error with the response body
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = status.as_u16(), "backend call failed");
    Err(LoomError::http_status(status.as_u16(), body))
}

/// Flattens a nested vendor attribute bag into dotted string keys.
///
/// Scalars are stringified, arrays joined with commas, objects recursed.
/// Nulls are dropped.
pub(crate) fn flatten_json(
    prefix: &str,
    value: &serde_json::Value,
    out: &mut HashMap<String, String>,
) {
    use serde_json::Value;
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (key, nested) in map {
                let key = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten_json(&key, nested, out);
            }
        }
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(scalar_to_string)
                .collect::<Vec<_>>()
                .join(",");
            out.insert(prefix.to_string(), joined);
        }
        scalar => {
            out.insert(prefix.to_string(), scalar_to_string(scalar));
        }
    }
}

fn scalar_to_string(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Deduplicates while preserving first-seen order
pub(crate) fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}
