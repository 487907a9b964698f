//! Datadog platform adapter.
//!
//! Speaks the Datadog v2 search and analytics APIs and normalizes their
//! event envelopes into the shared model. Pagination uses Datadog's
//! native `meta.page.after` cursor, passed through opaquely.

use crate::backend::{
    check_status, dedup_preserving_order, flatten_json, FacetValues, FetchQuery, Page, Platform,
};
use crate::core::config::{DatadogConfig, QueryConfig};
use crate::core::error::{LoomError, Result};
use crate::core::types::{Log, LogLevel, ServiceName, Span, SpanId, TraceId};
use crate::trace::{extract_trace_ids, reconstruct, Trace};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;

/// Page size used when hydrating the complete span sets of matched traces
const HYDRATE_PAGE_LIMIT: usize = 1000;

const QUERY_GUIDANCE: &str = r#"Datadog search syntax.

Queries are space-separated terms combined with AND by default. A term is
either free text (matched against log messages) or a `key:value` filter:

  service:checkout            spans/logs from one service
  env:production              deployment environment
  status:error                log status / span outcome
  resource_name:"GET /cart"   quote values containing spaces
  @http.status_code:>=500     attribute filters use the @ prefix and
                              support >, >=, <, <= comparators
  @error.type:Timeout*        trailing wildcard matches prefixes

Combine with explicit boolean operators and parentheses:

  service:checkout AND (status:error OR @http.status_code:>=500)
  service:(checkout OR billing) -env:staging

A leading minus negates a term. `trace_id:<id>` restricts spans to one
trace. An empty query or `*` matches everything in the time range."#;

/// Adapter for a Datadog-style tracing platform
pub struct DatadogPlatform {
    client: reqwest::Client,
    base_url: String,
    query_config: QueryConfig,
}

impl DatadogPlatform {
    /// Constructs the adapter, failing fast when a credential is missing
    pub fn new(config: DatadogConfig, query_config: QueryConfig) -> Result<Self> {
        if config.site.is_empty() {
            return Err(LoomError::config("datadog.site is required"));
        }
        if config.api_key.is_empty() {
            return Err(LoomError::config("datadog.api_key is required"));
        }
        if config.app_key.is_empty() {
            return Err(LoomError::config("datadog.app_key is required"));
        }

        let mut headers = reqwest::header::HeaderMap::new();
        let mut api_key = reqwest::header::HeaderValue::from_str(&config.api_key)
            .map_err(|_| LoomError::config("datadog.api_key contains invalid characters"))?;
        api_key.set_sensitive(true);
        headers.insert("DD-API-KEY", api_key);
        let mut app_key = reqwest::header::HeaderValue::from_str(&config.app_key)
            .map_err(|_| LoomError::config("datadog.app_key contains invalid characters"))?;
        app_key.set_sensitive(true);
        headers.insert("DD-APPLICATION-KEY", app_key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(query_config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: format!("https://api.{}", config.site),
            query_config,
        })
    }

    /// Overrides the API base URL (proxies, tests)
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post_json<R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<R> {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!(%url, "datadog request");
        let response = self.client.post(&url).json(&body).send().await?;
        let response = check_status(response).await?;
        let payload = response
            .json()
            .await
            .map_err(|e| LoomError::parse(format!("malformed Datadog response: {}", e)))?;
        Ok(payload)
    }

    /// Follows the hydration query across pages until the cursor drains
    /// or the configured page cap is hit.
    async fn hydrate_trace_spans(
        &self,
        trace_ids: &[TraceId],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Span>> {
        let id_list = trace_ids
            .iter()
            .map(TraceId::as_str)
            .collect::<Vec<_>>()
            .join(" OR ");
        let mut query = FetchQuery::new(
            format!("trace_id:({})", id_list),
            start,
            end,
            HYDRATE_PAGE_LIMIT,
        );

        let mut spans = Vec::new();
        for _ in 0..self.query_config.trace_page_cap {
            let page = self.fetch_spans(&query).await?;
            spans.extend(page.items);
            match page.next_cursor {
                Some(cursor) => query.cursor = Some(cursor),
                None => return Ok(spans),
            }
        }
        tracing::warn!(
            pages = self.query_config.trace_page_cap,
            "trace hydration hit page cap, span sets may be incomplete"
        );
        Ok(spans)
    }

    async fn facet_values(
        &self,
        path: &str,
        wrap_in_envelope: bool,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues> {
        let mut values = FacetValues::new();
        // One aggregation round trip per facet, issued sequentially
        for facet in facets {
            let attributes = json!({
                "compute": [{"aggregation": "count"}],
                "filter": {
                    "from": start.to_rfc3339(),
                    "to": end.to_rfc3339(),
                    "query": "*",
                },
                "group_by": [{
                    "facet": facet,
                    "limit": 100,
                    "sort": {"aggregation": "count", "order": "desc"},
                }],
            });
            let buckets = if wrap_in_envelope {
                let response: SpansAggregateResponse = self
                    .post_json(path, json!({"data": {"type": "aggregate_request", "attributes": attributes}}))
                    .await?;
                response
                    .data
                    .into_iter()
                    .map(|bucket| bucket.attributes.by)
                    .collect::<Vec<_>>()
            } else {
                let response: LogsAggregateResponse = self.post_json(path, attributes).await?;
                response
                    .data
                    .buckets
                    .into_iter()
                    .map(|bucket| bucket.by)
                    .collect()
            };
            let facet_values: Vec<String> = buckets
                .into_iter()
                .filter_map(|mut by| by.remove(facet))
                .map(|value| match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect();
            values.insert(facet.clone(), dedup_preserving_order(facet_values));
        }
        Ok(values)
    }
}

#[async_trait::async_trait]
impl Platform for DatadogPlatform {
    async fn fetch_logs(&self, query: &FetchQuery) -> Result<Page<Log>> {
        let mut page = json!({"limit": query.limit});
        if let Some(cursor) = &query.cursor {
            page["cursor"] = json!(cursor);
        }
        let body = json!({
            "filter": {
                "query": query.query,
                "from": query.start.to_rfc3339(),
                "to": query.end.to_rfc3339(),
            },
            "page": page,
            "sort": "timestamp",
        });
        let response: SearchResponse<LogAttributes> =
            self.post_json("/api/v2/logs/events/search", body).await?;

        let next_cursor = response.after_cursor();
        let logs = response
            .data
            .into_iter()
            .map(|event| normalize_log(event.attributes))
            .collect();
        Ok(Page {
            items: logs,
            next_cursor,
        })
    }

    async fn fetch_spans(&self, query: &FetchQuery) -> Result<Page<Span>> {
        let mut page = json!({"limit": query.limit});
        if let Some(cursor) = &query.cursor {
            page["cursor"] = json!(cursor);
        }
        let body = json!({
            "data": {
                "type": "search_request",
                "attributes": {
                    "filter": {
                        "query": query.query,
                        "from": query.start.to_rfc3339(),
                        "to": query.end.to_rfc3339(),
                    },
                    "page": page,
                    "sort": "timestamp",
                },
            },
        });
        let response: SearchResponse<SpanAttributes> =
            self.post_json("/api/v2/spans/events/search", body).await?;

        let next_cursor = response.after_cursor();
        let spans = response
            .data
            .into_iter()
            .filter_map(|event| normalize_span(event.attributes))
            .collect();
        Ok(Page {
            items: spans,
            next_cursor,
        })
    }

    async fn fetch_traces(&self, query: &FetchQuery) -> Result<Page<Trace>> {
        // First pass: find spans matching the query. The matching span may
        // not be the root, so a second pass fetches each trace in full.
        let first = self.fetch_spans(query).await?;
        let mut trace_ids = extract_trace_ids(&first.items);
        if trace_ids.len() > self.query_config.max_trace_ids {
            tracing::warn!(
                matched = trace_ids.len(),
                cap = self.query_config.max_trace_ids,
                "capping hydrated traces for this page"
            );
            trace_ids.truncate(self.query_config.max_trace_ids);
        }
        if trace_ids.is_empty() {
            return Ok(Page {
                items: Vec::new(),
                next_cursor: first.next_cursor,
            });
        }

        let spans = self
            .hydrate_trace_spans(&trace_ids, query.start, query.end)
            .await?;
        Ok(Page {
            items: reconstruct(spans),
            next_cursor: first.next_cursor,
        })
    }

    async fn log_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues> {
        self.facet_values("/api/v2/logs/analytics/aggregate", false, start, end, facets)
            .await
    }

    async fn span_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues> {
        self.facet_values("/api/v2/spans/analytics/aggregate", true, start, end, facets)
            .await
    }

    fn query_guidance(&self) -> &'static str {
        QUERY_GUIDANCE
    }
}

// --- wire format ---

#[derive(Debug, Deserialize)]
struct SearchResponse<T> {
    #[serde(default)]
    data: Vec<EventEnvelope<T>>,
    #[serde(default)]
    meta: Option<Meta>,
}

impl<T> SearchResponse<T> {
    fn after_cursor(&self) -> Option<String> {
        self.meta
            .as_ref()
            .and_then(|meta| meta.page.as_ref())
            .and_then(|page| page.after.clone())
    }
}

#[derive(Debug, Deserialize)]
struct EventEnvelope<T> {
    attributes: T,
}

#[derive(Debug, Deserialize)]
struct Meta {
    #[serde(default)]
    page: Option<MetaPage>,
}

#[derive(Debug, Deserialize)]
struct MetaPage {
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LogAttributes {
    timestamp: Option<String>,
    message: Option<String>,
    service: Option<String>,
    status: Option<String>,
    tags: Vec<String>,
    attributes: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SpanAttributes {
    trace_id: Option<String>,
    span_id: Option<String>,
    parent_id: Option<String>,
    service: Option<String>,
    env: Option<String>,
    resource_name: Option<String>,
    operation_name: Option<String>,
    start_timestamp: Option<String>,
    end_timestamp: Option<String>,
    status: Option<String>,
    tags: Vec<String>,
    custom: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct LogsAggregateResponse {
    #[serde(default)]
    data: LogsAggregateData,
}

#[derive(Debug, Default, Deserialize)]
struct LogsAggregateData {
    #[serde(default)]
    buckets: Vec<AggregateBucket>,
}

#[derive(Debug, Deserialize)]
struct SpansAggregateResponse {
    #[serde(default)]
    data: Vec<SpansAggregateBucket>,
}

#[derive(Debug, Deserialize)]
struct SpansAggregateBucket {
    attributes: AggregateBucket,
}

#[derive(Debug, Default, Deserialize)]
struct AggregateBucket {
    #[serde(default)]
    by: HashMap<String, serde_json::Value>,
}

// --- normalization ---

fn parse_rfc3339(value: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = value?;
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(_) => {
            tracing::debug!(timestamp = raw, "unparseable timestamp, dropping");
            None
        }
    }
}

/// Splits a Datadog `key:value` tag; a bare tag maps to an empty value
fn split_tag(tag: &str) -> (&str, &str) {
    match tag.split_once(':') {
        Some((key, value)) => (key, value),
        None => (tag, ""),
    }
}

fn normalize_log(attrs: LogAttributes) -> Log {
    let mut bag = HashMap::new();
    flatten_json("", &attrs.attributes, &mut bag);
    for tag in &attrs.tags {
        let (key, value) = split_tag(tag);
        bag.insert(key.to_string(), value.to_string());
    }

    let level = attrs
        .status
        .as_deref()
        .map(LogLevel::parse)
        .unwrap_or_default();
    let mut log = Log::new(
        parse_rfc3339(attrs.timestamp.as_deref()),
        attrs.message.unwrap_or_default(),
        attrs.service,
        level,
    );
    if !bag.is_empty() {
        log.attributes = Some(bag);
    }
    log
}

/// Normalizes one span event; events without both ids are dropped with a
/// warning rather than failing the batch.
fn normalize_span(attrs: SpanAttributes) -> Option<Span> {
    let (Some(trace_id), Some(span_id)) = (attrs.trace_id, attrs.span_id) else {
        tracing::warn!("span event missing trace_id or span_id, dropping");
        return None;
    };
    let trace_id = TraceId::new(trace_id).ok()?;
    let span_id = SpanId::new(span_id).ok()?;
    let service =
        ServiceName::new(attrs.service.unwrap_or_else(|| "unknown".to_string())).ok()?;

    let mut tags = HashMap::new();
    flatten_json("", &attrs.custom, &mut tags);
    for tag in &attrs.tags {
        let (key, value) = split_tag(tag);
        tags.insert(key.to_string(), value.to_string());
    }

    let mut builder = Span::builder()
        .trace_id(trace_id)
        .span_id(span_id)
        .service(service)
        .operation(attrs.operation_name.unwrap_or_default())
        .resource(attrs.resource_name.unwrap_or_default());
    if let Some(parent_id) = attrs.parent_id.filter(|p| !p.is_empty() && p.as_str() != "0") {
        builder = builder.parent_id(SpanId::new(parent_id).ok()?);
    }
    if let Some(start) = parse_rfc3339(attrs.start_timestamp.as_deref()) {
        builder = builder.start_time(start);
    }
    if let Some(end) = parse_rfc3339(attrs.end_timestamp.as_deref()) {
        builder = builder.end_time(end);
    }
    if let Some(status) = attrs.status {
        builder = builder.status(status);
    }
    if let Some(env) = attrs.env {
        builder = builder.environment(env);
    }

    let mut span = builder.build().ok()?;
    span.tags = tags;
    Some(span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn span_attrs(value: serde_json::Value) -> SpanAttributes {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_span_full() {
        let attrs = span_attrs(json!({
            "trace_id": "4185029442",
            "span_id": "7234",
            "parent_id": "7000",
            "service": "checkout",
            "env": "prod",
            "resource_name": "GET /cart",
            "operation_name": "http.request",
            "start_timestamp": "2024-05-01T12:00:00Z",
            "end_timestamp": "2024-05-01T12:00:02Z",
            "status": "ok",
            "tags": ["env:prod", "version:1.2"],
            "custom": {"http": {"status_code": 200}},
        }));
        let span = normalize_span(attrs).unwrap();
        assert_eq!(span.trace_id.as_str(), "4185029442");
        assert_eq!(span.parent_id.as_ref().unwrap().as_str(), "7000");
        assert_eq!(span.service.as_str(), "checkout");
        assert_eq!(span.resource, "GET /cart");
        assert_eq!(span.environment.as_deref(), Some("prod"));
        assert_eq!(span.duration_seconds(), Some(2.0));
        assert_eq!(span.get_tag("http.status_code"), Some("200"));
        assert_eq!(span.get_tag("version"), Some("1.2"));
    }

    #[test]
    fn test_normalize_span_missing_ids_dropped() {
        let attrs = span_attrs(json!({"service": "checkout"}));
        assert!(normalize_span(attrs).is_none());
    }

    #[test]
    fn test_normalize_span_zero_parent_is_root() {
        let attrs = span_attrs(json!({
            "trace_id": "t",
            "span_id": "s",
            "parent_id": "0",
        }));
        let span = normalize_span(attrs).unwrap();
        assert!(span.is_root());
        assert_eq!(span.service.as_str(), "unknown");
    }

    #[test]
    fn test_normalize_span_bad_timestamp_degrades() {
        let attrs = span_attrs(json!({
            "trace_id": "t",
            "span_id": "s",
            "start_timestamp": "not-a-time",
            "end_timestamp": "2024-05-01T12:00:02Z",
        }));
        let span = normalize_span(attrs).unwrap();
        assert!(span.start_time.is_none());
        assert!(span.end_time.is_some());
        assert_eq!(span.duration_seconds(), None);
    }

    #[test]
    fn test_normalize_log() {
        let attrs: LogAttributes = serde_json::from_value(json!({
            "timestamp": "2024-05-01T12:00:00Z",
            "message": "payment declined",
            "service": "billing",
            "status": "warning",
            "tags": ["env:prod"],
            "attributes": {"customer": {"id": 42}},
        }))
        .unwrap();
        let log = normalize_log(attrs);
        assert_eq!(log.level, LogLevel::Warn);
        assert_eq!(log.service.as_deref(), Some("billing"));
        let bag = log.attributes.unwrap();
        assert_eq!(bag.get("customer.id"), Some(&"42".to_string()));
        assert_eq!(bag.get("env"), Some(&"prod".to_string()));
    }

    #[test]
    fn test_cursor_extraction() {
        let response: SearchResponse<LogAttributes> = serde_json::from_value(json!({
            "data": [],
            "meta": {"page": {"after": "eyJhZnRlciI6"}},
        }))
        .unwrap();
        assert_eq!(response.after_cursor().as_deref(), Some("eyJhZnRlciI6"));

        let response: SearchResponse<LogAttributes> =
            serde_json::from_value(json!({"data": []})).unwrap();
        assert!(response.after_cursor().is_none());
    }

    #[test]
    fn test_new_requires_credentials() {
        let config = DatadogConfig {
            site: "datadoghq.com".to_string(),
            api_key: String::new(),
            app_key: "app".to_string(),
        };
        assert!(DatadogPlatform::new(config, QueryConfig::default()).is_err());
    }
}
