//! Grafana stack adapter: Loki for logs, Tempo for traces.
//!
//! Neither API exposes a native pagination cursor, so the adapter mints a
//! time-stepping indicator: the nanosecond timestamp just before the
//! oldest result on a full page, used as the next call's end bound. Each
//! step strictly narrows the window, so pagination terminates. Callers
//! treat the indicator as opaque; only this adapter decodes it.

use crate::backend::{
    check_status, dedup_preserving_order, FacetValues, FetchQuery, Page, Platform,
};
use crate::core::config::{GrafanaConfig, QueryConfig};
use crate::core::error::{LoomError, Result};
use crate::core::types::{Log, LogLevel, ServiceName, Span, SpanId, TraceId};
use crate::trace::{reconstruct, Trace};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

const QUERY_GUIDANCE: &str = r#"Grafana query syntax.

Logs use LogQL. A query is a stream selector plus optional line filters:

  {service_name="checkout"}                      one service's logs
  {service_name="checkout", env="prod"}          multiple label matchers
  {job=~"billing.*"}                             regex label matcher
  {service_name="checkout"} |= "declined"        line contains text
  {service_name="checkout"} != "healthcheck"     line excludes text
  {service_name="checkout"} | json | status >= 500
                                                 parse and filter fields

Traces use TraceQL. A query is a span filter in braces:

  {}                                             every trace in range
  {resource.service.name = "checkout"}           by service
  {span.http.status_code >= 500}                 by span attribute
  {status = error}                               failed spans
  {resource.service.name = "checkout" && duration > 500ms}
                                                 combined conditions"#;

/// Adapter for a Grafana-style stack (Loki logs, Tempo traces)
pub struct GrafanaPlatform {
    client: reqwest::Client,
    loki_url: String,
    tempo_url: String,
    auth: Option<(String, String)>,
    query_config: QueryConfig,
}

impl GrafanaPlatform {
    /// Constructs the adapter, failing fast when an endpoint is missing
    pub fn new(config: GrafanaConfig, query_config: QueryConfig) -> Result<Self> {
        if config.loki_url.is_empty() {
            return Err(LoomError::config("grafana.loki_url is required"));
        }
        if config.tempo_url.is_empty() {
            return Err(LoomError::config("grafana.tempo_url is required"));
        }
        let auth = match (config.username, config.password) {
            (Some(username), Some(password)) => Some((username, password)),
            (None, None) => None,
            _ => {
                return Err(LoomError::config(
                    "grafana basic auth requires both username and password",
                ))
            }
        };

        let client = reqwest::Client::builder()
            .timeout(query_config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            loki_url: config.loki_url.trim_end_matches('/').to_string(),
            tempo_url: config.tempo_url.trim_end_matches('/').to_string(),
            auth,
            query_config,
        })
    }

    async fn get_json<R: serde::de::DeserializeOwned>(
        &self,
        url: String,
        params: &[(&str, String)],
    ) -> Result<R> {
        tracing::debug!(%url, "grafana request");
        let mut request = self.client.get(&url).query(params);
        if let Some((username, password)) = &self.auth {
            request = request.basic_auth(username, Some(password));
        }
        let response = check_status(request.send().await?).await?;
        let payload = response
            .json()
            .await
            .map_err(|e| LoomError::parse(format!("malformed Grafana response: {}", e)))?;
        Ok(payload)
    }

    /// Decodes a cursor this adapter minted: the next window's end bound
    /// in unix nanoseconds.
    fn decode_cursor(&self, query: &FetchQuery) -> Result<i64> {
        match &query.cursor {
            None => Ok(to_nanos(query.end)),
            Some(cursor) => cursor.parse().map_err(|_| {
                LoomError::InvalidQuery(format!("unrecognized pagination cursor '{}'", cursor))
            }),
        }
    }

    async fn search_tempo(
        &self,
        query: &FetchQuery,
    ) -> Result<(Vec<TempoTraceSummary>, Option<String>)> {
        let end_nanos = self.decode_cursor(query)?;
        let traceql = if query.query.trim().is_empty() {
            "{}".to_string()
        } else {
            query.query.clone()
        };
        let params = [
            ("q", traceql),
            ("start", to_nanos(query.start).div_euclid(1_000_000_000).to_string()),
            ("end", end_nanos.div_euclid(1_000_000_000).max(1).to_string()),
            ("limit", query.limit.to_string()),
        ];
        let response: TempoSearchResponse = self
            .get_json(format!("{}/api/search", self.tempo_url), &params)
            .await?;

        let traces = response.traces;
        let next_cursor = if traces.len() >= query.limit && query.limit > 0 {
            traces
                .iter()
                .filter_map(|trace| trace.start_nanos())
                .min()
                .map(|oldest| (oldest - 1).to_string())
        } else {
            None
        };
        Ok((traces, next_cursor))
    }
}

#[async_trait::async_trait]
impl Platform for GrafanaPlatform {
    async fn fetch_logs(&self, query: &FetchQuery) -> Result<Page<Log>> {
        let end_nanos = self.decode_cursor(query)?;
        let params = [
            ("query", query.query.clone()),
            ("start", to_nanos(query.start).to_string()),
            ("end", end_nanos.to_string()),
            ("limit", query.limit.to_string()),
            ("direction", "backward".to_string()),
        ];
        let response: LokiQueryResponse = self
            .get_json(format!("{}/loki/api/v1/query_range", self.loki_url), &params)
            .await?;

        let mut entries: Vec<(i64, Log)> = Vec::new();
        for stream in response.data.result {
            for value in &stream.values {
                if let Some(entry) = normalize_loki_entry(&stream.stream, value) {
                    entries.push(entry);
                }
            }
        }
        // Newest first across all streams
        entries.sort_by_key(|(nanos, _)| std::cmp::Reverse(*nanos));
        entries.truncate(query.limit);

        let next_cursor = if entries.len() >= query.limit && query.limit > 0 {
            entries.last().map(|(oldest, _)| (oldest - 1).to_string())
        } else {
            None
        };
        Ok(Page {
            items: entries.into_iter().map(|(_, log)| log).collect(),
            next_cursor,
        })
    }

    async fn fetch_spans(&self, query: &FetchQuery) -> Result<Page<Span>> {
        let (summaries, next_cursor) = self.search_tempo(query).await?;
        let spans = summaries
            .iter()
            .flat_map(flatten_summary_spans)
            .collect();
        Ok(Page {
            items: spans,
            next_cursor,
        })
    }

    async fn fetch_traces(&self, query: &FetchQuery) -> Result<Page<Trace>> {
        let (summaries, next_cursor) = self.search_tempo(query).await?;
        let mut trace_ids: Vec<String> = dedup_preserving_order(
            summaries.into_iter().map(|summary| summary.trace_id).collect(),
        );
        trace_ids.retain(|id| !id.is_empty());
        if trace_ids.len() > self.query_config.max_trace_ids {
            tracing::warn!(
                matched = trace_ids.len(),
                cap = self.query_config.max_trace_ids,
                "capping hydrated traces for this page"
            );
            trace_ids.truncate(self.query_config.max_trace_ids);
        }

        // The search result carries only matched spans; fetch each trace
        // in full so reconstruction sees the complete span set.
        let mut spans: Vec<Span> = Vec::new();
        for trace_id in &trace_ids {
            let payload: TempoTraceResponse = self
                .get_json(format!("{}/api/traces/{}", self.tempo_url, trace_id), &[])
                .await?;
            spans.extend(normalize_otlp_trace(trace_id, payload));
        }

        Ok(Page {
            items: reconstruct(spans),
            next_cursor,
        })
    }

    async fn log_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues> {
        let mut values = FacetValues::new();
        for facet in facets {
            let params = [
                ("start", to_nanos(start).to_string()),
                ("end", to_nanos(end).to_string()),
            ];
            let response: LokiLabelValuesResponse = self
                .get_json(
                    format!("{}/loki/api/v1/label/{}/values", self.loki_url, facet),
                    &params,
                )
                .await?;
            values.insert(facet.clone(), dedup_preserving_order(response.data));
        }
        Ok(values)
    }

    async fn span_facet_values(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        facets: &[String],
    ) -> Result<FacetValues> {
        let mut values = FacetValues::new();
        for facet in facets {
            let params = [
                ("start", to_nanos(start).div_euclid(1_000_000_000).to_string()),
                ("end", to_nanos(end).div_euclid(1_000_000_000).max(1).to_string()),
            ];
            let response: TempoTagValuesResponse = self
                .get_json(
                    format!("{}/api/v2/search/tag/{}/values", self.tempo_url, facet),
                    &params,
                )
                .await?;
            let facet_values = response
                .tag_values
                .into_iter()
                .filter_map(|value| match value {
                    serde_json::Value::String(s) => Some(s),
                    serde_json::Value::Object(mut map) => match map.remove("value") {
                        Some(serde_json::Value::String(s)) => Some(s),
                        Some(other) => Some(other.to_string()),
                        None => None,
                    },
                    _ => None,
                })
                .collect();
            values.insert(facet.clone(), dedup_preserving_order(facet_values));
        }
        Ok(values)
    }

    fn query_guidance(&self) -> &'static str {
        QUERY_GUIDANCE
    }
}

fn to_nanos(instant: DateTime<Utc>) -> i64 {
    instant.timestamp_nanos_opt().unwrap_or(i64::MAX)
}

// --- Loki wire format ---

#[derive(Debug, Deserialize)]
struct LokiQueryResponse {
    #[serde(default)]
    data: LokiData,
}

#[derive(Debug, Default, Deserialize)]
struct LokiData {
    #[serde(default)]
    result: Vec<LokiStream>,
}

#[derive(Debug, Deserialize)]
struct LokiStream {
    #[serde(default)]
    stream: HashMap<String, String>,
    /// `[nanosecond timestamp, line]` pairs
    #[serde(default)]
    values: Vec<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct LokiLabelValuesResponse {
    #[serde(default)]
    data: Vec<String>,
}

fn normalize_loki_entry(labels: &HashMap<String, String>, value: &[String]) -> Option<(i64, Log)> {
    let [nanos, line, ..] = value else {
        tracing::debug!("malformed Loki entry, dropping");
        return None;
    };
    let nanos: i64 = match nanos.parse() {
        Ok(parsed) => parsed,
        Err(_) => {
            tracing::debug!(timestamp = %nanos, "unparseable Loki timestamp, dropping");
            return None;
        }
    };

    let service = ["service_name", "service", "job"]
        .iter()
        .find_map(|key| labels.get(*key))
        .cloned();
    let level = ["level", "detected_level", "severity"]
        .iter()
        .find_map(|key| labels.get(*key))
        .map(|raw| LogLevel::parse(raw))
        .unwrap_or_default();

    let mut log = Log::new(
        Some(DateTime::from_timestamp_nanos(nanos)),
        line.clone(),
        service,
        level,
    );
    if !labels.is_empty() {
        log.attributes = Some(labels.clone());
    }
    Some((nanos, log))
}

// --- Tempo wire format ---

#[derive(Debug, Deserialize)]
struct TempoSearchResponse {
    #[serde(default)]
    traces: Vec<TempoTraceSummary>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TempoTraceSummary {
    #[serde(rename = "traceID")]
    trace_id: String,
    root_service_name: Option<String>,
    start_time_unix_nano: Option<String>,
    span_sets: Vec<TempoSpanSet>,
}

impl TempoTraceSummary {
    fn start_nanos(&self) -> Option<i64> {
        self.start_time_unix_nano.as_deref()?.parse().ok()
    }
}

#[derive(Debug, Default, Deserialize)]
struct TempoSpanSet {
    #[serde(default)]
    spans: Vec<TempoMatchedSpan>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TempoMatchedSpan {
    #[serde(rename = "spanID")]
    span_id: String,
    name: Option<String>,
    start_time_unix_nano: Option<String>,
    duration_nanos: Option<String>,
    attributes: Vec<OtlpKeyValue>,
}

/// Flattens one search summary's matched spans into normalized spans.
///
/// Search results carry no parent linkage; full linkage comes from the
/// per-trace fetch during trace reconstruction.
fn flatten_summary_spans(summary: &TempoTraceSummary) -> Vec<Span> {
    let Ok(trace_id) = TraceId::new(summary.trace_id.clone()) else {
        return Vec::new();
    };
    let mut spans = Vec::new();
    for span_set in &summary.span_sets {
        for matched in &span_set.spans {
            let Ok(span_id) = SpanId::new(matched.span_id.clone()) else {
                continue;
            };
            let mut tags = HashMap::new();
            for attr in &matched.attributes {
                if let Some(value) = any_value_to_string(&attr.value) {
                    tags.insert(attr.key.clone(), value);
                }
            }
            let service = tags
                .get("service.name")
                .cloned()
                .or_else(|| summary.root_service_name.clone())
                .unwrap_or_else(|| "unknown".to_string());
            let Ok(service) = ServiceName::new(service) else {
                continue;
            };

            let start_nanos: Option<i64> =
                matched.start_time_unix_nano.as_deref().and_then(|raw| raw.parse().ok());
            let duration_nanos: Option<i64> =
                matched.duration_nanos.as_deref().and_then(|raw| raw.parse().ok());
            let name = matched.name.clone().unwrap_or_default();

            let mut builder = Span::builder()
                .trace_id(trace_id.clone())
                .span_id(span_id)
                .service(service)
                .operation(name.clone())
                .resource(name);
            if let Some(start) = start_nanos {
                let start = DateTime::from_timestamp_nanos(start);
                builder = builder.start_time(start);
                if let Some(duration) = duration_nanos {
                    builder = builder.end_time(start + chrono::Duration::nanoseconds(duration));
                }
            }
            if let Ok(mut span) = builder.build() {
                span.tags = tags;
                spans.push(span);
            }
        }
    }
    spans
}

#[derive(Debug, Default, Deserialize)]
struct TempoTagValuesResponse {
    #[serde(default, rename = "tagValues")]
    tag_values: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct TempoTraceResponse {
    #[serde(default, alias = "resourceSpans")]
    batches: Vec<OtlpResourceSpans>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OtlpResourceSpans {
    resource: OtlpResource,
    #[serde(rename = "scopeSpans", alias = "instrumentationLibrarySpans")]
    scope_spans: Vec<OtlpScopeSpans>,
}

#[derive(Debug, Default, Deserialize)]
struct OtlpResource {
    #[serde(default)]
    attributes: Vec<OtlpKeyValue>,
}

#[derive(Debug, Default, Deserialize)]
struct OtlpScopeSpans {
    #[serde(default)]
    spans: Vec<OtlpSpan>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct OtlpSpan {
    span_id: String,
    parent_span_id: Option<String>,
    name: String,
    start_time_unix_nano: Option<String>,
    end_time_unix_nano: Option<String>,
    attributes: Vec<OtlpKeyValue>,
    status: Option<OtlpStatus>,
}

#[derive(Debug, Default, Deserialize)]
struct OtlpKeyValue {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
struct OtlpStatus {
    #[serde(default)]
    code: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

impl OtlpStatus {
    /// OTLP encodes the status code as either the enum number or its name
    fn is_error(&self) -> bool {
        match &self.code {
            serde_json::Value::Number(n) => n.as_i64() == Some(2),
            serde_json::Value::String(s) => s == "STATUS_CODE_ERROR",
            _ => false,
        }
    }
}

/// Stringifies an OTLP-JSON AnyValue (int64 arrives as a string per the
/// protobuf JSON mapping)
fn any_value_to_string(value: &serde_json::Value) -> Option<String> {
    let object = value.as_object()?;
    if let Some(s) = object.get("stringValue").and_then(|v| v.as_str()) {
        return Some(s.to_string());
    }
    if let Some(i) = object.get("intValue") {
        return Some(match i {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        });
    }
    if let Some(d) = object.get("doubleValue") {
        return Some(d.to_string());
    }
    if let Some(b) = object.get("boolValue").and_then(|v| v.as_bool()) {
        return Some(b.to_string());
    }
    if let Some(array) = object
        .get("arrayValue")
        .and_then(|v| v.get("values"))
        .and_then(|v| v.as_array())
    {
        let joined = array
            .iter()
            .filter_map(any_value_to_string)
            .collect::<Vec<_>>()
            .join(",");
        return Some(joined);
    }
    None
}

fn otlp_attributes_to_tags(attributes: &[OtlpKeyValue], tags: &mut HashMap<String, String>) {
    for attr in attributes {
        if let Some(value) = any_value_to_string(&attr.value) {
            tags.insert(attr.key.clone(), value);
        }
    }
}

/// Normalizes one complete OTLP-JSON trace payload into flat spans
fn normalize_otlp_trace(trace_id: &str, payload: TempoTraceResponse) -> Vec<Span> {
    let Ok(trace_id) = TraceId::new(trace_id.to_string()) else {
        return Vec::new();
    };
    let mut spans = Vec::new();
    for batch in payload.batches {
        let mut resource_tags = HashMap::new();
        otlp_attributes_to_tags(&batch.resource.attributes, &mut resource_tags);
        let service = resource_tags
            .get("service.name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let environment = resource_tags.get("deployment.environment").cloned();

        for scope in batch.scope_spans {
            for otlp_span in scope.spans {
                let Ok(span_id) = SpanId::new(otlp_span.span_id.clone()) else {
                    tracing::warn!("OTLP span missing span id, dropping");
                    continue;
                };
                let Ok(service) = ServiceName::new(service.clone()) else {
                    continue;
                };

                let mut tags = HashMap::new();
                otlp_attributes_to_tags(&otlp_span.attributes, &mut tags);

                let mut builder = Span::builder()
                    .trace_id(trace_id.clone())
                    .span_id(span_id)
                    .service(service)
                    .operation(otlp_span.name.clone())
                    .resource(otlp_span.name.clone());
                if let Some(parent) = otlp_span
                    .parent_span_id
                    .filter(|p| !p.is_empty())
                    .and_then(|p| SpanId::new(p).ok())
                {
                    builder = builder.parent_id(parent);
                }
                if let Some(start) = otlp_span
                    .start_time_unix_nano
                    .as_deref()
                    .and_then(|raw| raw.parse::<i64>().ok())
                {
                    builder = builder.start_time(DateTime::from_timestamp_nanos(start));
                }
                if let Some(end) = otlp_span
                    .end_time_unix_nano
                    .as_deref()
                    .and_then(|raw| raw.parse::<i64>().ok())
                {
                    builder = builder.end_time(DateTime::from_timestamp_nanos(end));
                }
                if let Some(status) = &otlp_span.status {
                    if status.is_error() {
                        builder = builder.status("error");
                        if let Some(message) = &status.message {
                            tags.entry("error.message".to_string())
                                .or_insert_with(|| message.clone());
                        }
                    }
                }
                if let Some(env) = &environment {
                    builder = builder.environment(env.clone());
                }

                if let Ok(mut span) = builder.build() {
                    span.tags = tags;
                    spans.push(span);
                }
            }
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_any_value_variants() {
        assert_eq!(
            any_value_to_string(&json!({"stringValue": "api"})),
            Some("api".to_string())
        );
        assert_eq!(
            any_value_to_string(&json!({"intValue": "500"})),
            Some("500".to_string())
        );
        assert_eq!(
            any_value_to_string(&json!({"doubleValue": 1.5})),
            Some("1.5".to_string())
        );
        assert_eq!(
            any_value_to_string(&json!({"boolValue": true})),
            Some("true".to_string())
        );
        assert_eq!(
            any_value_to_string(&json!({"arrayValue": {"values": [
                {"stringValue": "a"}, {"intValue": "2"}
            ]}})),
            Some("a,2".to_string())
        );
        assert_eq!(any_value_to_string(&json!("bare")), None);
    }

    #[test]
    fn test_normalize_loki_entry() {
        let mut labels = HashMap::new();
        labels.insert("service_name".to_string(), "checkout".to_string());
        labels.insert("detected_level".to_string(), "warn".to_string());
        let value = vec!["1714564800000000000".to_string(), "slow request".to_string()];
        let (nanos, log) = normalize_loki_entry(&labels, &value).unwrap();
        assert_eq!(nanos, 1_714_564_800_000_000_000);
        assert_eq!(log.message, "slow request");
        assert_eq!(log.service.as_deref(), Some("checkout"));
        assert_eq!(log.level, LogLevel::Warn);
        assert!(log.attributes.unwrap().contains_key("service_name"));
    }

    #[test]
    fn test_normalize_loki_entry_bad_timestamp() {
        let labels = HashMap::new();
        let value = vec!["not-nanos".to_string(), "line".to_string()];
        assert!(normalize_loki_entry(&labels, &value).is_none());
    }

    #[test]
    fn test_normalize_otlp_trace() {
        let payload: TempoTraceResponse = serde_json::from_value(json!({
            "batches": [{
                "resource": {
                    "attributes": [
                        {"key": "service.name", "value": {"stringValue": "checkout"}},
                        {"key": "deployment.environment", "value": {"stringValue": "prod"}}
                    ]
                },
                "scopeSpans": [{
                    "spans": [
                        {
                            "spanId": "aaaa",
                            "name": "GET /cart",
                            "startTimeUnixNano": "1714564800000000000",
                            "endTimeUnixNano": "1714564802000000000",
                            "attributes": [
                                {"key": "http.status_code", "value": {"intValue": "500"}}
                            ],
                            "status": {"code": 2, "message": "upstream timeout"}
                        },
                        {
                            "spanId": "bbbb",
                            "parentSpanId": "aaaa",
                            "name": "SELECT carts",
                            "startTimeUnixNano": "1714564800500000000",
                            "endTimeUnixNano": "1714564801000000000"
                        }
                    ]
                }]
            }]
        }))
        .unwrap();

        let spans = normalize_otlp_trace("abc123", payload);
        assert_eq!(spans.len(), 2);
        let root = &spans[0];
        assert_eq!(root.service.as_str(), "checkout");
        assert_eq!(root.environment.as_deref(), Some("prod"));
        assert_eq!(root.status.as_deref(), Some("error"));
        assert_eq!(root.get_tag("error.message"), Some("upstream timeout"));
        assert_eq!(root.http_status(), Some(500));
        assert_eq!(root.duration_seconds(), Some(2.0));
        assert_eq!(spans[1].parent_id.as_ref().unwrap().as_str(), "aaaa");
    }

    #[test]
    fn test_status_code_string_form() {
        let status: OtlpStatus =
            serde_json::from_value(json!({"code": "STATUS_CODE_ERROR"})).unwrap();
        assert!(status.is_error());
        let status: OtlpStatus = serde_json::from_value(json!({"code": 0})).unwrap();
        assert!(!status.is_error());
    }

    #[test]
    fn test_flatten_summary_spans() {
        let summary: TempoTraceSummary = serde_json::from_value(json!({
            "traceID": "abc123",
            "rootServiceName": "checkout",
            "startTimeUnixNano": "1714564800000000000",
            "spanSets": [{
                "spans": [{
                    "spanID": "aaaa",
                    "name": "GET /cart",
                    "startTimeUnixNano": "1714564800000000000",
                    "durationNanos": "1500000000"
                }]
            }]
        }))
        .unwrap();
        let spans = flatten_summary_spans(&summary);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].service.as_str(), "checkout");
        assert_eq!(spans[0].duration_seconds(), Some(1.5));
        assert!(spans[0].is_root());
    }

    #[test]
    fn test_new_requires_endpoints() {
        let config = GrafanaConfig {
            loki_url: String::new(),
            tempo_url: "http://tempo".to_string(),
            username: None,
            password: None,
        };
        assert!(GrafanaPlatform::new(config, QueryConfig::default()).is_err());
    }
}
