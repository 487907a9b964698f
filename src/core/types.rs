use crate::core::error::{LoomError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Unique identifier for a trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TraceId(String);

/// Unique identifier for a span within a trace
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpanId(String);

/// Service name identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceName(String);

impl TraceId {
    /// Creates a new TraceId after validation.
    ///
    /// Backends disagree on encoding (Datadog uses decimal u64 strings,
    /// Tempo uses 32-char hex), so only emptiness and an upper bound are
    /// enforced.
    pub fn new(id: String) -> Result<Self> {
        if id.is_empty() {
            return Err(LoomError::InvalidSpan("TraceId cannot be empty".to_string()));
        }
        if id.len() > 64 {
            return Err(LoomError::InvalidSpan(format!(
                "TraceId cannot exceed 64 characters, got {}",
                id.len()
            )));
        }
        Ok(TraceId(id))
    }

    /// Returns the string representation of the trace ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl SpanId {
    /// Creates a new SpanId after validation
    pub fn new(id: String) -> Result<Self> {
        if id.is_empty() {
            return Err(LoomError::InvalidSpan("SpanId cannot be empty".to_string()));
        }
        if id.len() > 64 {
            return Err(LoomError::InvalidSpan(format!(
                "SpanId cannot exceed 64 characters, got {}",
                id.len()
            )));
        }
        Ok(SpanId(id))
    }

    /// Returns the string representation of the span ID
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ServiceName {
    /// Creates a new ServiceName after validation
    pub fn new(name: String) -> Result<Self> {
        if name.is_empty() {
            return Err(LoomError::InvalidSpan(
                "ServiceName cannot be empty".to_string(),
            ));
        }
        if name.len() > 255 {
            return Err(LoomError::InvalidSpan(
                "ServiceName cannot exceed 255 characters".to_string(),
            ));
        }
        Ok(ServiceName(name))
    }

    /// Returns the string representation of the service name
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the inner string value
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Tag key carrying the error type on a failed span
pub const ERROR_TYPE_TAG: &str = "error.type";
/// Tag key carrying the error message on a failed span
pub const ERROR_MESSAGE_TAG: &str = "error.message";
/// Tag key carrying the error stack trace on a failed span
pub const ERROR_STACK_TAG: &str = "error.stack";
/// Tag key carrying the HTTP response status code
pub const HTTP_STATUS_TAG: &str = "http.status_code";

/// A single normalized span as returned by a platform adapter.
///
/// Timestamps are absolute instants; spans whose upstream timestamps were
/// missing or unparseable carry `None` and are excluded from latency
/// attribution downstream. Duration is always derived from the two
/// timestamps, never trusted from upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Span {
    /// Unique identifier for the trace this span belongs to
    pub trace_id: TraceId,
    /// Unique identifier for this span
    pub span_id: SpanId,
    /// Parent span ID if this is a child span
    pub parent_id: Option<SpanId>,
    /// Name of the service that generated this span
    pub service: ServiceName,
    /// Name of the operation this span represents
    pub operation: String,
    /// Resource the operation acted on (endpoint, query, ...)
    pub resource: String,
    /// When the span started
    pub start_time: Option<DateTime<Utc>>,
    /// When the span ended
    pub end_time: Option<DateTime<Utc>>,
    /// Upstream status string, if any (e.g. "ok", "error")
    pub status: Option<String>,
    /// Deployment environment, if reported
    pub environment: Option<String>,
    /// Flat string-keyed tag map; nested vendor bags are flattened and
    /// non-string values stringified at the adapter boundary
    pub tags: HashMap<String, String>,
}

impl Span {
    /// Creates a new span builder
    pub fn builder() -> SpanBuilder {
        SpanBuilder::default()
    }

    /// Derived duration in seconds, if both timestamps are present.
    ///
    /// A negative difference (corrupted upstream clock) reports as zero
    /// rather than poisoning downstream sums.
    pub fn duration_seconds(&self) -> Option<f64> {
        let (start, end) = (self.start_time?, self.end_time?);
        let micros = (end - start).num_microseconds()?;
        Some((micros.max(0) as f64) / 1_000_000.0)
    }

    /// Returns true if this span declares no parent
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Gets a tag value by key
    pub fn get_tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(|s| s.as_str())
    }

    /// Returns true if the span carries an error-indicator tag or an
    /// explicit error status
    pub fn has_error_tag(&self) -> bool {
        self.tags.contains_key(ERROR_TYPE_TAG)
            || self.tags.contains_key(ERROR_MESSAGE_TAG)
            || self
                .status
                .as_deref()
                .is_some_and(|s| s.eq_ignore_ascii_case("error"))
    }

    /// Parses the HTTP status code tag, if present and numeric
    pub fn http_status(&self) -> Option<u16> {
        self.get_tag(HTTP_STATUS_TAG)?.parse().ok()
    }
}

/// Builder for creating Span instances
#[derive(Default)]
pub struct SpanBuilder {
    trace_id: Option<TraceId>,
    span_id: Option<SpanId>,
    parent_id: Option<SpanId>,
    service: Option<ServiceName>,
    operation: Option<String>,
    resource: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    status: Option<String>,
    environment: Option<String>,
    tags: HashMap<String, String>,
}

impl SpanBuilder {
    pub fn trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    pub fn span_id(mut self, span_id: SpanId) -> Self {
        self.span_id = Some(span_id);
        self
    }

    pub fn parent_id(mut self, parent_id: SpanId) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    pub fn service(mut self, service: ServiceName) -> Self {
        self.service = Some(service);
        self
    }

    pub fn operation<S: Into<String>>(mut self, operation: S) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn resource<S: Into<String>>(mut self, resource: S) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn start_time(mut self, start_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn end_time(mut self, end_time: DateTime<Utc>) -> Self {
        self.end_time = Some(end_time);
        self
    }

    pub fn status<S: Into<String>>(mut self, status: S) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn environment<S: Into<String>>(mut self, environment: S) -> Self {
        self.environment = Some(environment.into());
        self
    }

    pub fn tag<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn build(self) -> Result<Span> {
        Ok(Span {
            trace_id: self
                .trace_id
                .ok_or_else(|| LoomError::InvalidSpan("trace_id is required".to_string()))?,
            span_id: self
                .span_id
                .ok_or_else(|| LoomError::InvalidSpan("span_id is required".to_string()))?,
            parent_id: self.parent_id,
            service: self
                .service
                .ok_or_else(|| LoomError::InvalidSpan("service is required".to_string()))?,
            operation: self.operation.unwrap_or_default(),
            resource: self.resource.unwrap_or_default(),
            start_time: self.start_time,
            end_time: self.end_time,
            status: self.status,
            environment: self.environment,
            tags: self.tags,
        })
    }
}

/// Log severity levels normalized across vendors
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl LogLevel {
    /// Normalize a heterogeneous vendor severity string.
    ///
    /// Datadog reports `status` values like "warn"/"warning", Loki stream
    /// labels use "level"/"detected_level" with similar variants. Unknown
    /// values default to Info.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "trace" => Self::Trace,
            "debug" => Self::Debug,
            "info" | "informational" | "notice" => Self::Info,
            "warn" | "warning" => Self::Warn,
            "error" | "err" => Self::Error,
            "fatal" | "critical" | "crit" | "emergency" | "emerg" | "alert" => Self::Fatal,
            _ => Self::Info,
        }
    }

    /// Get display string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Fatal => "FATAL",
        }
    }
}

/// A single normalized log record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Log {
    /// When the log line was emitted, if the backend reported a
    /// parseable timestamp
    pub timestamp: Option<DateTime<Utc>>,
    /// Log message body
    pub message: String,
    /// Emitting service, if reported
    pub service: Option<String>,
    /// Normalized severity
    pub level: LogLevel,
    /// Flattened vendor attributes; `None` when the backend attached none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<HashMap<String, String>>,
}

impl Log {
    /// Create a new log record with no attributes
    pub fn new(
        timestamp: Option<DateTime<Utc>>,
        message: String,
        service: Option<String>,
        level: LogLevel,
    ) -> Self {
        Self {
            timestamp,
            message,
            service,
            level,
            attributes: None,
        }
    }

    /// Add an attribute, allocating the map lazily
    pub fn with_attribute(mut self, key: String, value: String) -> Self {
        let attrs = self.attributes.get_or_insert_with(HashMap::new);
        attrs.insert(key, value);
        self
    }
}
