//! Trace assembly.
//!
//! Composes root resolution, hierarchy building, and latency attribution
//! into one normalized [`Trace`] entity. Stateless and side-effect-free:
//! each invocation is an independent pure function from a flat span
//! collection to `Option<Trace>`.

use crate::core::types::{ServiceName, Span, TraceId};
use crate::trace::hierarchy::{build_hierarchy, DisplaySpan};
use crate::trace::latency::{service_breakdown, ServiceLatency};
use crate::trace::root::resolve_root;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// The reconstructed hierarchy of one trace
#[derive(Debug, Clone, Serialize)]
pub struct DisplayTrace {
    /// Trace identifier
    pub trace_id: TraceId,
    /// Root display spans, ascending by start time; commonly length 1,
    /// longer when the result set contains disconnected sub-traces
    pub roots: Vec<DisplaySpan>,
    /// Earliest start over all spans in the trace
    pub start_time: Option<DateTime<Utc>>,
    /// Latest end over all spans in the trace
    pub end_time: Option<DateTime<Utc>>,
    /// Elapsed seconds between the trace extremes; never less than the
    /// root span's own duration
    pub total_duration: f64,
}

impl DisplayTrace {
    /// All display spans in pre-order (each root followed by its subtree)
    pub fn spans(&self) -> Vec<&DisplaySpan> {
        let mut flat = Vec::new();
        for root in &self.roots {
            preorder(root, &mut flat);
        }
        flat
    }

    /// Total number of spans in the trace
    pub fn span_count(&self) -> usize {
        self.roots.iter().map(DisplaySpan::span_count).sum()
    }
}

fn preorder<'a>(node: &'a DisplaySpan, out: &mut Vec<&'a DisplaySpan>) {
    out.push(node);
    for child in &node.children {
        preorder(child, out);
    }
}

/// The externally-facing trace entity
#[derive(Debug, Clone, Serialize)]
pub struct Trace {
    /// Trace identifier
    pub trace_id: TraceId,
    /// Service of the resolved root span
    pub root_service: ServiceName,
    /// Operation of the resolved root span
    pub root_operation: String,
    /// Resource of the resolved root span
    pub root_resource: String,
    /// First HTTP status tag found walking the hierarchy in pre-order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    /// Earliest start over all spans
    pub start_time: Option<DateTime<Utc>>,
    /// Latest end over all spans
    pub end_time: Option<DateTime<Utc>>,
    /// Root span duration in seconds, the denominator of the breakdown
    pub duration: f64,
    /// Per-service latency, descending by duration
    pub service_breakdown: Vec<ServiceLatency>,
    /// True when any span carries an error tag or an HTTP status >= 400
    pub has_error: bool,
    /// The reconstructed hierarchy
    pub display: DisplayTrace,
}

/// Assembles a normalized trace from a flat span collection.
///
/// Returns `None` when no root span is resolvable or the collection is
/// empty — an expected non-result, never a panic.
pub fn assemble(spans: &[Span]) -> Option<Trace> {
    if spans.is_empty() {
        return None;
    }
    let root = resolve_root(spans)?;
    let roots = build_hierarchy(spans);
    if roots.is_empty() {
        return None;
    }

    let trace_id = root.span.trace_id.clone();

    // Trace extremes are widened by scanning every span; out-of-band spans
    // may start before or end after the root's own window.
    let mut start_time = root.start;
    let mut end_time = root.end;
    for span in spans {
        if let Some(start) = span.start_time {
            start_time = Some(start_time.map_or(start, |cur: DateTime<Utc>| cur.min(start)));
        }
        if let Some(end) = span.end_time {
            end_time = Some(end_time.map_or(end, |cur: DateTime<Utc>| cur.max(end)));
        }
    }
    let extent_seconds = match (start_time, end_time) {
        (Some(start), Some(end)) => {
            ((end - start).num_microseconds().unwrap_or(0).max(0) as f64) / 1_000_000.0
        }
        _ => 0.0,
    };
    let total_duration = extent_seconds.max(root.duration_seconds);

    let display = DisplayTrace {
        trace_id: trace_id.clone(),
        roots,
        start_time,
        end_time,
        total_duration,
    };

    let has_error = spans
        .iter()
        .any(|span| span.has_error_tag() || span.http_status().is_some_and(|code| code >= 400));
    let http_status = display
        .spans()
        .iter()
        .find_map(|node| node.span.http_status());

    Some(Trace {
        trace_id,
        root_service: root.span.service.clone(),
        root_operation: root.span.operation.clone(),
        root_resource: root.span.resource.clone(),
        http_status,
        start_time,
        end_time,
        duration: root.duration_seconds,
        service_breakdown: service_breakdown(spans, root.duration_seconds),
        has_error,
        display,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{SpanId, ERROR_TYPE_TAG, HTTP_STATUS_TAG};
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn span(id: &str, parent: Option<&str>, service: &str, start: i64, end: i64) -> Span {
        let mut builder = Span::builder()
            .trace_id(TraceId::new("trace".to_string()).unwrap())
            .span_id(SpanId::new(id.to_string()).unwrap())
            .service(ServiceName::new(service.to_string()).unwrap())
            .operation(format!("op-{}", id))
            .resource(format!("res-{}", id))
            .start_time(at(start))
            .end_time(at(end));
        if let Some(parent) = parent {
            builder = builder.parent_id(SpanId::new(parent.to_string()).unwrap());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_assemble_full_trace() {
        let spans = vec![
            span("root", None, "gateway", 0, 10),
            span("auth", Some("root"), "auth", 1, 3),
            span("db", Some("auth"), "postgres", 2, 3),
        ];
        let trace = assemble(&spans).unwrap();
        assert_eq!(trace.root_service.as_str(), "gateway");
        assert_eq!(trace.root_operation, "op-root");
        assert_eq!(trace.duration, 10.0);
        assert_eq!(trace.display.total_duration, 10.0);
        assert_eq!(trace.display.span_count(), 3);
        assert!(!trace.has_error);
        assert_eq!(trace.service_breakdown.len(), 3);
        assert_eq!(trace.service_breakdown[0].service.as_str(), "gateway");
    }

    #[test]
    fn test_total_duration_widened_beyond_root() {
        // An out-of-band span ends after the root's window closes
        let spans = vec![
            span("root", None, "gateway", 5, 10),
            span("late", Some("root"), "worker", 8, 20),
            span("early", Some("root"), "worker", 2, 6),
        ];
        let trace = assemble(&spans).unwrap();
        assert_eq!(trace.duration, 5.0);
        assert_eq!(trace.display.total_duration, 18.0);
        assert_eq!(trace.start_time, Some(at(2)));
        assert_eq!(trace.end_time, Some(at(20)));
        assert!(trace.display.total_duration >= trace.duration);
    }

    #[test]
    fn test_error_anywhere_flags_trace() {
        let mut child = span("child", Some("root"), "worker", 1, 2);
        child.tags.insert(ERROR_TYPE_TAG.to_string(), "Timeout".to_string());
        let spans = vec![span("root", None, "gateway", 0, 10), child];
        let trace = assemble(&spans).unwrap();
        assert!(trace.has_error);
        // The root itself carries no error details
        assert!(trace.display.roots[0].error.is_none());
    }

    #[test]
    fn test_http_error_status_flags_trace() {
        let mut child = span("child", Some("root"), "worker", 1, 2);
        child.tags.insert(HTTP_STATUS_TAG.to_string(), "503".to_string());
        let spans = vec![span("root", None, "gateway", 0, 10), child];
        let trace = assemble(&spans).unwrap();
        assert!(trace.has_error);
        assert_eq!(trace.http_status, Some(503));
    }

    #[test]
    fn test_http_status_preorder_first_wins() {
        let mut root = span("root", None, "gateway", 0, 10);
        root.tags.insert(HTTP_STATUS_TAG.to_string(), "200".to_string());
        let mut child = span("child", Some("root"), "worker", 1, 2);
        child.tags.insert(HTTP_STATUS_TAG.to_string(), "404".to_string());
        let trace = assemble(&[root, child]).unwrap();
        assert_eq!(trace.http_status, Some(200));
        assert!(trace.has_error);
    }

    #[test]
    fn test_empty_input_not_found() {
        assert!(assemble(&[]).is_none());
    }

    #[test]
    fn test_unresolvable_root_not_found() {
        let spans = vec![
            span("a", Some("b"), "svc", 0, 1),
            span("b", Some("a"), "svc", 1, 2),
        ];
        assert!(assemble(&spans).is_none());
    }

    #[test]
    fn test_zero_duration_root_degrades_percentages() {
        let mut root = span("root", None, "gateway", 0, 10);
        root.start_time = None;
        root.end_time = None;
        let spans = vec![root, span("child", Some("root"), "worker", 1, 4)];
        let trace = assemble(&spans).unwrap();
        assert_eq!(trace.duration, 0.0);
        let worker = &trace.service_breakdown[0];
        assert_eq!(worker.duration, 3.0);
        assert!(worker.percentage.is_none());
        // Extremes still come from the timestamped child
        assert_eq!(trace.display.total_duration, 3.0);
    }

    #[test]
    fn test_preorder_flattening() {
        let spans = vec![
            span("root", None, "gateway", 0, 10),
            span("b", Some("root"), "svc", 4, 5),
            span("a", Some("root"), "svc", 1, 2),
            span("a1", Some("a"), "svc", 1, 2),
        ];
        let trace = assemble(&spans).unwrap();
        let ids: Vec<&str> = trace
            .display
            .spans()
            .iter()
            .map(|node| node.span.span_id.as_str())
            .collect();
        assert_eq!(ids, vec!["root", "a", "a1", "b"]);
    }
}
