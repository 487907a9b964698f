//! Trace reconstruction pipeline.
//!
//! Rebuilds normalized, hierarchical traces from the flat span collections
//! that tracing backends return. The pipeline is pure, synchronous
//! computation: each trace-id group is processed independently with no
//! shared state, so groups can be reconstructed in parallel by callers if
//! they choose.

pub mod assemble;
pub mod hierarchy;
pub mod interval;
pub mod latency;
pub mod root;

pub use assemble::{assemble, DisplayTrace, Trace};
pub use hierarchy::{build_hierarchy, DisplaySpan, SpanError};
pub use interval::{merge, merged_duration_seconds, Interval};
pub use latency::{service_breakdown, ServiceLatency};
pub use root::{resolve_root, ResolvedRoot};

use crate::core::types::{Span, TraceId};
use std::collections::{HashMap, HashSet};

/// Distinct trace ids of a span batch, deduplicated, in first-seen order.
///
/// First-seen order keeps the follow-up `trace_id IN (...)` query
/// deterministic for a given result set.
pub fn extract_trace_ids(spans: &[Span]) -> Vec<TraceId> {
    let mut seen: HashSet<&str> = HashSet::with_capacity(spans.len());
    let mut ids = Vec::new();
    for span in spans {
        if seen.insert(span.trace_id.as_str()) {
            ids.push(span.trace_id.clone());
        }
    }
    ids
}

/// Groups a mixed span batch by trace id, preserving first-seen group
/// order and within-group input order.
pub fn group_by_trace(spans: Vec<Span>) -> Vec<(TraceId, Vec<Span>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(TraceId, Vec<Span>)> = Vec::new();
    for span in spans {
        match index.get(span.trace_id.as_str()) {
            Some(&i) => groups[i].1.push(span),
            None => {
                index.insert(span.trace_id.as_str().to_string(), groups.len());
                let trace_id = span.trace_id.clone();
                groups.push((trace_id, vec![span]));
            }
        }
    }
    groups
}

/// Reconstructs every trace in a mixed span batch.
///
/// Groups that yield no resolvable root are skipped, never aborting the
/// rest of the batch.
pub fn reconstruct(spans: Vec<Span>) -> Vec<Trace> {
    let groups = group_by_trace(spans);
    let mut traces = Vec::with_capacity(groups.len());
    for (trace_id, group) in groups {
        match assemble(&group) {
            Some(trace) => traces.push(trace),
            None => {
                tracing::debug!(trace_id = %trace_id, spans = group.len(), "no trace producible, skipping");
            }
        }
    }
    traces
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ServiceName, SpanId};
    use chrono::{TimeZone, Utc};

    fn span(trace: &str, id: &str, parent: Option<&str>) -> Span {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut builder = Span::builder()
            .trace_id(TraceId::new(trace.to_string()).unwrap())
            .span_id(SpanId::new(id.to_string()).unwrap())
            .service(ServiceName::new("svc".to_string()).unwrap())
            .operation("op")
            .start_time(start)
            .end_time(start + chrono::Duration::seconds(1));
        if let Some(parent) = parent {
            builder = builder.parent_id(SpanId::new(parent.to_string()).unwrap());
        }
        builder.build().unwrap()
    }

    #[test]
    fn test_extract_trace_ids_dedup_first_seen() {
        let spans = vec![
            span("t2", "a", None),
            span("t1", "b", None),
            span("t2", "c", Some("a")),
        ];
        let extracted = extract_trace_ids(&spans);
        let ids: Vec<&str> = extracted.iter().map(TraceId::as_str).collect();
        assert_eq!(ids, vec!["t2", "t1"]);
    }

    #[test]
    fn test_group_by_trace() {
        let spans = vec![
            span("t1", "a", None),
            span("t2", "b", None),
            span("t1", "c", Some("a")),
        ];
        let groups = group_by_trace(spans);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0.as_str(), "t1");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].1.len(), 1);
    }

    #[test]
    fn test_reconstruct_skips_rootless_groups() {
        let spans = vec![
            span("ok", "a", None),
            // Mutual cycle: no root candidate, the group is skipped
            span("cyclic", "x", Some("y")),
            span("cyclic", "y", Some("x")),
        ];
        let traces = reconstruct(spans);
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].trace_id.as_str(), "ok");
    }

    #[test]
    fn test_reconstruct_empty() {
        assert!(reconstruct(Vec::new()).is_empty());
    }
}
