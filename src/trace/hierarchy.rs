//! Trace hierarchy reconstruction.
//!
//! Converts a flat span collection into an owned forest of display spans.
//! Parent references are resolved through an id table built once up front;
//! a parent pointer is never followed during traversal, so adversarial
//! cyclic input cannot recurse forever. Spans whose declared parent is
//! absent from the set become roots — disconnected sub-traces are retained,
//! not discarded.

use crate::core::types::{Span, ERROR_MESSAGE_TAG, ERROR_STACK_TAG, ERROR_TYPE_TAG};
use serde::Serialize;
use std::collections::HashMap;

/// Error details extracted from a span's tags
#[derive(Debug, Clone, Serialize)]
pub struct SpanError {
    /// Error class or type, e.g. "Timeout"
    pub error_type: String,
    /// Human-readable message
    pub message: String,
    /// Stack trace, when the backend recorded one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// A span placed in its trace hierarchy
#[derive(Debug, Clone, Serialize)]
pub struct DisplaySpan {
    /// The underlying normalized span
    #[serde(flatten)]
    pub span: Span,
    /// Child spans, sorted ascending by start time
    pub children: Vec<DisplaySpan>,
    /// Depth in the tree, 0 for roots
    pub level: usize,
    /// Error details when the span carries error tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<SpanError>,
}

impl DisplaySpan {
    fn from_span(span: Span) -> Self {
        let error = span_error(&span);
        Self {
            span,
            children: Vec::new(),
            level: 0,
            error,
        }
    }

    /// Total number of spans in this subtree, including self
    pub fn span_count(&self) -> usize {
        1 + self.children.iter().map(DisplaySpan::span_count).sum::<usize>()
    }
}

fn span_error(span: &Span) -> Option<SpanError> {
    let error_type = span.get_tag(ERROR_TYPE_TAG);
    let message = span.get_tag(ERROR_MESSAGE_TAG);
    if error_type.is_none() && message.is_none() {
        return None;
    }
    Some(SpanError {
        error_type: error_type.unwrap_or_default().to_string(),
        message: message.unwrap_or_default().to_string(),
        stack: span.get_tag(ERROR_STACK_TAG).map(str::to_string),
    })
}

fn start_ordering(a: &DisplaySpan, b: &DisplaySpan) -> std::cmp::Ordering {
    match (a.span.start_time, b.span.start_time) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Detach a node from the table along with its whole subtree. Removal from
/// the table doubles as the visited set: a cycle member can only be
/// detached once, so traversal always terminates.
fn detach(
    id: &str,
    nodes: &mut HashMap<String, DisplaySpan>,
    children_of: &HashMap<String, Vec<String>>,
) -> Option<DisplaySpan> {
    let mut node = nodes.remove(id)?;
    if let Some(child_ids) = children_of.get(id) {
        for child_id in child_ids {
            if let Some(child) = detach(child_id, nodes, children_of) {
                node.children.push(child);
            }
        }
    }
    Some(node)
}

/// Sort children by start time and assign levels, depth-first
fn finalize(node: &mut DisplaySpan, level: usize) {
    node.level = level;
    node.children.sort_by(start_ordering);
    for child in &mut node.children {
        finalize(child, level + 1);
    }
}

/// Builds the display forest from a flat span collection.
///
/// Every input span appears exactly once in the output, as a root or as
/// exactly one parent's child. Roots are sorted ascending by start time.
pub fn build_hierarchy(spans: &[Span]) -> Vec<DisplaySpan> {
    let mut nodes: HashMap<String, DisplaySpan> = HashMap::with_capacity(spans.len());
    // Input order, for deterministic handling of duplicate span ids
    let mut order: Vec<String> = Vec::with_capacity(spans.len());
    for span in spans {
        let id = span.span_id.as_str().to_string();
        if nodes.contains_key(&id) {
            tracing::warn!(span_id = %id, "duplicate span id in trace, keeping first");
            continue;
        }
        order.push(id.clone());
        nodes.insert(id, DisplaySpan::from_span(span.clone()));
    }

    let mut children_of: HashMap<String, Vec<String>> = HashMap::new();
    let mut root_ids: Vec<String> = Vec::new();
    for id in &order {
        let parent = nodes[id].span.parent_id.as_ref().map(|p| p.as_str().to_string());
        match parent {
            Some(parent) if parent != *id && nodes.contains_key(&parent) => {
                children_of.entry(parent).or_default().push(id.clone());
            }
            _ => root_ids.push(id.clone()),
        }
    }

    let mut roots: Vec<DisplaySpan> = Vec::with_capacity(root_ids.len());
    for id in &root_ids {
        if let Some(root) = detach(id, &mut nodes, &children_of) {
            roots.push(root);
        }
    }

    // Anything still in the table is unreachable from a root: a parent
    // cycle. Promote members to roots in input order until the table
    // drains, so no span is dropped.
    if !nodes.is_empty() {
        tracing::warn!(orphans = nodes.len(), "cyclic parent references, promoting to roots");
        for id in &order {
            if let Some(root) = detach(id, &mut nodes, &children_of) {
                roots.push(root);
            }
            if nodes.is_empty() {
                break;
            }
        }
    }

    for root in &mut roots {
        finalize(root, 0);
    }
    roots.sort_by(start_ordering);
    roots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ServiceName, SpanId, TraceId};
    use chrono::{TimeZone, Utc};

    fn span(id: &str, parent: Option<&str>, start_secs: i64) -> Span {
        let start = Utc.timestamp_opt(1_700_000_000 + start_secs, 0).unwrap();
        let mut builder = Span::builder()
            .trace_id(TraceId::new("trace".to_string()).unwrap())
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

    fn total_spans(roots: &[DisplaySpan]) -> usize {
        roots.iter().map(DisplaySpan::span_count).sum()
    }

    #[test]
    fn test_simple_tree() {
        let spans = vec![
            span("root", None, 0),
            span("child_b", Some("root"), 5),
            span("child_a", Some("root"), 2),
            span("grandchild", Some("child_a"), 3),
        ];
        let roots = build_hierarchy(&spans);
        assert_eq!(roots.len(), 1);
        let root = &roots[0];
        assert_eq!(root.span.span_id.as_str(), "root");
        assert_eq!(root.level, 0);
        // Children sorted ascending by start time
        assert_eq!(root.children[0].span.span_id.as_str(), "child_a");
        assert_eq!(root.children[1].span.span_id.as_str(), "child_b");
        assert_eq!(root.children[0].level, 1);
        assert_eq!(root.children[0].children[0].level, 2);
        assert_eq!(total_spans(&roots), 4);
    }

    #[test]
    fn test_disconnected_roots_retained() {
        let spans = vec![span("a", None, 0), span("b", Some("missing"), 10)];
        let roots = build_hierarchy(&spans);
        assert_eq!(roots.len(), 2);
        // Roots sorted ascending by start time
        assert_eq!(roots[0].span.span_id.as_str(), "a");
        assert_eq!(roots[1].span.span_id.as_str(), "b");
    }

    #[test]
    fn test_every_span_appears_once() {
        let spans = vec![
            span("r1", None, 0),
            span("c1", Some("r1"), 1),
            span("r2", Some("gone"), 2),
            span("c2", Some("r2"), 3),
            span("c3", Some("c2"), 4),
        ];
        let roots = build_hierarchy(&spans);
        assert_eq!(total_spans(&roots), 5);
    }

    #[test]
    fn test_cycle_broken_not_dropped() {
        // a -> b -> a: neither qualifies as a root, but both must survive
        let spans = vec![span("a", Some("b"), 0), span("b", Some("a"), 1)];
        let roots = build_hierarchy(&spans);
        assert_eq!(total_spans(&roots), 2);
        assert_eq!(roots[0].span.span_id.as_str(), "a");
        assert_eq!(roots[0].children[0].span.span_id.as_str(), "b");
    }

    #[test]
    fn test_self_referential_span_is_root() {
        let spans = vec![span("loop", Some("loop"), 0)];
        let roots = build_hierarchy(&spans);
        assert_eq!(roots.len(), 1);
        assert!(roots[0].children.is_empty());
    }

    #[test]
    fn test_error_extraction() {
        let mut with_error = span("bad", None, 0);
        with_error.tags.insert(ERROR_TYPE_TAG.to_string(), "Timeout".to_string());
        with_error.tags.insert(
            ERROR_MESSAGE_TAG.to_string(),
            "deadline exceeded".to_string(),
        );
        let roots = build_hierarchy(&[with_error, span("ok", None, 1)]);
        let error = roots[0].error.as_ref().unwrap();
        assert_eq!(error.error_type, "Timeout");
        assert_eq!(error.message, "deadline exceeded");
        assert!(error.stack.is_none());
        assert!(roots[1].error.is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(build_hierarchy(&[]).is_empty());
    }

    #[test]
    fn test_duplicate_span_ids_keep_first() {
        let first = span("dup", None, 0);
        let mut second = span("dup", None, 5);
        second.operation = "other".to_string();
        let roots = build_hierarchy(&[first, second]);
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].span.operation, "op");
    }
}
