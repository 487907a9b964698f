//! Root span resolution.
//!
//! Backends return spans as an unordered flat set with no guarantee that a
//! trace's true root is present: sampling and pagination routinely truncate
//! the set. A span whose declared parent is absent from the set (or is the
//! span itself) is treated as a root candidate.

use crate::core::types::Span;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// The resolved root of a trace
#[derive(Debug, Clone)]
pub struct ResolvedRoot {
    /// The span chosen to represent the start of the trace
    pub span: Span,
    /// Root duration in seconds; 0 when either timestamp is missing,
    /// which disables percentage attribution downstream
    pub duration_seconds: f64,
    /// Root start, when known
    pub start: Option<DateTime<Utc>>,
    /// Root end, when known
    pub end: Option<DateTime<Utc>>,
}

/// Orders candidates by earliest start time; a missing start sorts after
/// any known start. Ties keep input order (the sort below is stable).
fn start_ordering(a: &Span, b: &Span) -> std::cmp::Ordering {
    match (a.start_time, b.start_time) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Resolves the root span of a flat span collection.
///
/// Returns `None` when no candidate exists — a valid empty outcome for a
/// truncated result set, not an error.
pub fn resolve_root(spans: &[Span]) -> Option<ResolvedRoot> {
    let present: HashSet<&str> = spans.iter().map(|s| s.span_id.as_str()).collect();

    let mut candidates: Vec<&Span> = spans
        .iter()
        .filter(|span| match &span.parent_id {
            None => true,
            Some(parent) => {
                parent.as_str() == span.span_id.as_str() || !present.contains(parent.as_str())
            }
        })
        .collect();

    if candidates.is_empty() {
        return None;
    }
    if candidates.len() > 1 {
        tracing::debug!(
            candidates = candidates.len(),
            "multiple root candidates, tie-breaking by earliest start"
        );
        candidates.sort_by(|a, b| start_ordering(a, b));
    }

    let root = candidates[0].clone();
    let duration_seconds = root.duration_seconds().unwrap_or(0.0);
    Some(ResolvedRoot {
        start: root.start_time,
        end: root.end_time,
        duration_seconds,
        span: root,
    })
}
