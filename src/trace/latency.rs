//! Per-service latency attribution.
//!
//! Groups a trace's spans by service and merges each service's intervals
//! into a non-overlapping cover before summing, so concurrent spans from
//! the same service never double-count wall-clock time. Each service's
//! share is expressed as a percentage of the root span's duration.

use crate::core::types::{ServiceName, Span};
use crate::trace::interval::{merged_duration_seconds, Interval};
use serde::Serialize;
use std::collections::HashMap;

/// One service's share of a trace's wall-clock time
#[derive(Debug, Clone, Serialize)]
pub struct ServiceLatency {
    /// The service this entry attributes time to
    pub service: ServiceName,
    /// Non-overlapping time spent in this service, in seconds
    pub duration: f64,
    /// Share of the root span's duration; absent when the root duration
    /// is zero (never divide by zero)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// Computes the per-service latency breakdown, sorted descending by
/// duration.
///
/// Spans missing either timestamp are skipped. The sum over services may
/// exceed the root duration when spans extend past the root's window, but
/// each individual service's duration is itself non-overlapping.
pub fn service_breakdown(spans: &[Span], root_duration_seconds: f64) -> Vec<ServiceLatency> {
    let mut by_service: HashMap<&ServiceName, Vec<Interval>> = HashMap::new();
    for span in spans {
        let (Some(start), Some(end)) = (span.start_time, span.end_time) else {
            continue;
        };
        by_service
            .entry(&span.service)
            .or_default()
            .push(Interval::new(start, end));
    }

    let mut breakdown: Vec<ServiceLatency> = by_service
        .into_iter()
        .map(|(service, intervals)| {
            let duration = merged_duration_seconds(intervals);
            let percentage = (root_duration_seconds > 0.0)
                .then(|| duration / root_duration_seconds * 100.0);
            ServiceLatency {
                service: service.clone(),
                duration,
                percentage,
            }
        })
        .collect();

    // Descending by duration; service name breaks ties deterministically
    breakdown.sort_by(|a, b| {
        b.duration
            .partial_cmp(&a.duration)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.service.as_str().cmp(b.service.as_str()))
    });
    breakdown
}
