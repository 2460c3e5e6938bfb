//! Subject-vs-peer comparison and the pooled two-proportion z-test.

use crate::{
    aggregation::{LenderAggregate, ReportMetric},
    metric::{Metric, UndefinedReason},
    peer_cohort::PeerCohort,
};
use serde::Serialize;

/// z statistic for H0: p1 = p2, using the pooled proportion.
///
/// Undefined when either sample is empty, a count exceeds its sample,
/// or the pooled variance is zero.
pub fn two_proportion_z(x1: u64, n1: u64, x2: u64, n2: u64) -> Metric {
    if n1 == 0 || n2 == 0 {
        return Metric::Undefined(UndefinedReason::ZeroDenominator);
    }
    if x1 > n1 || x2 > n2 {
        return Metric::Undefined(UndefinedReason::MissingInput);
    }
    let (x1, n1, x2, n2) = (x1 as f64, n1 as f64, x2 as f64, n2 as f64);
    let pooled = (x1 + x2) / (n1 + n2);
    let variance = pooled * (1.0 - pooled) * (1.0 / n1 + 1.0 / n2);
    if variance <= 0.0 {
        return Metric::Undefined(UndefinedReason::ZeroDenominator);
    }
    Metric::Value((x1 / n1 - x2 / n2) / variance.sqrt())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric:      ReportMetric,
    pub subject:     Metric,
    pub peer:        Metric,
    /// Subject minus peer, in percentage points.
    pub gap:         Metric,
    pub z:           Metric,
    /// `None` when z is undefined.
    pub significant: Option<bool>,
}

/// Compare one metric between the subject and its cohort aggregate.
pub fn compare_metric(
    metric:     ReportMetric,
    subject:    &LenderAggregate,
    peer:       &LenderAggregate,
    cohort:     &PeerCohort,
    critical_z: f64,
) -> MetricComparison {
    let (sx, sn) = subject.counts(metric);
    let (px, pn) = peer.counts(metric);

    let mut subject_share = Metric::share(sx, sn);
    if !cohort.has_subject_volume() {
        subject_share = subject_share.or_reason(UndefinedReason::NoSubjectVolume);
    }
    let mut peer_share = Metric::share(px, pn);
    if cohort.is_empty() {
        peer_share = Metric::Undefined(UndefinedReason::EmptyCohort);
    }

    let z = if cohort.is_empty() {
        Metric::Undefined(UndefinedReason::EmptyCohort)
    } else {
        two_proportion_z(sx, sn, px, pn)
    };

    MetricComparison {
        metric,
        subject:     subject_share,
        peer:        peer_share,
        gap:         Metric::difference(subject_share, peer_share),
        significant: z.as_option().map(|v| v.abs() >= critical_z),
        z,
    }
}
