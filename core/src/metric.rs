//! Report metrics that may be undefined.
//!
//! RULE: a ratio with a zero denominator, or any input missing, is
//! `Metric::Undefined`. It is never folded into 0.0, and arithmetic on an
//! undefined operand stays undefined. Rendering is the presentation
//! layer's business.

use serde::{Serialize, Serializer};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UndefinedReason {
    /// Denominator was zero (no loans, no loans with data, empty cohort).
    ZeroDenominator,
    /// A required input was null or non-positive (e.g. median family income).
    MissingInput,
    /// Subject lender has no volume in the market period.
    NoSubjectVolume,
    /// No peer lenders fell inside the volume band.
    EmptyCohort,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Metric {
    Value(f64),
    Undefined(UndefinedReason),
}

impl Metric {
    /// `numerator / denominator`, undefined when the denominator is zero.
    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        if denominator == 0.0 || !denominator.is_finite() || !numerator.is_finite() {
            Self::Undefined(UndefinedReason::ZeroDenominator)
        } else {
            Self::Value(numerator / denominator)
        }
    }

    /// Ratio expressed in percent.
    pub fn percent(numerator: f64, denominator: f64) -> Self {
        Self::ratio(numerator, denominator).map(|v| v * 100.0)
    }

    /// Percent of two counts.
    pub fn share(count: u64, total: u64) -> Self {
        Self::percent(count as f64, total as f64)
    }

    pub fn is_defined(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    pub fn as_option(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Undefined(_) => None,
        }
    }

    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Self::Value(v) => Self::Value(f(v)),
            undefined => undefined,
        }
    }

    /// Combine two metrics; the first undefined operand wins.
    pub fn zip_with(self, other: Self, f: impl FnOnce(f64, f64) -> f64) -> Self {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => Self::Value(f(a, b)),
            (Self::Undefined(r), _) | (_, Self::Undefined(r)) => Self::Undefined(r),
        }
    }

    /// `a - b`, the subject-minus-peer gap.
    pub fn difference(a: Self, b: Self) -> Self {
        a.zip_with(b, |x, y| x - y)
    }

    /// Replace the reason on an undefined metric, keeping values.
    pub fn or_reason(self, reason: UndefinedReason) -> Self {
        match self {
            Self::Value(v) => Self::Value(v),
            Self::Undefined(_) => Self::Undefined(reason),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(v) => write!(f, "{v:.2}"),
            Self::Undefined(_) => write!(f, "n/a"),
        }
    }
}

/// Serialised as `{"value": 12.5}` or `{"value": null, "undefined": "zero_denominator"}`.
impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        match self {
            Self::Value(v) => {
                let mut s = serializer.serialize_struct("Metric", 1)?;
                s.serialize_field("value", v)?;
                s.end()
            }
            Self::Undefined(reason) => {
                let mut s = serializer.serialize_struct("Metric", 2)?;
                s.serialize_field("value", &Option::<f64>::None)?;
                s.serialize_field("undefined", reason)?;
                s.end()
            }
        }
    }
}
