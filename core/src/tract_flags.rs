//! Geography- and income-linked flags computed alongside the race rule.
//!
//! Each flag is `None` when its input is missing. Missing is not "no".

use crate::{
    loan::LoanRecord,
    metric::{Metric, UndefinedReason},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TractThresholds {
    /// LMICT / LMIB cut-off, percent of area median (inclusive).
    pub lmi_pct:  f64,
    /// MMCT cut-off, minority population percent (exclusive).
    pub mmct_pct: f64,
}

impl Default for TractThresholds {
    fn default() -> Self {
        Self { lmi_pct: 80.0, mmct_pct: 50.0 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TractFlags {
    pub is_lmict: Option<bool>,
    pub is_lmib:  Option<bool>,
    pub is_mmct:  Option<bool>,
}

/// Borrower income as a percent of the MSA median family income.
///
/// `income_thousands` is scaled by 1000 first. Undefined when either
/// input is missing or the median is not positive.
pub fn lmib_ratio(income_thousands: Option<f64>, median_family_income: Option<f64>) -> Metric {
    match (income_thousands, median_family_income) {
        (Some(income), Some(mfi)) if mfi > 0.0 => Metric::percent(income * 1000.0, mfi),
        _ => Metric::Undefined(UndefinedReason::MissingInput),
    }
}

pub fn tract_flags(loan: &LoanRecord, thresholds: &TractThresholds) -> TractFlags {
    TractFlags {
        is_lmict: loan
            .tract_to_msa_income_pct
            .map(|pct| pct <= thresholds.lmi_pct),
        is_lmib: lmib_ratio(loan.income, loan.ffiec_msa_median_family_income)
            .as_option()
            .map(|pct| pct <= thresholds.lmi_pct),
        is_mmct: loan
            .tract_minority_population_pct
            .map(|pct| pct > thresholds.mmct_pct),
    }
}
