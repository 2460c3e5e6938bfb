//! Loan classification and per-lender aggregation within market periods.
//!
//! Denominators:
//!   - race / ethnicity shares   → loans with demographic data
//!   - LMICT / MMCT shares       → all loans
//!   - LMIB share                → loans whose LMIB ratio is defined
//!
//! RULE: aggregates are partitioned by MarketPeriodKey and never merged
//! across keys.

use crate::{
    config::ReportConfig,
    crosswalk::CrosswalkTable,
    demographics::{classify, ClassificationResult, RaceEthnicity},
    loan::LoanRecord,
    metric::Metric,
    peer_cohort::VolumeBasis,
    tract_flags::{tract_flags, TractFlags, TractThresholds},
    types::{LenderId, MarketPeriodKey},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

// ── Classification ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedLoan {
    pub lender_id:      LenderId,
    pub key:            MarketPeriodKey,
    pub loan_amount:    f64,
    pub classification: ClassificationResult,
    pub flags:          TractFlags,
}

/// Classify one loan. `None` when its county is not in the crosswalk.
pub fn classify_loan(
    loan:       &LoanRecord,
    crosswalk:  &CrosswalkTable,
    thresholds: &TractThresholds,
) -> Option<ClassifiedLoan> {
    let cbsa = crosswalk.cbsa_for(&loan.county_geoid5)?;
    Some(ClassifiedLoan {
        lender_id:      loan.lender_id.clone(),
        key:            MarketPeriodKey::new(cbsa, loan.activity_year),
        loan_amount:    loan.loan_amount,
        classification: classify(&loan.demographics),
        flags:          tract_flags(loan, thresholds),
    })
}

#[derive(Debug, Clone, Default)]
pub struct ClassifiedBatch {
    pub loans:        Vec<ClassifiedLoan>,
    /// Rows rejected by the loan filter.
    pub filtered_out: u64,
    /// Rows whose county GEOID5 is not in the crosswalk.
    pub unkeyed:      u64,
}

enum Outcome {
    Kept(ClassifiedLoan),
    Filtered,
    Unkeyed,
}

/// Filter and classify a batch. Rows are independent, so this runs in parallel.
pub fn classify_loans(
    loans:     &[LoanRecord],
    crosswalk: &CrosswalkTable,
    config:    &ReportConfig,
) -> ClassifiedBatch {
    let thresholds = config.thresholds();
    let outcomes: Vec<Outcome> = loans
        .par_iter()
        .map(|loan| {
            if !config.loan_filter.accepts(loan) {
                return Outcome::Filtered;
            }
            match classify_loan(loan, crosswalk, &thresholds) {
                Some(classified) => Outcome::Kept(classified),
                None => Outcome::Unkeyed,
            }
        })
        .collect();

    let mut batch = ClassifiedBatch::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Kept(loan) => batch.loans.push(loan),
            Outcome::Filtered   => batch.filtered_out += 1,
            Outcome::Unkeyed    => batch.unkeyed += 1,
        }
    }
    if batch.unkeyed > 0 {
        log::warn!(
            "aggregation: {} loans reference counties missing from the crosswalk",
            batch.unkeyed
        );
    }
    batch
}

// ── Report metrics ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMetric {
    Hispanic,
    Black,
    Asian,
    NativeAmerican,
    HoPi,
    White,
    /// Sum of the five minority subcategory shares. Counts a multi-race
    /// respondent once per subcategory.
    CombinedMinority,
    /// Share of loans with at least one minority flag, each loan once.
    MinorityDistinct,
    Lmict,
    Mmct,
    Lmib,
}

impl ReportMetric {
    pub const ALL: [ReportMetric; 11] = [
        Self::Hispanic,
        Self::Black,
        Self::Asian,
        Self::NativeAmerican,
        Self::HoPi,
        Self::White,
        Self::CombinedMinority,
        Self::MinorityDistinct,
        Self::Lmict,
        Self::Mmct,
        Self::Lmib,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Hispanic         => "hispanic",
            Self::Black            => "black",
            Self::Asian            => "asian",
            Self::NativeAmerican   => "native_american",
            Self::HoPi             => "hopi",
            Self::White            => "white",
            Self::CombinedMinority => "combined_minority",
            Self::MinorityDistinct => "minority_distinct",
            Self::Lmict            => "lmict",
            Self::Mmct             => "mmct",
            Self::Lmib             => "lmib",
        }
    }
}

// ── Per-lender aggregate ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LenderAggregate {
    pub total_loans:             u64,
    pub total_amount:            f64,
    pub loans_with_demographics: u64,
    pub hispanic:                u64,
    pub black:                   u64,
    pub asian:                   u64,
    pub native_american:         u64,
    pub hopi:                    u64,
    pub white:                   u64,
    pub minority_any:            u64,
    /// Loans carrying more than one minority flag.
    pub multi_minority:          u64,
    pub lmict:                   u64,
    pub mmct:                    u64,
    pub lmib:                    u64,
    pub lmib_defined:            u64,
}

impl LenderAggregate {
    pub fn add(&mut self, loan: &ClassifiedLoan) {
        let c = &loan.classification;
        self.total_loans += 1;
        self.total_amount += loan.loan_amount;
        self.loans_with_demographics += u64::from(c.has_demographic_data);
        self.hispanic += u64::from(c.is_hispanic);
        self.black += u64::from(c.is_black);
        self.asian += u64::from(c.is_asian);
        self.native_american += u64::from(c.is_native_american);
        self.hopi += u64::from(c.is_hopi);
        self.white += u64::from(c.is_white);
        self.minority_any += u64::from(c.is_minority());
        self.multi_minority += u64::from(c.minority_flag_count() > 1);
        self.lmict += u64::from(loan.flags.is_lmict == Some(true));
        self.mmct += u64::from(loan.flags.is_mmct == Some(true));
        self.lmib += u64::from(loan.flags.is_lmib == Some(true));
        self.lmib_defined += u64::from(loan.flags.is_lmib.is_some());
    }

    pub fn merge(&mut self, other: &LenderAggregate) {
        self.total_loans += other.total_loans;
        self.total_amount += other.total_amount;
        self.loans_with_demographics += other.loans_with_demographics;
        self.hispanic += other.hispanic;
        self.black += other.black;
        self.asian += other.asian;
        self.native_american += other.native_american;
        self.hopi += other.hopi;
        self.white += other.white;
        self.minority_any += other.minority_any;
        self.multi_minority += other.multi_minority;
        self.lmict += other.lmict;
        self.mmct += other.mmct;
        self.lmib += other.lmib;
        self.lmib_defined += other.lmib_defined;
    }

    pub fn category_count(&self, category: RaceEthnicity) -> u64 {
        match category {
            RaceEthnicity::Hispanic       => self.hispanic,
            RaceEthnicity::Black          => self.black,
            RaceEthnicity::Asian          => self.asian,
            RaceEthnicity::NativeAmerican => self.native_american,
            RaceEthnicity::HoPi           => self.hopi,
            RaceEthnicity::White          => self.white,
        }
    }

    /// (numerator, denominator) behind a metric's share.
    pub fn counts(&self, metric: ReportMetric) -> (u64, u64) {
        let with_data = self.loans_with_demographics;
        match metric {
            ReportMetric::Hispanic         => (self.hispanic, with_data),
            ReportMetric::Black            => (self.black, with_data),
            ReportMetric::Asian            => (self.asian, with_data),
            ReportMetric::NativeAmerican   => (self.native_american, with_data),
            ReportMetric::HoPi             => (self.hopi, with_data),
            ReportMetric::White            => (self.white, with_data),
            ReportMetric::CombinedMinority => {
                let summed = RaceEthnicity::ALL
                    .into_iter()
                    .filter(|c| c.is_minority())
                    .map(|c| self.category_count(c))
                    .sum();
                (summed, with_data)
            }
            ReportMetric::MinorityDistinct => (self.minority_any, with_data),
            ReportMetric::Lmict            => (self.lmict, self.total_loans),
            ReportMetric::Mmct             => (self.mmct, self.total_loans),
            ReportMetric::Lmib             => (self.lmib, self.lmib_defined),
        }
    }

    /// Percent share for a metric; undefined on an empty denominator.
    pub fn share(&self, metric: ReportMetric) -> Metric {
        let (num, den) = self.counts(metric);
        Metric::share(num, den)
    }

    pub fn volume(&self, basis: VolumeBasis) -> f64 {
        match basis {
            VolumeBasis::LoanCount  => self.total_loans as f64,
            VolumeBasis::LoanAmount => self.total_amount,
        }
    }
}

// ── Market partition ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MarketAggregates {
    by_key: BTreeMap<MarketPeriodKey, BTreeMap<LenderId, LenderAggregate>>,
}

impl MarketAggregates {
    pub fn build(loans: &[ClassifiedLoan]) -> Self {
        let mut by_key: BTreeMap<MarketPeriodKey, BTreeMap<LenderId, LenderAggregate>> =
            BTreeMap::new();
        for loan in loans {
            by_key
                .entry(loan.key.clone())
                .or_default()
                .entry(loan.lender_id.clone())
                .or_default()
                .add(loan);
        }

        for (key, lenders) in &by_key {
            let multi: u64 = lenders.values().map(|a| a.multi_minority).sum();
            if multi > 0 {
                log::warn!(
                    "aggregation: market={key} has {multi} multi-race loans; \
                     combined minority share counts them more than once"
                );
            }
        }
        Self { by_key }
    }

    pub fn keys(&self) -> impl Iterator<Item = &MarketPeriodKey> {
        self.by_key.keys()
    }

    pub fn lenders(&self, key: &MarketPeriodKey) -> Option<&BTreeMap<LenderId, LenderAggregate>> {
        self.by_key.get(key)
    }

    pub fn get(&self, key: &MarketPeriodKey, lender_id: &str) -> Option<&LenderAggregate> {
        self.by_key.get(key)?.get(lender_id)
    }

    /// Lender volumes observed in one key.
    pub fn volumes(&self, key: &MarketPeriodKey, basis: VolumeBasis) -> HashMap<LenderId, f64> {
        self.by_key
            .get(key)
            .map(|lenders| {
                lenders
                    .iter()
                    .map(|(id, agg)| (id.clone(), agg.volume(basis)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whole-market totals for one key.
    pub fn market_total(&self, key: &MarketPeriodKey) -> LenderAggregate {
        let mut total = LenderAggregate::default();
        if let Some(lenders) = self.by_key.get(key) {
            for agg in lenders.values() {
                total.merge(agg);
            }
        }
        total
    }
}
