mod common;

use common::{loan, sample_crosswalk};
use fairlend_core::{
    aggregation::{classify_loan, classify_loans, LenderAggregate, MarketAggregates, ReportMetric},
    config::ReportConfig,
    demographics::LoanDemographics,
    error::FairLendError,
    metric::{Metric, UndefinedReason},
    peer_cohort::PeerBand,
    significance::two_proportion_z,
    tract_flags::{lmib_ratio, tract_flags, TractThresholds},
    types::MarketPeriodKey,
};

// ── Metric ───────────────────────────────────────────────────────────────────

#[test]
fn zero_denominator_is_undefined_not_zero() {
    assert_eq!(Metric::share(0, 0), Metric::Undefined(UndefinedReason::ZeroDenominator));
    assert_eq!(Metric::share(0, 5), Metric::Value(0.0));
    assert_eq!(Metric::share(1, 4), Metric::Value(25.0));
}

#[test]
fn undefined_propagates_through_arithmetic() {
    let undefined = Metric::Undefined(UndefinedReason::EmptyCohort);
    assert_eq!(Metric::difference(Metric::Value(10.0), undefined), undefined);
    assert_eq!(Metric::difference(undefined, Metric::Value(10.0)), undefined);
    assert_eq!(undefined.map(|v| v * 2.0), undefined);
    assert_eq!(Metric::difference(Metric::Value(10.0), Metric::Value(4.0)), Metric::Value(6.0));
}

#[test]
fn undefined_renders_and_serialises_distinctly() {
    let undefined = Metric::Undefined(UndefinedReason::ZeroDenominator);
    assert_eq!(undefined.to_string(), "n/a");
    assert_eq!(Metric::Value(33.333).to_string(), "33.33");

    let json = serde_json::to_value(undefined).unwrap();
    assert!(json["value"].is_null());
    assert_eq!(json["undefined"], "zero_denominator");
    assert_eq!(serde_json::to_value(Metric::Value(0.0)).unwrap()["value"], 0.0);
}

// ── Tract flags ──────────────────────────────────────────────────────────────

#[test]
fn lmib_ratio_is_undefined_without_positive_median() {
    assert_eq!(lmib_ratio(Some(60.0), None), Metric::Undefined(UndefinedReason::MissingInput));
    assert_eq!(lmib_ratio(Some(60.0), Some(0.0)), Metric::Undefined(UndefinedReason::MissingInput));
    assert_eq!(lmib_ratio(None, Some(100_000.0)), Metric::Undefined(UndefinedReason::MissingInput));
    assert_eq!(lmib_ratio(Some(60.0), Some(100_000.0)), Metric::Value(60.0));
}

#[test]
fn lmi_threshold_is_inclusive_mmct_is_exclusive() {
    let thresholds = TractThresholds::default();

    let mut at = loan("L", 2024, "17031", "5");
    at.tract_to_msa_income_pct = Some(80.0);
    at.tract_minority_population_pct = Some(50.0);
    at.income = Some(80.0);
    let flags = tract_flags(&at, &thresholds);
    assert_eq!(flags.is_lmict, Some(true));
    assert_eq!(flags.is_lmib, Some(true));
    assert_eq!(flags.is_mmct, Some(false));

    let mut above = at.clone();
    above.tract_to_msa_income_pct = Some(80.01);
    above.tract_minority_population_pct = Some(50.01);
    above.income = Some(81.0);
    let flags = tract_flags(&above, &thresholds);
    assert_eq!(flags.is_lmict, Some(false));
    assert_eq!(flags.is_lmib, Some(false));
    assert_eq!(flags.is_mmct, Some(true));
}

#[test]
fn missing_tract_inputs_leave_flags_unknown() {
    let mut l = loan("L", 2024, "17031", "5");
    l.tract_to_msa_income_pct = None;
    l.tract_minority_population_pct = None;
    l.ffiec_msa_median_family_income = None;
    let flags = tract_flags(&l, &TractThresholds::default());
    assert_eq!(flags.is_lmict, None);
    assert_eq!(flags.is_mmct, None);
    assert_eq!(flags.is_lmib, None);
}

// ── Significance ─────────────────────────────────────────────────────────────

#[test]
fn pooled_z_matches_hand_computation() {
    // p1 = .3, p2 = .2, pooled .25, se = sqrt(.25*.75*(2/100)) = .06124
    let z = two_proportion_z(30, 100, 20, 100).as_option().unwrap();
    assert!((z - 1.633).abs() < 1e-3, "z = {z}");

    let reversed = two_proportion_z(20, 100, 30, 100).as_option().unwrap();
    assert!((z + reversed).abs() < 1e-12);
}

#[test]
fn z_is_undefined_on_degenerate_samples() {
    assert!(!two_proportion_z(0, 0, 5, 10).is_defined());
    assert!(!two_proportion_z(5, 10, 0, 0).is_defined());
    // All successes on both sides: pooled variance is zero.
    assert!(!two_proportion_z(10, 10, 4, 4).is_defined());
    assert!(!two_proportion_z(11, 10, 4, 8).is_defined());
}

// ── Aggregation ──────────────────────────────────────────────────────────────

#[test]
fn shares_use_their_own_denominators() {
    let crosswalk = sample_crosswalk();
    let config = ReportConfig::default_test();

    let black = loan("L", 2024, "17031", "3");
    let mut no_data = loan("L", 2024, "17031", "6");
    no_data.tract_to_msa_income_pct = Some(70.0);
    let mut no_mfi = loan("L", 2024, "17031", "5");
    no_mfi.ffiec_msa_median_family_income = None;

    let batch = classify_loans(&[black, no_data, no_mfi], &crosswalk, &config);
    let aggregates = MarketAggregates::build(&batch.loans);
    let agg = aggregates.get(&MarketPeriodKey::new("16980", 2024), "L").unwrap();

    assert_eq!(agg.total_loans, 3);
    assert_eq!(agg.loans_with_demographics, 2);
    assert_eq!(agg.share(ReportMetric::Black), Metric::Value(50.0));
    assert_eq!(agg.counts(ReportMetric::Lmict), (1, 3));
    assert_eq!(agg.counts(ReportMetric::Lmib), (0, 2));
}

#[test]
fn combined_minority_sums_while_distinct_counts_once() {
    let crosswalk = sample_crosswalk();
    let mut multi = loan("L", 2024, "17031", "3");
    multi.demographics = LoanDemographics::from_codes(&["2"], &["3", "2"]);
    let white = loan("L", 2024, "17031", "5");

    let batch = classify_loans(&[multi, white], &crosswalk, &ReportConfig::default_test());
    let aggregates = MarketAggregates::build(&batch.loans);
    let agg = aggregates.get(&MarketPeriodKey::new("16980", 2024), "L").unwrap();

    assert_eq!(agg.multi_minority, 1);
    assert_eq!(agg.share(ReportMetric::CombinedMinority), Metric::Value(100.0));
    assert_eq!(agg.share(ReportMetric::MinorityDistinct), Metric::Value(50.0));
}

#[test]
fn empty_aggregate_reports_every_metric_undefined() {
    let agg = LenderAggregate::default();
    for metric in ReportMetric::ALL {
        assert!(!agg.share(metric).is_defined(), "{}", metric.label());
    }
}

#[test]
fn loans_outside_crosswalk_or_filter_are_counted_not_kept() {
    let crosswalk = sample_crosswalk();
    let mut denied = loan("L", 2024, "17031", "5");
    denied.action_taken = "3".into();
    let unknown_county = loan("L", 2024, "99001", "5");
    let kept = loan("L", 2024, "17043", "5");

    assert!(classify_loan(&unknown_county, &crosswalk, &TractThresholds::default()).is_none());

    let batch = classify_loans(&[denied, unknown_county, kept], &crosswalk, &ReportConfig::default_test());
    assert_eq!(batch.loans.len(), 1);
    assert_eq!(batch.filtered_out, 1);
    assert_eq!(batch.unkeyed, 1);
    assert_eq!(batch.loans[0].key, MarketPeriodKey::new("16980", 2024));
}

#[test]
fn rural_counties_key_on_no_cbsa() {
    let crosswalk = sample_crosswalk();
    let classified =
        classify_loan(&loan("L", 2022, "01001", "5"), &crosswalk, &TractThresholds::default()).unwrap();
    assert_eq!(classified.key, MarketPeriodKey::new("99999", 2022));
}

// ── Config ───────────────────────────────────────────────────────────────────

#[test]
fn bundled_config_loads() {
    let config = ReportConfig::load("../data").expect("reference config");
    assert_eq!(config, ReportConfig::default_test());
}

#[test]
fn inverted_band_is_rejected() {
    let mut config = ReportConfig::default_test();
    config.peer_band = PeerBand {
        lower_multiplier: 2.0,
        upper_multiplier: 0.5,
    };
    assert!(matches!(config.validate(), Err(FairLendError::InvalidConfig { .. })));

    let mut config = ReportConfig::default_test();
    config.mmct_threshold_pct = 120.0;
    assert!(matches!(config.validate(), Err(FairLendError::InvalidConfig { .. })));
}
