mod common;

use fairlend_core::{
    crosswalk::{CrosswalkRow, CrosswalkTable},
    error::FairLendError,
    resolver::{AmbiguityPolicy, CountyQuery, CountyResolver, MatchTier, Resolution, UnresolvedReason},
};

fn resolver(table: &CrosswalkTable) -> CountyResolver<'_> {
    CountyResolver::new(table, AmbiguityPolicy::Reject)
}

fn geoid(resolution: &Resolution) -> &str {
    match resolution {
        Resolution::Matched(r) => &r.geoid5,
        Resolution::Unresolved(reason) => panic!("expected a match, got {reason}"),
    }
}

#[test]
fn autauga_resolves_to_01001() {
    let table = common::sample_crosswalk();
    let result = resolver(&table).resolve("Autauga", "Alabama");

    let county = result.matched().expect("matched");
    assert_eq!(county.geoid5, "01001");
    assert_eq!(county.state_code, "01");
    assert_eq!(county.cbsa_code, "99999");
    assert_eq!(county.match_tier, MatchTier::Exact);
}

#[test]
fn new_york_new_york_is_manhattan() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);
    assert_eq!(geoid(&r.resolve("New York", "New York")), "36061");
    assert_eq!(geoid(&r.resolve("new york", "NY")), "36061");
}

#[test]
fn abbreviations_possessives_and_saints_resolve() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);

    assert_eq!(geoid(&r.resolve("Cook", "IL")), "17031");
    assert_eq!(geoid(&r.resolve("Queen Annes", "Maryland")), "24035");
    assert_eq!(geoid(&r.resolve("Queen Anne's County", "md")), "24035");
    assert_eq!(geoid(&r.resolve("Saint Clair", "Illinois")), "17163");
    assert_eq!(geoid(&r.resolve("St Clair County", "Illinois")), "17163");
    assert_eq!(geoid(&r.resolve("  DUPAGE  county ", "illinois")), "17043");
}

#[test]
fn city_and_county_of_the_same_name_stay_distinct() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);

    assert_eq!(geoid(&r.resolve("Baltimore", "MD")), "24005");
    assert_eq!(geoid(&r.resolve("Baltimore County", "MD")), "24005");
    assert_eq!(geoid(&r.resolve("Baltimore city", "MD")), "24510");
    assert_eq!(geoid(&r.resolve("St. Louis", "Missouri")), "29189");
    assert_eq!(geoid(&r.resolve("St. Louis City", "Missouri")), "29510");
}

#[test]
fn virginia_does_not_reach_into_west_virginia() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);

    assert_eq!(
        r.resolve("Jefferson", "Virginia"),
        Resolution::Unresolved(UnresolvedReason::CountyNotFoundInState {
            state: "virginia".into()
        })
    );
    assert_eq!(geoid(&r.resolve("Jefferson", "WV")), "54037");
}

#[test]
fn state_not_found_and_county_not_found_are_distinct() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);

    assert_eq!(
        r.resolve("Cook", "Narnia"),
        Resolution::Unresolved(UnresolvedReason::StateNotFound { state: "narnia".into() })
    );
    assert_eq!(
        r.resolve("Atlantis", "Illinois"),
        Resolution::Unresolved(UnresolvedReason::CountyNotFoundInState {
            state: "illinois".into()
        })
    );
    assert_eq!(
        r.resolve("   ", "Illinois"),
        Resolution::Unresolved(UnresolvedReason::EmptyCountyName)
    );
}

#[test]
fn containment_tiers_apply_when_no_exact_match() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);

    // Ticket text longer than the crosswalk name.
    let county = r.resolve("Cook County Cook", "Illinois");
    assert_eq!(county.matched().unwrap().match_tier, MatchTier::CandidateWithinInput);

    // Ticket text shorter than the crosswalk name.
    let county = r.resolve("Queen", "Maryland");
    assert_eq!(geoid(&county), "24035");
    assert_eq!(county.matched().unwrap().match_tier, MatchTier::InputWithinCandidate);
}

#[test]
fn ambiguous_containment_is_rejected_by_default() {
    let table = common::sample_crosswalk();

    // "baltimore" is exact for the county, so use a fragment both rows contain.
    let result = resolver(&table).resolve("Balti", "Maryland");
    assert_eq!(
        result,
        Resolution::Unresolved(UnresolvedReason::Ambiguous {
            candidates: vec!["24005".into(), "24510".into()]
        })
    );

    let err = result
        .into_result(&CountyQuery::new("Balti", "Maryland"))
        .unwrap_err();
    assert!(matches!(err, FairLendError::AmbiguousMatch { .. }), "{err}");
}

#[test]
fn first_match_policy_takes_first_row_of_strongest_tier() {
    let table = common::sample_crosswalk();
    let r = CountyResolver::new(&table, AmbiguityPolicy::FirstMatch);

    let county = r.resolve("Balti", "Maryland");
    let county = county.matched().expect("first match taken");
    assert_eq!(county.geoid5, "24005");
    assert_eq!(county.alternatives, vec!["24510".to_string()]);
}

#[test]
fn first_match_policy_prefers_stronger_tier_over_earlier_row() {
    let table = common::sample_crosswalk();
    let r = CountyResolver::new(&table, AmbiguityPolicy::FirstMatch);

    // Baltimore County comes first and matches "baltimore city" by containment,
    // but the exact Baltimore city row wins.
    let county = r.resolve("Baltimore city", "MD");
    let county = county.matched().expect("matched");
    assert_eq!(county.geoid5, "24510");
    assert_eq!(county.match_tier, MatchTier::Exact);
    assert!(county.alternatives.is_empty());
}

#[test]
fn county_literal_tier_handles_leading_county() {
    let rows = vec![CrosswalkRow::new("County Durham County North Carolina", "37", "63", "20500", "Durham-Chapel Hill, NC")];
    let table = CrosswalkTable::from_rows(rows).unwrap();

    let county = resolver(&table).resolve("Durham County", "NC");
    assert_eq!(geoid(&county), "37063");
}

#[test]
fn every_crosswalk_row_resolves_to_itself() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../data/crosswalk/county_crosswalk.json");
    for table in [common::sample_crosswalk(), CrosswalkTable::load_json(path).unwrap()] {
        let r = resolver(&table);
        for record in table.iter() {
            let result = r.resolve(&record.county_name, &record.state_name);
            assert_eq!(
                geoid(&result),
                record.geoid5,
                "{} / {} resolved elsewhere",
                record.county_name,
                record.state_name
            );
        }
    }
}

#[test]
fn resolution_is_idempotent() {
    let table = common::sample_crosswalk();
    let r = resolver(&table);
    for (county, state) in [("Cook", "IL"), ("Balti", "MD"), ("Nowhere", "IL"), ("Cook", "XX")] {
        assert_eq!(r.resolve(county, state), r.resolve(county, state));
    }
}

#[test]
fn batch_keeps_going_past_unresolved_entries() {
    common::init_logging();
    let table = common::sample_crosswalk();
    let queries = vec![
        CountyQuery::new("Cook", "Illinois"),
        CountyQuery::new("Atlantis", "Illinois"),
        CountyQuery::new("DuPage", "IL"),
        CountyQuery::new("Cook", "Illinois"),
        CountyQuery::new("Kings", "Narnia"),
    ];

    let report = resolver(&table).resolve_batch(&queries);
    assert_eq!(report.resolved.len(), 3);
    assert_eq!(report.unresolved.len(), 2);
    assert!(!report.is_complete());
    assert_eq!(report.geoids().into_iter().collect::<Vec<_>>(), vec!["17031", "17043"]);
    assert_eq!(report.cbsa_codes().len(), 1);

    let reasons: Vec<String> = report.unresolved.iter().map(|u| u.reason.to_string()).collect();
    assert_eq!(
        reasons,
        vec!["county not found in state illinois", "state not found: narnia"]
    );
}

#[test]
fn unresolved_converts_to_geography_error() {
    let table = common::sample_crosswalk();
    let query = CountyQuery::new("Atlantis", "Illinois");
    let err = resolver(&table).resolve_query(&query).into_result(&query).unwrap_err();
    match err {
        FairLendError::UnresolvedGeography { county, state, reason } => {
            assert_eq!(county, "Atlantis");
            assert_eq!(state, "Illinois");
            assert_eq!(reason, "county not found in state illinois");
        }
        other => panic!("unexpected error {other}"),
    }
}
