//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use fairlend_core::{
    crosswalk::{CrosswalkRow, CrosswalkTable},
    demographics::LoanDemographics,
    loan::LoanRecord,
};

pub fn sample_rows() -> Vec<CrosswalkRow> {
    vec![
        CrosswalkRow::new("Autauga County Alabama", "1", "1", "99999", ""),
        CrosswalkRow::new("Baldwin County Alabama", "01", "003", "19300", "Daphne-Fairhope-Foley, AL"),
        CrosswalkRow::new("Cook County Illinois", "17", "31", "16980", "Chicago-Naperville-Elgin, IL-IN-WI"),
        CrosswalkRow::new("DuPage County Illinois", "17", "43", "16980", "Chicago-Naperville-Elgin, IL-IN-WI"),
        CrosswalkRow::new("St. Clair County Illinois", "17", "163", "41180", "St. Louis, MO-IL"),
        CrosswalkRow::new("Queen Anne's County Maryland", "24", "35", "12580", "Baltimore-Columbia-Towson, MD"),
        CrosswalkRow::new("Baltimore County Maryland", "24", "5", "12580", "Baltimore-Columbia-Towson, MD"),
        CrosswalkRow::new("Baltimore city Maryland", "24", "510", "12580", "Baltimore-Columbia-Towson, MD"),
        CrosswalkRow::new("St. Louis County Missouri", "29", "189", "41180", "St. Louis, MO-IL"),
        CrosswalkRow::new("St. Louis city Missouri", "29", "510", "41180", "St. Louis, MO-IL"),
        CrosswalkRow::new("Kings County New York", "36", "47", "35620", "New York-Newark-Jersey City, NY-NJ-PA"),
        CrosswalkRow::new("New York County New York", "36", "61", "35620", "New York-Newark-Jersey City, NY-NJ-PA"),
        CrosswalkRow::new("Fairfax County Virginia", "51", "59", "47900", "Washington-Arlington-Alexandria, DC-VA-MD-WV"),
        CrosswalkRow::new("Jefferson County West Virginia", "54", "37", "47900", "Washington-Arlington-Alexandria, DC-VA-MD-WV"),
    ]
}

pub fn sample_crosswalk() -> CrosswalkTable {
    CrosswalkTable::from_rows(sample_rows()).expect("sample crosswalk")
}

/// An originated home-purchase loan with complete tract data.
pub fn loan(lender: &str, year: u16, geoid5: &str, race: &str) -> LoanRecord {
    LoanRecord {
        lender_id:     lender.into(),
        activity_year: year,
        county_geoid5: geoid5.into(),
        census_tract:  Some(format!("{geoid5}000100")),
        action_taken:  "1".into(),
        loan_purpose:  "1".into(),
        loan_amount:   250_000.0,
        income:        Some(90.0),
        tract_to_msa_income_pct:        Some(100.0),
        tract_minority_population_pct:  Some(20.0),
        ffiec_msa_median_family_income: Some(100_000.0),
        demographics:  LoanDemographics::from_codes(&["2"], &[race]),
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
