//! Demographic classifier: NCRC hierarchical race/ethnicity rule.
//!
//! RULES:
//!   - Ethnicity is checked first. Any Hispanic code in any of the five
//!     ethnicity fields makes the loan Hispanic and no race flag is set.
//!   - Otherwise each race category is an independent disjunction over
//!     the five race fields. A multi-race respondent can carry several
//!     category flags at once.
//!   - Codes are opaque strings matched against the tables below.
//!     "03" is not "3".

use serde::{Deserialize, Serialize};

// ── Code tables ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EthnicityCode {
    HispanicOrLatino,
    Mexican,
    PuertoRican,
    Cuban,
    OtherHispanicOrLatino,
    NotHispanicOrLatino,
    NotProvided,
    NotApplicable,
    NoCoApplicant,
}

const ETHNICITY_CODES: &[(&str, EthnicityCode)] = &[
    ("1",  EthnicityCode::HispanicOrLatino),
    ("11", EthnicityCode::Mexican),
    ("12", EthnicityCode::PuertoRican),
    ("13", EthnicityCode::Cuban),
    ("14", EthnicityCode::OtherHispanicOrLatino),
    ("2",  EthnicityCode::NotHispanicOrLatino),
    ("3",  EthnicityCode::NotProvided),
    ("4",  EthnicityCode::NotApplicable),
    ("5",  EthnicityCode::NoCoApplicant),
];

impl EthnicityCode {
    pub fn parse(code: &str) -> Option<Self> {
        ETHNICITY_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, e)| *e)
    }

    pub fn code(self) -> &'static str {
        ETHNICITY_CODES
            .iter()
            .find(|(_, e)| *e == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    pub fn is_hispanic(self) -> bool {
        matches!(
            self,
            Self::HispanicOrLatino
                | Self::Mexican
                | Self::PuertoRican
                | Self::Cuban
                | Self::OtherHispanicOrLatino
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceCode {
    AmericanIndianOrAlaskaNative,
    Asian,
    AsianIndian,
    Chinese,
    Filipino,
    Japanese,
    Korean,
    Vietnamese,
    OtherAsian,
    BlackOrAfricanAmerican,
    NativeHawaiianOrPacificIslander,
    NativeHawaiian,
    GuamanianOrChamorro,
    Samoan,
    OtherPacificIslander,
    White,
    NotProvided,
    NotApplicable,
    NoCoApplicant,
}

const RACE_CODES: &[(&str, RaceCode)] = &[
    ("1",  RaceCode::AmericanIndianOrAlaskaNative),
    ("2",  RaceCode::Asian),
    ("21", RaceCode::AsianIndian),
    ("22", RaceCode::Chinese),
    ("23", RaceCode::Filipino),
    ("24", RaceCode::Japanese),
    ("25", RaceCode::Korean),
    ("26", RaceCode::Vietnamese),
    ("27", RaceCode::OtherAsian),
    ("3",  RaceCode::BlackOrAfricanAmerican),
    ("4",  RaceCode::NativeHawaiianOrPacificIslander),
    ("41", RaceCode::NativeHawaiian),
    ("42", RaceCode::GuamanianOrChamorro),
    ("43", RaceCode::Samoan),
    ("44", RaceCode::OtherPacificIslander),
    ("5",  RaceCode::White),
    ("6",  RaceCode::NotProvided),
    ("7",  RaceCode::NotApplicable),
    ("8",  RaceCode::NoCoApplicant),
];

impl RaceCode {
    pub fn parse(code: &str) -> Option<Self> {
        RACE_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, r)| *r)
    }

    pub fn code(self) -> &'static str {
        RACE_CODES
            .iter()
            .find(|(_, r)| *r == self)
            .map(|(c, _)| *c)
            .unwrap_or_default()
    }

    /// Category this code counts toward. `None` for the non-response codes.
    pub fn category(self) -> Option<RaceCategory> {
        use RaceCode::*;
        match self {
            AmericanIndianOrAlaskaNative => Some(RaceCategory::NativeAmerican),
            Asian | AsianIndian | Chinese | Filipino | Japanese | Korean | Vietnamese
            | OtherAsian => Some(RaceCategory::Asian),
            BlackOrAfricanAmerican => Some(RaceCategory::Black),
            NativeHawaiianOrPacificIslander | NativeHawaiian | GuamanianOrChamorro | Samoan
            | OtherPacificIslander => Some(RaceCategory::HoPi),
            White => Some(RaceCategory::White),
            NotProvided | NotApplicable | NoCoApplicant => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceCategory {
    NativeAmerican,
    Asian,
    Black,
    HoPi,
    White,
}

/// Rollup categories in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RaceEthnicity {
    Hispanic,
    Black,
    Asian,
    NativeAmerican,
    HoPi,
    White,
}

impl RaceEthnicity {
    pub const ALL: [RaceEthnicity; 6] = [
        Self::Hispanic,
        Self::Black,
        Self::Asian,
        Self::NativeAmerican,
        Self::HoPi,
        Self::White,
    ];

    pub fn is_minority(self) -> bool {
        self != Self::White
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Hispanic       => "hispanic",
            Self::Black          => "black",
            Self::Asian          => "asian",
            Self::NativeAmerican => "native_american",
            Self::HoPi           => "hopi",
            Self::White          => "white",
        }
    }
}

// ── Input / output ───────────────────────────────────────────────────────────

/// Raw ethnicity and race code fields of one loan. Empty means absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanDemographics {
    #[serde(default)]
    pub ethnicity: [Option<String>; 5],
    #[serde(default)]
    pub race:      [Option<String>; 5],
}

impl LoanDemographics {
    /// Build from up to five ethnicity and five race codes.
    /// Extra codes beyond five are ignored; empty strings are absent.
    pub fn from_codes(ethnicity: &[&str], race: &[&str]) -> Self {
        let mut demo = Self::default();
        for (slot, code) in demo.ethnicity.iter_mut().zip(ethnicity) {
            *slot = present(code);
        }
        for (slot, code) in demo.race.iter_mut().zip(race) {
            *slot = present(code);
        }
        demo
    }

    pub fn ethnicity_codes(&self) -> impl Iterator<Item = EthnicityCode> + '_ {
        self.ethnicity
            .iter()
            .flatten()
            .filter_map(|c| EthnicityCode::parse(c))
    }

    pub fn race_codes(&self) -> impl Iterator<Item = RaceCode> + '_ {
        self.race.iter().flatten().filter_map(|c| RaceCode::parse(c))
    }
}

fn present(code: &str) -> Option<String> {
    if code.is_empty() {
        None
    } else {
        Some(code.to_string())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub is_hispanic:          bool,
    pub is_black:             bool,
    pub is_asian:             bool,
    pub is_white:             bool,
    pub is_native_american:   bool,
    pub is_hopi:              bool,
    pub has_demographic_data: bool,
}

impl ClassificationResult {
    pub fn has(&self, category: RaceEthnicity) -> bool {
        match category {
            RaceEthnicity::Hispanic       => self.is_hispanic,
            RaceEthnicity::Black          => self.is_black,
            RaceEthnicity::Asian          => self.is_asian,
            RaceEthnicity::NativeAmerican => self.is_native_american,
            RaceEthnicity::HoPi           => self.is_hopi,
            RaceEthnicity::White          => self.is_white,
        }
    }

    /// Every category flag this loan asserts.
    pub fn categories(&self) -> Vec<RaceEthnicity> {
        RaceEthnicity::ALL
            .into_iter()
            .filter(|c| self.has(*c))
            .collect()
    }

    /// Per-loan OR of the minority categories.
    pub fn is_minority(&self) -> bool {
        self.categories().into_iter().any(RaceEthnicity::is_minority)
    }

    /// Number of minority flags set. Greater than one marks a loan that
    /// a summed "combined minority" share counts more than once.
    pub fn minority_flag_count(&self) -> usize {
        self.categories()
            .into_iter()
            .filter(|c| c.is_minority())
            .count()
    }
}

/// Apply the NCRC rule to one loan.
pub fn classify(demo: &LoanDemographics) -> ClassificationResult {
    if demo.ethnicity_codes().any(EthnicityCode::is_hispanic) {
        return ClassificationResult {
            is_hispanic:          true,
            has_demographic_data: true,
            ..Default::default()
        };
    }

    let mut result = ClassificationResult::default();
    for category in demo.race_codes().filter_map(RaceCode::category) {
        match category {
            RaceCategory::Black          => result.is_black = true,
            RaceCategory::Asian          => result.is_asian = true,
            RaceCategory::NativeAmerican => result.is_native_american = true,
            RaceCategory::HoPi           => result.is_hopi = true,
            RaceCategory::White          => result.is_white = true,
        }
        result.has_demographic_data = true;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_tables_round_trip_through_code() {
        for (code, eth) in ETHNICITY_CODES {
            assert_eq!(eth.code(), *code);
        }
        for (code, race) in RACE_CODES {
            assert_eq!(race.code(), *code);
        }
    }

    #[test]
    fn codes_are_not_numerically_coerced() {
        assert_eq!(RaceCode::parse("03"), None);
        assert_eq!(RaceCode::parse(" 3"), None);
        assert_eq!(EthnicityCode::parse("1.0"), None);
        assert_eq!(RaceCode::parse("3"), Some(RaceCode::BlackOrAfricanAmerican));
    }

    #[test]
    fn only_non_response_race_codes_lack_a_category() {
        let without: Vec<&str> = RACE_CODES
            .iter()
            .filter(|(_, r)| r.category().is_none())
            .map(|(c, _)| *c)
            .collect();
        assert_eq!(without, vec!["6", "7", "8"]);
        assert_eq!(RACE_CODES.len() - without.len(), 16);
    }

    #[test]
    fn empty_strings_are_absent() {
        let demo = LoanDemographics::from_codes(&["", "2"], &["", "", "5"]);
        assert_eq!(demo.ethnicity[0], None);
        assert_eq!(demo.ethnicity[1].as_deref(), Some("2"));
        assert_eq!(demo.race[2].as_deref(), Some("5"));
    }
}
