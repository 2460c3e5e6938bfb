//! Shared primitive types used across every stage.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 5-digit county FIPS code (2-digit state + 3-digit county).
pub type Geoid5 = String;

/// 5-digit CBSA code. `"99999"` means no CBSA.
pub type CbsaCode = String;

/// Lender identifier (LEI for HMDA, respondent id for small business).
pub type LenderId = String;

/// The canonical run identifier.
pub type RunId = String;

/// HMDA / CRA activity year.
pub type Year = u16;

/// CBSA sentinel for counties outside any metropolitan or micropolitan area.
pub const NO_CBSA: &str = "99999";

/// The unit of peer-group scoping. No aggregate crosses two keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketPeriodKey {
    pub cbsa_code: CbsaCode,
    pub year:      Year,
}

impl MarketPeriodKey {
    pub fn new(cbsa_code: impl Into<CbsaCode>, year: Year) -> Self {
        Self { cbsa_code: cbsa_code.into(), year }
    }
}

impl fmt::Display for MarketPeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cbsa_code, self.year)
    }
}
