//! Loan-level records as they arrive from the HMDA / small-business extracts.

use crate::{
    demographics::LoanDemographics,
    types::{Geoid5, LenderId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoanPurpose {
    #[serde(rename = "1")]
    HomePurchase,
    #[serde(rename = "2")]
    HomeImprovement,
    #[serde(rename = "31")]
    Refinancing,
    #[serde(rename = "32")]
    CashOutRefinancing,
    #[serde(rename = "4")]
    OtherPurpose,
    #[serde(rename = "5")]
    NotApplicable,
}

impl LoanPurpose {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "1"  => Some(Self::HomePurchase),
            "2"  => Some(Self::HomeImprovement),
            "31" => Some(Self::Refinancing),
            "32" => Some(Self::CashOutRefinancing),
            "4"  => Some(Self::OtherPurpose),
            "5"  => Some(Self::NotApplicable),
            _    => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionTaken {
    #[serde(rename = "1")]
    Originated,
    #[serde(rename = "2")]
    ApprovedNotAccepted,
    #[serde(rename = "3")]
    Denied,
    #[serde(rename = "4")]
    Withdrawn,
    #[serde(rename = "5")]
    ClosedIncomplete,
    #[serde(rename = "6")]
    PurchasedLoan,
    #[serde(rename = "7")]
    PreapprovalDenied,
    #[serde(rename = "8")]
    PreapprovalApprovedNotAccepted,
}

impl ActionTaken {
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "1" => Some(Self::Originated),
            "2" => Some(Self::ApprovedNotAccepted),
            "3" => Some(Self::Denied),
            "4" => Some(Self::Withdrawn),
            "5" => Some(Self::ClosedIncomplete),
            "6" => Some(Self::PurchasedLoan),
            "7" => Some(Self::PreapprovalDenied),
            "8" => Some(Self::PreapprovalApprovedNotAccepted),
            _   => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    pub lender_id:     LenderId,
    pub activity_year: Year,
    pub county_geoid5: Geoid5,
    #[serde(default)]
    pub census_tract:  Option<String>,
    pub action_taken:  String,
    pub loan_purpose:  String,
    pub loan_amount:   f64,
    /// Applicant income in thousands of dollars.
    #[serde(default)]
    pub income:        Option<f64>,
    #[serde(default)]
    pub tract_to_msa_income_pct:        Option<f64>,
    #[serde(default)]
    pub tract_minority_population_pct:  Option<f64>,
    #[serde(default)]
    pub ffiec_msa_median_family_income: Option<f64>,
    #[serde(default)]
    pub demographics:  LoanDemographics,
}

impl LoanRecord {
    pub fn action(&self) -> Option<ActionTaken> {
        ActionTaken::parse(&self.action_taken)
    }

    pub fn purpose(&self) -> Option<LoanPurpose> {
        LoanPurpose::parse(&self.loan_purpose)
    }
}

/// Which rows enter a report. Empty lists accept everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanFilter {
    #[serde(default)]
    pub action_taken:  Vec<ActionTaken>,
    #[serde(default)]
    pub loan_purposes: Vec<LoanPurpose>,
}

impl LoanFilter {
    /// Originations of any purpose.
    pub fn originations() -> Self {
        Self {
            action_taken:  vec![ActionTaken::Originated],
            loan_purposes: Vec::new(),
        }
    }

    pub fn accepts(&self, loan: &LoanRecord) -> bool {
        let action_ok = self.action_taken.is_empty()
            || loan.action().is_some_and(|a| self.action_taken.contains(&a));
        let purpose_ok = self.loan_purposes.is_empty()
            || loan.purpose().is_some_and(|p| self.loan_purposes.contains(&p));
        action_ok && purpose_ok
    }
}
