//! County/State resolver: free-text ticket geography to GEOID5 + CBSA.
//!
//! Matching order for each crosswalk row in the requested state:
//!   1. exact normalised equality
//!   2. ticket name contained in the crosswalk name
//!   3. crosswalk name contained in the ticket name
//!   4. equality after removing every literal "county"
//!
//! Rows are scanned in crosswalk order. The strongest tier with any hit
//! decides. Several hits in that tier is an ambiguity, which is either
//! rejected or settled by first row, depending on `AmbiguityPolicy`.
//!
//! RULE: an unresolved county is never replaced by a default. Callers
//! collect the unresolved list and surface it.

use crate::{
    crosswalk::{CountyRecord, CrosswalkTable},
    error::FairLendError,
    normalize,
    types::{CbsaCode, Geoid5},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbiguityPolicy {
    /// Several equally good rows → unresolved with the candidate list.
    #[default]
    Reject,
    /// Take the first row, in crosswalk order, of the strongest tier.
    /// The other rows of that tier are reported as alternatives.
    FirstMatch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    Exact,
    InputWithinCandidate,
    CandidateWithinInput,
    IgnoringCountyLiteral,
}

/// A county pair as extracted from a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyQuery {
    pub county_name: String,
    pub state_name:  String,
}

impl CountyQuery {
    pub fn new(county_name: &str, state_name: &str) -> Self {
        Self {
            county_name: county_name.to_string(),
            state_name:  state_name.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedCounty {
    pub geoid5:       Geoid5,
    pub state_code:   String,
    pub county_code:  String,
    pub county_name:  String,
    pub state_name:   String,
    pub cbsa_code:    CbsaCode,
    pub cbsa_name:    String,
    pub match_tier:   MatchTier,
    /// Other rows that matched in the same tier (first-match policy only).
    pub alternatives: Vec<Geoid5>,
}

impl ResolvedCounty {
    fn from_record(record: &CountyRecord, match_tier: MatchTier, alternatives: Vec<Geoid5>) -> Self {
        Self {
            geoid5:      record.geoid5.clone(),
            state_code:  record.state_code.clone(),
            county_code: record.county_code.clone(),
            county_name: record.county_name.clone(),
            state_name:  record.state_name.clone(),
            cbsa_code:   record.cbsa_code.clone(),
            cbsa_name:   record.cbsa_name.clone(),
            match_tier,
            alternatives,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnresolvedReason {
    EmptyCountyName,
    StateNotFound { state: String },
    CountyNotFoundInState { state: String },
    Ambiguous { candidates: Vec<Geoid5> },
}

impl fmt::Display for UnresolvedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyCountyName => write!(f, "county name is empty"),
            Self::StateNotFound { state } => write!(f, "state not found: {state}"),
            Self::CountyNotFoundInState { state } => {
                write!(f, "county not found in state {state}")
            }
            Self::Ambiguous { candidates } => {
                write!(f, "ambiguous county, candidates {}", candidates.join(", "))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Matched(ResolvedCounty),
    Unresolved(UnresolvedReason),
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }

    pub fn matched(&self) -> Option<&ResolvedCounty> {
        match self {
            Self::Matched(r) => Some(r),
            Self::Unresolved(_) => None,
        }
    }

    /// Convert to an error for callers that treat a miss as fatal.
    pub fn into_result(self, query: &CountyQuery) -> Result<ResolvedCounty, FairLendError> {
        match self {
            Self::Matched(r) => Ok(r),
            Self::Unresolved(UnresolvedReason::Ambiguous { candidates }) => {
                Err(FairLendError::AmbiguousMatch {
                    county: query.county_name.clone(),
                    state:  query.state_name.clone(),
                    candidates,
                })
            }
            Self::Unresolved(reason) => Err(FairLendError::UnresolvedGeography {
                county: query.county_name.clone(),
                state:  query.state_name.clone(),
                reason: reason.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnresolvedCounty {
    pub county_name: String,
    pub state_name:  String,
    pub reason:      UnresolvedReason,
}

/// Outcome of resolving every county on a ticket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolutionReport {
    pub resolved:   Vec<ResolvedCounty>,
    pub unresolved: Vec<UnresolvedCounty>,
}

impl ResolutionReport {
    pub fn geoids(&self) -> BTreeSet<Geoid5> {
        self.resolved.iter().map(|r| r.geoid5.clone()).collect()
    }

    pub fn cbsa_codes(&self) -> BTreeSet<CbsaCode> {
        self.resolved.iter().map(|r| r.cbsa_code.clone()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

pub struct CountyResolver<'a> {
    crosswalk: &'a CrosswalkTable,
    policy:    AmbiguityPolicy,
}

impl<'a> CountyResolver<'a> {
    pub fn new(crosswalk: &'a CrosswalkTable, policy: AmbiguityPolicy) -> Self {
        Self { crosswalk, policy }
    }

    pub fn resolve_query(&self, query: &CountyQuery) -> Resolution {
        self.resolve(&query.county_name, &query.state_name)
    }

    pub fn resolve(&self, county_name: &str, state_name: &str) -> Resolution {
        let county_input = normalize::rewrite_manhattan(county_name, state_name)
            .unwrap_or(county_name);
        let county = normalize::normalize_county(county_input);
        let state = normalize::normalize_state(state_name);

        if county.is_empty() {
            return Resolution::Unresolved(UnresolvedReason::EmptyCountyName);
        }

        let candidates = self.crosswalk.rows_in_state(&state);
        if candidates.is_empty() {
            return Resolution::Unresolved(UnresolvedReason::StateNotFound { state });
        }

        let hits: Vec<(MatchTier, &CountyRecord)> = candidates
            .into_iter()
            .filter_map(|row| match_tier(&county, row.match_name()).map(|t| (t, row)))
            .collect();

        let Some(best) = hits.iter().map(|(t, _)| *t).min() else {
            return Resolution::Unresolved(UnresolvedReason::CountyNotFoundInState { state });
        };
        let winners: Vec<&CountyRecord> = hits
            .into_iter()
            .filter(|(t, _)| *t == best)
            .map(|(_, r)| r)
            .collect();

        let first = winners[0];
        let others: Vec<Geoid5> = winners[1..].iter().map(|r| r.geoid5.clone()).collect();
        if others.is_empty() {
            return Resolution::Matched(ResolvedCounty::from_record(first, best, others));
        }

        match self.policy {
            AmbiguityPolicy::Reject => Resolution::Unresolved(UnresolvedReason::Ambiguous {
                candidates: winners.iter().map(|r| r.geoid5.clone()).collect(),
            }),
            AmbiguityPolicy::FirstMatch => {
                log::warn!(
                    "resolver: '{county_name}, {state_name}' matched {} rows at {best:?}; \
                     taking {} (first in crosswalk)",
                    others.len() + 1,
                    first.geoid5
                );
                Resolution::Matched(ResolvedCounty::from_record(first, best, others))
            }
        }
    }

    /// Resolve every entry, keeping the unresolved ones for the operator.
    pub fn resolve_batch(&self, queries: &[CountyQuery]) -> ResolutionReport {
        let mut report = ResolutionReport::default();
        for query in queries {
            match self.resolve_query(query) {
                Resolution::Matched(county) => report.resolved.push(county),
                Resolution::Unresolved(reason) => {
                    log::warn!(
                        "resolver: unresolved '{}, {}': {reason}",
                        query.county_name, query.state_name
                    );
                    report.unresolved.push(UnresolvedCounty {
                        county_name: query.county_name.clone(),
                        state_name:  query.state_name.clone(),
                        reason,
                    });
                }
            }
        }
        log::info!(
            "resolver: {} resolved, {} unresolved",
            report.resolved.len(),
            report.unresolved.len()
        );
        report
    }
}

fn match_tier(input: &str, candidate: &str) -> Option<MatchTier> {
    if input == candidate {
        return Some(MatchTier::Exact);
    }
    if candidate.contains(input) {
        return Some(MatchTier::InputWithinCandidate);
    }
    if !candidate.is_empty() && input.contains(candidate) {
        return Some(MatchTier::CandidateWithinInput);
    }
    let a = normalize::strip_county_literal(input);
    if !a.is_empty() && a == normalize::strip_county_literal(candidate) {
        return Some(MatchTier::IgnoringCountyLiteral);
    }
    None
}
