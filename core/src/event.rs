//! The run event log: an audit trail of every stage of a report run.
//!
//! RULE: events are appended in stage order and never rewritten.
//! Variants are only ever added, never removed or reordered.

use crate::{
    resolver::MatchTier,
    types::{CbsaCode, Geoid5, LenderId, MarketPeriodKey, RunId, Year},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    // ── Run lifecycle ──────────────────────────────
    RunStarted {
        run_id:         RunId,
        subject_lender: LenderId,
        county_count:   usize,
        years:          Vec<Year>,
    },
    RunCompleted {
        run_id:     RunId,
        markets:    usize,
        unresolved: usize,
    },

    // ── Geography ──────────────────────────────────
    CountyResolved {
        county_name: String,
        state_name:  String,
        geoid5:      Geoid5,
        cbsa_code:   CbsaCode,
        match_tier:  MatchTier,
    },
    CountyUnresolved {
        county_name: String,
        state_name:  String,
        reason:      String,
    },

    // ── Classification ─────────────────────────────
    LoansClassified {
        fetched:      usize,
        classified:   usize,
        filtered_out: u64,
        unkeyed:      u64,
    },

    // ── Peer selection ─────────────────────────────
    CohortSelected {
        market:         MarketPeriodKey,
        subject_volume: f64,
        lower_bound:    f64,
        upper_bound:    f64,
        members:        usize,
    },
}

impl RunEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::RunStarted { .. }       => "run_started",
            Self::RunCompleted { .. }     => "run_completed",
            Self::CountyResolved { .. }   => "county_resolved",
            Self::CountyUnresolved { .. } => "county_unresolved",
            Self::LoansClassified { .. }  => "loans_classified",
            Self::CohortSelected { .. }   => "cohort_selected",
        }
    }

    pub fn stage(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } | Self::RunCompleted { .. } => "engine",
            Self::CountyResolved { .. } | Self::CountyUnresolved { .. } => "resolver",
            Self::LoansClassified { .. } => "classifier",
            Self::CohortSelected { .. } => "peer_cohort",
        }
    }
}

/// The event log entry as persisted to SQLite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub run_id:     RunId,
    pub seq:        u64,
    pub stage:      String,
    pub event_type: String,
    pub payload:    String, // JSON-serialized RunEvent
}
