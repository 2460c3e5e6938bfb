//! fairlend-core: the normalisation and classification layer behind
//! fair-lending market reports.
//!
//! Stages (leaf-first):
//!   1. crosswalk     county reference table keyed by GEOID5
//!   2. resolver      free-text (county, state) → GEOID5 + CBSA
//!   3. demographics  NCRC race/ethnicity classification per loan
//!   4. aggregation   per-lender counts within a (cbsa, year) key
//!   5. peer_cohort   volume-band peer selection per key
//!
//! The engine wires the stages together for one report run.

pub mod aggregation;
pub mod config;
pub mod crosswalk;
pub mod demographics;
pub mod engine;
pub mod error;
pub mod event;
pub mod loan;
pub mod metric;
pub mod normalize;
pub mod peer_cohort;
pub mod resolver;
pub mod significance;
pub mod store;
pub mod tract_flags;
pub mod types;
