//! Peer cohort selector: lenders of comparable volume in one market period.
//!
//! RULES:
//!   - cohort = { l ≠ subject : lower·V ≤ volume(l) ≤ upper·V }, inclusive.
//!   - V ≤ 0 gives an empty cohort; peer ratios are then undefined.
//!   - One cohort per MarketPeriodKey, built only from that key's volumes.
//!   - Peer shares are cohort-level ratios (summed counts), not an
//!     average of member shares.

use crate::{
    aggregation::{LenderAggregate, MarketAggregates},
    types::{LenderId, MarketPeriodKey},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerBand {
    pub lower_multiplier: f64,
    pub upper_multiplier: f64,
}

impl Default for PeerBand {
    fn default() -> Self {
        Self {
            lower_multiplier: 0.5,
            upper_multiplier: 2.0,
        }
    }
}

/// What "volume" means when banding lenders.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeBasis {
    #[default]
    LoanCount,
    LoanAmount,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeerCohort {
    pub subject_id:         LenderId,
    pub market_period:      MarketPeriodKey,
    pub subject_volume:     f64,
    pub volume_lower_bound: f64,
    pub volume_upper_bound: f64,
    pub member_ids:         BTreeSet<LenderId>,
}

impl PeerCohort {
    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.member_ids.len()
    }

    pub fn contains(&self, lender_id: &str) -> bool {
        self.member_ids.contains(lender_id)
    }

    /// True when the subject had no volume to band around.
    pub fn has_subject_volume(&self) -> bool {
        self.subject_volume > 0.0
    }
}

/// Select the cohort for one subject in one market period.
pub fn select_peer_cohort(
    subject_id:     &str,
    subject_volume: f64,
    market_period:  MarketPeriodKey,
    volumes:        &HashMap<LenderId, f64>,
    band:           &PeerBand,
) -> PeerCohort {
    if !(subject_volume > 0.0 && subject_volume.is_finite()) {
        log::info!(
            "peer_cohort: subject={subject_id} market={market_period} has no volume; cohort empty"
        );
        return PeerCohort {
            subject_id:         subject_id.to_string(),
            market_period,
            subject_volume:     0.0,
            volume_lower_bound: 0.0,
            volume_upper_bound: 0.0,
            member_ids:         BTreeSet::new(),
        };
    }

    let lower = band.lower_multiplier * subject_volume;
    let upper = band.upper_multiplier * subject_volume;
    let member_ids: BTreeSet<LenderId> = volumes
        .iter()
        .filter(|(id, _)| id.as_str() != subject_id)
        .filter(|(_, v)| lower <= **v && **v <= upper)
        .map(|(id, _)| id.clone())
        .collect();

    log::debug!(
        "peer_cohort: subject={subject_id} market={market_period} V={subject_volume} \
         band=[{lower}, {upper}] members={}",
        member_ids.len()
    );
    if member_ids.is_empty() {
        log::info!("peer_cohort: subject={subject_id} market={market_period} has no peers in band");
    }

    PeerCohort {
        subject_id: subject_id.to_string(),
        market_period,
        subject_volume,
        volume_lower_bound: lower,
        volume_upper_bound: upper,
        member_ids,
    }
}

/// Cohort for one key, taking volumes from the aggregates.
pub fn select_for_key(
    subject_id: &str,
    key:        &MarketPeriodKey,
    aggregates: &MarketAggregates,
    basis:      VolumeBasis,
    band:       &PeerBand,
) -> PeerCohort {
    let volumes = aggregates.volumes(key, basis);
    let subject_volume = volumes.get(subject_id).copied().unwrap_or(0.0);
    select_peer_cohort(subject_id, subject_volume, key.clone(), &volumes, band)
}

/// One cohort per market period present in the aggregates, in key order.
/// Keys are independent, so they are computed in parallel.
pub fn cohorts_for_subject(
    subject_id: &str,
    aggregates: &MarketAggregates,
    basis:      VolumeBasis,
    band:       &PeerBand,
) -> Vec<PeerCohort> {
    let keys: Vec<&MarketPeriodKey> = aggregates.keys().collect();
    keys.par_iter()
        .map(|key| select_for_key(subject_id, key, aggregates, basis, band))
        .collect()
}

/// Sum of member aggregates within the cohort's own market period.
pub fn peer_aggregate(cohort: &PeerCohort, aggregates: &MarketAggregates) -> LenderAggregate {
    let mut total = LenderAggregate::default();
    for id in &cohort.member_ids {
        if let Some(agg) = aggregates.get(&cohort.market_period, id) {
            total.merge(agg);
        }
    }
    total
}
