//! The report engine: one market comparison run, end to end.
//!
//! STAGE ORDER (fixed):
//!   1. Resolve ticket counties against the crosswalk
//!   2. Fetch loans for the resolved GEOID5s and years
//!   3. Filter + classify loans, aggregate per (cbsa, year) and lender
//!   4. Select a peer cohort per (cbsa, year)
//!   5. Compare subject against cohort for every report metric
//!
//! RULES:
//!   - Unresolved counties are recorded and reported; the run continues
//!     with the resolved subset.
//!   - Undefined ratios stay undefined all the way into the report.
//!   - Every stage appends to the event log.

use crate::{
    aggregation::{classify_loans, LenderAggregate, MarketAggregates, ReportMetric},
    config::ReportConfig,
    crosswalk::CrosswalkTable,
    error::{FairLendError, FairLendResult},
    event::{EventLogEntry, RunEvent},
    peer_cohort::{cohorts_for_subject, peer_aggregate, PeerCohort},
    resolver::{CountyQuery, CountyResolver, ResolvedCounty, UnresolvedCounty},
    significance::{compare_metric, MetricComparison},
    store::ReportStore,
    types::{LenderId, MarketPeriodKey, RunId, Year},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub subject_lender: LenderId,
    pub counties:       Vec<CountyQuery>,
    /// Empty means every year present in the loan data.
    #[serde(default)]
    pub years:          Vec<Year>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketComparison {
    pub market:       MarketPeriodKey,
    pub cbsa_name:    String,
    pub cohort:       PeerCohort,
    pub subject:      LenderAggregate,
    pub peer:         LenderAggregate,
    pub market_total: LenderAggregate,
    pub metrics:      Vec<MetricComparison>,
}

impl MarketComparison {
    pub fn metric(&self, metric: ReportMetric) -> Option<&MetricComparison> {
        self.metrics.iter().find(|m| m.metric == metric)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketReport {
    pub run_id:         RunId,
    pub generated_at:   DateTime<Utc>,
    pub subject_lender: LenderId,
    pub resolved:       Vec<ResolvedCounty>,
    /// Counties the operator must correct by hand.
    pub unresolved:     Vec<UnresolvedCounty>,
    pub loans_fetched:  usize,
    pub markets:        Vec<MarketComparison>,
}

impl MarketReport {
    pub fn market(&self, key: &MarketPeriodKey) -> Option<&MarketComparison> {
        self.markets.iter().find(|m| &m.market == key)
    }
}

pub struct ReportEngine {
    pub run_id: RunId,
    config:     ReportConfig,
    crosswalk:  CrosswalkTable,
    store:      ReportStore,
    seq:        u64,
}

impl ReportEngine {
    pub fn new(run_id: RunId, config: ReportConfig, crosswalk: CrosswalkTable, store: ReportStore) -> Self {
        Self {
            run_id,
            config,
            crosswalk,
            store,
            seq: 0,
        }
    }

    /// In-memory engine with the reference config, for tests.
    /// The run row is created so `run()` can be called directly.
    pub fn build_test(run_id: RunId, crosswalk: CrosswalkTable, subject_lender: &str) -> FairLendResult<Self> {
        let store = ReportStore::in_memory()?;
        store.migrate()?;
        store.insert_run(&run_id, subject_lender, "0.1.0-test")?;
        Ok(Self::new(run_id, ReportConfig::default_test(), crosswalk, store))
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    pub fn crosswalk(&self) -> &CrosswalkTable {
        &self.crosswalk
    }

    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    pub fn run(&mut self, request: &ReportRequest) -> FairLendResult<MarketReport> {
        self.config.validate()?;
        if !self.store.run_exists(&self.run_id)? {
            return Err(FairLendError::RunNotInitialized);
        }

        self.emit(RunEvent::RunStarted {
            run_id:         self.run_id.clone(),
            subject_lender: request.subject_lender.clone(),
            county_count:   request.counties.len(),
            years:          request.years.clone(),
        })?;

        // 1. Geography
        let resolution = CountyResolver::new(&self.crosswalk, self.config.ambiguity_policy)
            .resolve_batch(&request.counties);
        for county in &resolution.resolved {
            self.emit(RunEvent::CountyResolved {
                county_name: county.county_name.clone(),
                state_name:  county.state_name.clone(),
                geoid5:      county.geoid5.clone(),
                cbsa_code:   county.cbsa_code.clone(),
                match_tier:  county.match_tier,
            })?;
        }
        for county in &resolution.unresolved {
            self.store.record_unresolved(&self.run_id, county)?;
            self.emit(RunEvent::CountyUnresolved {
                county_name: county.county_name.clone(),
                state_name:  county.state_name.clone(),
                reason:      county.reason.to_string(),
            })?;
        }

        // 2-3. Loans
        let geoids = resolution.geoids();
        let loans = self.store.loans_for_geoids(&geoids, &request.years)?;
        let batch = classify_loans(&loans, &self.crosswalk, &self.config);
        self.emit(RunEvent::LoansClassified {
            fetched:      loans.len(),
            classified:   batch.loans.len(),
            filtered_out: batch.filtered_out,
            unkeyed:      batch.unkeyed,
        })?;
        let aggregates = MarketAggregates::build(&batch.loans);

        // 4-5. Peers and comparison
        let cohorts = cohorts_for_subject(
            &request.subject_lender,
            &aggregates,
            self.config.peer_volume_basis,
            &self.config.peer_band,
        );
        let mut markets = Vec::with_capacity(cohorts.len());
        for cohort in cohorts {
            self.emit(RunEvent::CohortSelected {
                market:         cohort.market_period.clone(),
                subject_volume: cohort.subject_volume,
                lower_bound:    cohort.volume_lower_bound,
                upper_bound:    cohort.volume_upper_bound,
                members:        cohort.len(),
            })?;
            markets.push(self.compare_market(&request.subject_lender, cohort, &aggregates));
        }

        self.emit(RunEvent::RunCompleted {
            run_id:     self.run_id.clone(),
            markets:    markets.len(),
            unresolved: resolution.unresolved.len(),
        })?;

        log::info!(
            "run={} engine: {} markets, {} loans, {} unresolved counties",
            self.run_id,
            markets.len(),
            loans.len(),
            resolution.unresolved.len()
        );

        Ok(MarketReport {
            run_id:         self.run_id.clone(),
            generated_at:   Utc::now(),
            subject_lender: request.subject_lender.clone(),
            resolved:       resolution.resolved,
            unresolved:     resolution.unresolved,
            loans_fetched:  loans.len(),
            markets,
        })
    }

    fn compare_market(
        &self,
        subject_lender: &str,
        cohort:         PeerCohort,
        aggregates:     &MarketAggregates,
    ) -> MarketComparison {
        let key = cohort.market_period.clone();
        let subject = aggregates
            .get(&key, subject_lender)
            .cloned()
            .unwrap_or_default();
        let peer = peer_aggregate(&cohort, aggregates);
        let metrics = ReportMetric::ALL
            .into_iter()
            .map(|m| compare_metric(m, &subject, &peer, &cohort, self.config.significance_z))
            .collect();
        let cbsa_name = self
            .crosswalk
            .counties_in_cbsa(&key.cbsa_code)
            .first()
            .map(|r| r.cbsa_name.clone())
            .unwrap_or_default();

        MarketComparison {
            market_total: aggregates.market_total(&key),
            market: key,
            cbsa_name,
            cohort,
            subject,
            peer,
            metrics,
        }
    }

    fn emit(&mut self, event: RunEvent) -> FairLendResult<()> {
        self.seq += 1;
        let entry = EventLogEntry {
            id:         None,
            run_id:     self.run_id.clone(),
            seq:        self.seq,
            stage:      event.stage().to_string(),
            event_type: event.event_type().to_string(),
            payload:    serde_json::to_string(&event)?,
        };
        self.store.append_event(&entry)
    }
}
