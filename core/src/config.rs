use crate::{
    error::{FairLendError, FairLendResult},
    loan::LoanFilter,
    peer_cohort::{PeerBand, VolumeBasis},
    resolver::AmbiguityPolicy,
    tract_flags::TractThresholds,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    pub peer_band:          PeerBand,
    #[serde(default)]
    pub peer_volume_basis:  VolumeBasis,
    pub lmi_threshold_pct:  f64,
    pub mmct_threshold_pct: f64,
    /// Two-sided critical |z| for the subject-vs-peer test.
    pub significance_z:     f64,
    #[serde(default)]
    pub ambiguity_policy:   AmbiguityPolicy,
    #[serde(default = "LoanFilter::originations")]
    pub loan_filter:        LoanFilter,
}

impl ReportConfig {
    /// Load `<data_dir>/config/report_config.json`.
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/config/report_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: ReportConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FairLendResult<()> {
        let band = &self.peer_band;
        if !(band.lower_multiplier > 0.0 && band.lower_multiplier <= band.upper_multiplier) {
            return Err(FairLendError::InvalidConfig {
                reason: format!(
                    "peer band must satisfy 0 < lower <= upper, got {} .. {}",
                    band.lower_multiplier, band.upper_multiplier
                ),
            });
        }
        for (name, pct) in [
            ("lmi_threshold_pct", self.lmi_threshold_pct),
            ("mmct_threshold_pct", self.mmct_threshold_pct),
        ] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(FairLendError::InvalidConfig {
                    reason: format!("{name} must be within 0..=100, got {pct}"),
                });
            }
        }
        if self.significance_z <= 0.0 {
            return Err(FairLendError::InvalidConfig {
                reason: format!("significance_z must be positive, got {}", self.significance_z),
            });
        }
        Ok(())
    }

    pub fn thresholds(&self) -> TractThresholds {
        TractThresholds {
            lmi_pct:  self.lmi_threshold_pct,
            mmct_pct: self.mmct_threshold_pct,
        }
    }

    /// Config with the reference constants, for unit tests.
    pub fn default_test() -> Self {
        Self {
            peer_band: PeerBand {
                lower_multiplier: 0.5,
                upper_multiplier: 2.0,
            },
            peer_volume_basis:  VolumeBasis::LoanCount,
            lmi_threshold_pct:  80.0,
            mmct_threshold_pct: 50.0,
            significance_z:     1.96,
            ambiguity_policy:   AmbiguityPolicy::Reject,
            loan_filter:        LoanFilter::originations(),
        }
    }
}
