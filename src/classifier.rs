//! Liquidity regime classifier
//!
//! Scores a current observation against a market's historical profile:
//! - `spread_zscore` / `depth_zscore` against the global baseline
//! - per-dimension percentiles (hour, day-of-week, global) from each
//!   dimension's own z-score through the normal CDF
//! - the regime label from `spread_zscore` and the configured thresholds
//!
//! A profile without samples classifies as `normal` with `low` confidence, so
//! "no data" stays distinguishable from "flat liquidity" downstream.

use crate::bucketing::BucketKeys;
use crate::error::{RegimeError, Result};
use crate::profile::HistoricalProfile;
use crate::stats::percentile_from_zscore;
use crate::types::{Confidence, Observation, RegimeLabel, RegimeResult};
use serde::{Deserialize, Serialize};

/// z-score bounds between regimes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeThresholds {
    /// spread_zscore at or above which the regime is `very_thin`
    pub very_thin: f64,
    /// spread_zscore at or above which the regime is `thin`
    pub thin: f64,
    /// spread_zscore at or below which the regime is `thick`
    pub thick: f64,
}

impl Default for RegimeThresholds {
    fn default() -> Self {
        Self {
            very_thin: 2.5,
            thin: 1.5,
            thick: -1.0,
        }
    }
}

impl RegimeThresholds {
    /// Validated thresholds; requires `thick < thin <= very_thin`
    pub fn new(very_thin: f64, thin: f64, thick: f64) -> Result<Self> {
        let thresholds = Self { very_thin, thin, thick };
        thresholds.validate()?;
        Ok(thresholds)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.very_thin.is_finite() && self.thin.is_finite() && self.thick.is_finite()) {
            return Err(RegimeError::InvalidConfiguration(format!(
                "Regime thresholds must be finite: {:?}",
                self
            )));
        }
        if self.thin > self.very_thin {
            return Err(RegimeError::InvalidConfiguration(format!(
                "thin threshold {} exceeds very_thin threshold {}",
                self.thin, self.very_thin
            )));
        }
        if self.thick >= self.thin {
            return Err(RegimeError::InvalidConfiguration(format!(
                "thick threshold {} must be below thin threshold {}",
                self.thick, self.thin
            )));
        }
        Ok(())
    }

    /// Label a spread z-score; checked widest first so boundaries resolve wide
    pub fn label(&self, spread_zscore: f64) -> RegimeLabel {
        if spread_zscore >= self.very_thin {
            RegimeLabel::VeryThin
        } else if spread_zscore >= self.thin {
            RegimeLabel::Thin
        } else if spread_zscore <= self.thick {
            RegimeLabel::Thick
        } else {
            RegimeLabel::Normal
        }
    }
}

/// Regime classifier with fixed thresholds
#[derive(Debug, Clone, Default)]
pub struct RegimeClassifier {
    thresholds: RegimeThresholds,
}

impl RegimeClassifier {
    /// Create a classifier; fails fast on out-of-order thresholds
    pub fn new(thresholds: RegimeThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &RegimeThresholds {
        &self.thresholds
    }

    /// Classify an observation against a profile. Pure and deterministic.
    pub fn classify(&self, observation: &Observation, profile: &HistoricalProfile) -> RegimeResult {
        let keys = BucketKeys::of(observation.timestamp_ms, profile.tz_offset_hours());
        let global = profile.global();
        let hour = profile.hour(keys.hour);
        let dow = profile.day_of_week(keys.day_of_week);

        let spread_zscore = global.spread.z_score(observation.spread);
        let depth_zscore = global.depth.z_score(observation.total_depth());

        let regime = if global.spread.has_baseline() {
            self.thresholds.label(spread_zscore)
        } else {
            RegimeLabel::Normal
        };

        RegimeResult {
            regime,
            spread_zscore,
            depth_zscore,
            percentile_hour: percentile_from_zscore(hour.spread.z_score(observation.spread)),
            percentile_dow: percentile_from_zscore(dow.spread.z_score(observation.spread)),
            percentile_global: percentile_from_zscore(spread_zscore),
            confidence: Confidence::from_sample_count(global.spread.count),
            confidence_hour: Confidence::from_sample_count(hour.spread.count),
            confidence_dow: Confidence::from_sample_count(dow.spread.count),
        }
    }
}
