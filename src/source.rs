//! External collaborators consumed by the analyzer
//!
//! The statistics never fetch anything themselves; the orchestration layer
//! pulls observations through a `MarketDataSource` and net profit through a
//! `FeeCalculator`, strictly before any profile is built or read.

use crate::error::Result;
use crate::types::{Category, Observation, Timeframe};
use serde::{Deserialize, Serialize};
use std::future::Future;

/// Market data venue (CSV archive, REST API, test fixture)
pub trait MarketDataSource: Send + Sync {
    /// Observations in `[start_ms, end_ms]` sampled at `timeframe`.
    ///
    /// Fails with `DataUnavailable` when the venue has no history for the range.
    fn fetch_observations(
        &self,
        market_id: &str,
        start_ms: i64,
        end_ms: i64,
        timeframe: Timeframe,
    ) -> impl Future<Output = Result<Vec<Observation>>> + Send;

    /// Current top-of-book observation
    fn fetch_current_snapshot(&self, market_id: &str) -> impl Future<Output = Result<Observation>> + Send;

    /// Category of a market; never inferred by the statistics engine
    fn category_of(&self, market_id: &str) -> Category;
}

/// Fee service: turns a gross spread capture into net profit
pub trait FeeCalculator: Send + Sync {
    /// Net profit percent after fees for capturing `gross_spread_pct`
    fn net_profit_pct(&self, market_id: &str, gross_spread_pct: f64, mid_price: f64) -> f64;
}

/// Fixed maker/taker fee schedule, in percent of notional per leg
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlatFeeModel {
    pub maker_fee_pct: f64,
    pub taker_fee_pct: f64,
}

impl Default for FlatFeeModel {
    fn default() -> Self {
        Self {
            maker_fee_pct: 0.0,
            taker_fee_pct: 2.0,
        }
    }
}

impl FeeCalculator for FlatFeeModel {
    /// Capturing the spread costs one maker leg and one taker leg
    fn net_profit_pct(&self, _market_id: &str, gross_spread_pct: f64, _mid_price: f64) -> f64 {
        gross_spread_pct - self.maker_fee_pct - self.taker_fee_pct
    }
}
