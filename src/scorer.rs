//! Opportunity scoring for scan mode
//!
//! Fixed 50/30/20 weighting: profitability dominates, rarity of the current
//! spread comes second, executable depth third.

/// Points available to each component
const PROFIT_WEIGHT: f64 = 50.0;
const PERCENTILE_WEIGHT: f64 = 30.0;
const DEPTH_WEIGHT: f64 = 20.0;

/// Net profit percent is scaled by this before capping at `PROFIT_WEIGHT`
const PROFIT_SCALE: f64 = 10.0;
/// Combined depth at which the depth component saturates
const DEPTH_SATURATION: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScoreBreakdown {
    pub profit: f64,
    pub percentile: f64,
    pub depth: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u8 {
        (self.profit + self.percentile + self.depth).round().clamp(0.0, 100.0) as u8
    }
}

pub struct OpportunityScorer;

impl OpportunityScorer {
    /// Per-component contribution; non-finite inputs contribute nothing
    pub fn breakdown(net_profit_pct: f64, spread_percentile: f64, bid_depth: f64, ask_depth: f64) -> ScoreBreakdown {
        let finite_or_zero = |v: f64| if v.is_finite() { v } else { 0.0 };

        let profit = (finite_or_zero(net_profit_pct) * PROFIT_SCALE).clamp(0.0, PROFIT_WEIGHT);
        let percentile = finite_or_zero(spread_percentile).clamp(0.0, 100.0) / 100.0 * PERCENTILE_WEIGHT;
        let depth_total = (finite_or_zero(bid_depth) + finite_or_zero(ask_depth)).max(0.0);
        let depth = (depth_total / DEPTH_SATURATION).min(1.0) * DEPTH_WEIGHT;

        ScoreBreakdown { profit, percentile, depth }
    }

    /// Combined ranking score in [0, 100]
    pub fn score(net_profit_pct: f64, spread_percentile: f64, bid_depth: f64, ask_depth: f64) -> u8 {
        Self::breakdown(net_profit_pct, spread_percentile, bid_depth, ask_depth).total()
    }
}
