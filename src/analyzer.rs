//! Liquidity analyzer: orchestration of the statistics engine
//!
//! This layer owns every suspension point. It pulls history and snapshots
//! from the data source, builds profiles into a caller-owned `ProfileCache`,
//! and runs the pure classifier/predictor/scorer over them.
//!
//! Multi-market operations fan out concurrently; a market whose fetch fails
//! is logged and skipped so it never aborts the others.

use crate::classifier::RegimeClassifier;
use crate::config::AnalyzerConfig;
use crate::confirmer::{Confirmation, MultiTimeframeConfirmer};
use crate::error::{RegimeError, Result};
use crate::predictor::WindowPredictor;
use crate::profile::{HistoricalProfile, ProfileCache};
use crate::scorer::OpportunityScorer;
use crate::source::{FeeCalculator, MarketDataSource};
use crate::types::{MarketId, Observation, PredictedWindow, RegimeResult, ScoredOpportunity, Timeframe};
use futures_util::future::join_all;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub struct LiquidityAnalyzer<S, F> {
    source: S,
    fees: F,
    classifier: RegimeClassifier,
    confirmer: MultiTimeframeConfirmer,
    predictor: WindowPredictor,
    config: AnalyzerConfig,
}

impl<S: MarketDataSource, F: FeeCalculator> LiquidityAnalyzer<S, F> {
    /// Create an analyzer; fails on invalid configuration
    pub fn new(source: S, fees: F, config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;
        let classifier = RegimeClassifier::new(config.thresholds)?;
        Ok(Self {
            source,
            fees,
            confirmer: MultiTimeframeConfirmer::new(classifier.clone()),
            classifier,
            predictor: WindowPredictor::new(config.top_n),
            config,
        })
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Build a market's profile from the configured lookback window ending at `now_ms`
    pub async fn build_profile(&self, market_id: &str, now_ms: i64) -> Result<HistoricalProfile> {
        let start_ms = now_ms - self.config.lookback_ms();
        let observations = self
            .source
            .fetch_observations(market_id, start_ms, now_ms, self.config.profile_timeframe)
            .await?;
        let category = self.source.category_of(market_id);

        let profile = HistoricalProfile::for_market(market_id, category, &observations, self.config.tz_offset_hours);
        info!(
            "Built profile for {} ({}): {} samples, global {}",
            market_id,
            category,
            profile.sample_count(),
            profile.global().spread
        );
        Ok(profile)
    }

    /// Build profiles for many markets concurrently into `cache`.
    ///
    /// Returns the number of profiles built; failed markets are skipped.
    pub async fn warm_cache(&self, market_ids: &[MarketId], cache: &mut ProfileCache, now_ms: i64) -> usize {
        let results = join_all(market_ids.iter().map(|id| async move {
            (id, self.build_profile(id, now_ms).await)
        }))
        .await;

        let mut built = 0;
        for (market_id, result) in results {
            match result {
                Ok(profile) => {
                    cache.insert(market_id.clone(), profile);
                    built += 1;
                }
                Err(e) => warn!("Skipping profile for {}: {}", market_id, e),
            }
        }
        info!("Profile cache warmed: {}/{} markets", built, market_ids.len());
        built
    }

    fn profile_or_empty<'a>(&self, market_id: &str, cache: &'a ProfileCache) -> Cow<'a, HistoricalProfile> {
        match cache.get(market_id) {
            Some(profile) => Cow::Borrowed(profile),
            None => {
                warn!("No profile for {}, classifying without baseline", market_id);
                Cow::Owned(HistoricalProfile::empty(self.config.tz_offset_hours))
            }
        }
    }

    /// Classify a market's current snapshot against its cached profile.
    ///
    /// A market without a cached profile classifies as normal/low.
    pub async fn classify(&self, market_id: &str, cache: &ProfileCache) -> Result<RegimeResult> {
        let snapshot = self.source.fetch_current_snapshot(market_id).await?;
        let profile = self.profile_or_empty(market_id, cache);
        let result = self.classifier.classify(&snapshot, &profile);
        info!("{}: {}", market_id, result);
        Ok(result)
    }

    /// Next thin-liquidity window for a market within `horizon_hours`
    pub fn predict_next(
        &self,
        market_id: &str,
        horizon_hours: u32,
        cache: &ProfileCache,
        now_ms: i64,
    ) -> Option<PredictedWindow> {
        let Some(profile) = cache.get(market_id) else {
            warn!("No profile for {}, cannot predict", market_id);
            return None;
        };
        let window = self.predictor.predict_next(profile, now_ms, horizon_hours);
        match &window {
            Some(w) => info!("{}: next window {}", market_id, w),
            None => debug!("{}: no window within {}h", market_id, horizon_hours),
        }
        window
    }

    /// Classify a market at every configured timeframe and measure agreement.
    ///
    /// Each timeframe's latest sample is its current observation and the rest
    /// of that series its baseline. Timeframes whose fetch fails are skipped;
    /// if all fail the error is `DataUnavailable`.
    pub async fn confirm(&self, market_id: &str, now_ms: i64) -> Result<Confirmation> {
        let start_ms = now_ms - self.config.lookback_ms();
        let category = self.source.category_of(market_id);

        let fetched = join_all(self.config.confirmation_timeframes.iter().map(|tf| async move {
            (*tf, self.source.fetch_observations(market_id, start_ms, now_ms, *tf).await)
        }))
        .await;

        let mut observations: BTreeMap<Timeframe, Observation> = BTreeMap::new();
        let mut profiles: BTreeMap<Timeframe, HistoricalProfile> = BTreeMap::new();
        for (timeframe, result) in fetched {
            match result {
                Ok(series) => {
                    let Some((current, history)) = series.split_last() else {
                        warn!("{}: empty {} series", market_id, timeframe);
                        continue;
                    };
                    observations.insert(timeframe, *current);
                    profiles.insert(
                        timeframe,
                        HistoricalProfile::for_market(market_id, category, history, self.config.tz_offset_hours),
                    );
                }
                Err(e) => warn!("{}: skipping {} timeframe: {}", market_id, timeframe, e),
            }
        }

        if observations.is_empty() {
            return Err(RegimeError::unavailable(market_id, "No timeframe could be fetched"));
        }

        let confirmation = self.confirmer.confirm(&observations, &profiles);
        info!(
            "{}: majority {:?} with agreement {:.2} across {} timeframe(s)",
            market_id,
            confirmation.majority,
            confirmation.agreement,
            confirmation.per_timeframe.len()
        );
        Ok(confirmation)
    }

    /// Scan markets, keep those passing both filters, and rank by score
    pub async fn scan_and_rank(
        &self,
        market_ids: &[MarketId],
        min_spread_pct: f64,
        min_net_profit: f64,
        cache: &ProfileCache,
    ) -> Vec<ScoredOpportunity> {
        let snapshots = join_all(market_ids.iter().map(|id| async move {
            (id, self.source.fetch_current_snapshot(id).await)
        }))
        .await;

        let mut ranked: Vec<ScoredOpportunity> = snapshots
            .into_iter()
            .filter_map(|(market_id, result)| match result {
                Ok(snapshot) => self.evaluate(market_id, &snapshot, min_spread_pct, min_net_profit, cache),
                Err(e) => {
                    warn!("Skipping {} in scan: {}", market_id, e);
                    None
                }
            })
            .collect();

        ranked.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.market_id.cmp(&b.market_id)));
        info!("Scan kept {}/{} markets", ranked.len(), market_ids.len());
        ranked
    }

    fn evaluate(
        &self,
        market_id: &str,
        snapshot: &Observation,
        min_spread_pct: f64,
        min_net_profit: f64,
        cache: &ProfileCache,
    ) -> Option<ScoredOpportunity> {
        let spread_pct = snapshot.spread_pct();
        if spread_pct < min_spread_pct {
            debug!("{}: spread {:.3}% below {:.3}%", market_id, spread_pct, min_spread_pct);
            return None;
        }

        let net_profit_pct = self.fees.net_profit_pct(market_id, spread_pct, snapshot.mid_price);
        if net_profit_pct < min_net_profit {
            debug!("{}: net profit {:.3}% below {:.3}%", market_id, net_profit_pct, min_net_profit);
            return None;
        }

        let profile = self.profile_or_empty(market_id, cache);
        let result = self.classifier.classify(snapshot, &profile);
        let score = OpportunityScorer::score(
            net_profit_pct,
            result.percentile_global,
            snapshot.bid_depth,
            snapshot.ask_depth,
        );

        Some(ScoredOpportunity {
            market_id: market_id.to_string(),
            category: self.source.category_of(market_id),
            spread_pct,
            net_profit_pct,
            spread_percentile: result.percentile_global,
            bid_depth: snapshot.bid_depth,
            ask_depth: snapshot.ask_depth,
            score,
            regime: result.regime,
        })
    }
}
