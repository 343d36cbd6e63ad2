//! Historical liquidity profile
//!
//! A profile aggregates a finite window of observations into per-bucket
//! spread and depth statistics. It is built once per analysis run and read
//! afterwards; rebuilding is the only way to refresh it.
//!
//! Every bucket in range is always present (zero stats when empty), so
//! lookups never need a missing-key fallback.

use crate::bucketing::BucketKeys;
use crate::error::{RegimeError, Result};
use crate::stats::DescriptiveStats;
use crate::types::{BucketKey, Category, MarketId, Observation};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

/// Dimension along which buckets can be ranked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Hour,
    DayOfWeek,
    Category,
    Weekend,
}

/// Spread and total-depth statistics of one bucket
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct BucketStats {
    pub spread: DescriptiveStats,
    pub depth: DescriptiveStats,
}

impl BucketStats {
    fn from_samples(samples: &Samples) -> Self {
        Self {
            spread: DescriptiveStats::compute(&samples.spread),
            depth: DescriptiveStats::compute(&samples.depth),
        }
    }
}

#[derive(Debug, Default)]
struct Samples {
    spread: Vec<f64>,
    depth: Vec<f64>,
}

impl Samples {
    fn push(&mut self, obs: &Observation) {
        self.spread.push(obs.spread);
        self.depth.push(obs.total_depth());
    }
}

/// Per-bucket baseline for one market, or one aggregate of markets
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalProfile {
    /// 24 entries, index = hour
    by_hour: Vec<BucketStats>,
    /// 7 entries, index = day of week (0 = Sunday)
    by_day_of_week: Vec<BucketStats>,
    /// 6 entries, index = `Category::index`
    by_category: Vec<BucketStats>,
    /// [weekday, weekend]
    by_weekend: Vec<BucketStats>,
    global: BucketStats,
    tz_offset_hours: i32,
    first_timestamp_ms: Option<i64>,
    last_timestamp_ms: Option<i64>,
}

impl HistoricalProfile {
    /// Profile with no samples in any bucket
    pub fn empty(tz_offset_hours: i32) -> Self {
        Self {
            by_hour: vec![BucketStats::default(); 24],
            by_day_of_week: vec![BucketStats::default(); 7],
            by_category: vec![BucketStats::default(); Category::ALL.len()],
            by_weekend: vec![BucketStats::default(); 2],
            global: BucketStats::default(),
            tz_offset_hours,
            first_timestamp_ms: None,
            last_timestamp_ms: None,
        }
    }

    /// Build a profile from observation series of one or more markets.
    ///
    /// `category_of` assigns each market's observations to a category bucket.
    pub fn build<'a, I, F>(series: I, category_of: F, tz_offset_hours: i32) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a [Observation])>,
        F: Fn(&str) -> Category,
    {
        let mut hours: Vec<Samples> = (0..24).map(|_| Samples::default()).collect();
        let mut days: Vec<Samples> = (0..7).map(|_| Samples::default()).collect();
        let mut categories: Vec<Samples> = Category::ALL.iter().map(|_| Samples::default()).collect();
        let mut weekend: Vec<Samples> = (0..2).map(|_| Samples::default()).collect();
        let mut global = Samples::default();
        let mut first: Option<i64> = None;
        let mut last: Option<i64> = None;

        for (market_id, observations) in series {
            let category = category_of(market_id);
            for obs in observations {
                let keys = BucketKeys::of(obs.timestamp_ms, tz_offset_hours);
                hours[keys.hour as usize].push(obs);
                days[keys.day_of_week as usize].push(obs);
                categories[category.index()].push(obs);
                weekend[keys.weekend as usize].push(obs);
                global.push(obs);

                first = Some(first.map_or(obs.timestamp_ms, |t| t.min(obs.timestamp_ms)));
                last = Some(last.map_or(obs.timestamp_ms, |t| t.max(obs.timestamp_ms)));
            }
            debug!("Profiled {} observations for {} ({})", observations.len(), market_id, category);
        }

        Self {
            by_hour: hours.iter().map(BucketStats::from_samples).collect(),
            by_day_of_week: days.iter().map(BucketStats::from_samples).collect(),
            by_category: categories.iter().map(BucketStats::from_samples).collect(),
            by_weekend: weekend.iter().map(BucketStats::from_samples).collect(),
            global: BucketStats::from_samples(&global),
            tz_offset_hours,
            first_timestamp_ms: first,
            last_timestamp_ms: last,
        }
    }

    /// Build a profile for a single market
    pub fn for_market(
        market_id: &str,
        category: Category,
        observations: &[Observation],
        tz_offset_hours: i32,
    ) -> Self {
        Self::build([(market_id, observations)], |_| category, tz_offset_hours)
    }

    /// Statistics of any bucket; keys out of range resolve to zero stats
    pub fn stats(&self, key: &BucketKey) -> BucketStats {
        let entry = match key {
            BucketKey::Hour(h) => self.by_hour.get(*h as usize),
            BucketKey::DayOfWeek(d) => self.by_day_of_week.get(*d as usize),
            BucketKey::Category(c) => self.by_category.get(c.index()),
            BucketKey::Weekend(w) => self.by_weekend.get(*w as usize),
            BucketKey::Global => Some(&self.global),
        };
        entry.copied().unwrap_or_default()
    }

    pub fn hour(&self, hour: u8) -> BucketStats {
        self.stats(&BucketKey::Hour(hour))
    }

    pub fn day_of_week(&self, day_of_week: u8) -> BucketStats {
        self.stats(&BucketKey::DayOfWeek(day_of_week))
    }

    pub fn category(&self, category: Category) -> BucketStats {
        self.stats(&BucketKey::Category(category))
    }

    pub fn global(&self) -> BucketStats {
        self.global
    }

    pub fn tz_offset_hours(&self) -> i32 {
        self.tz_offset_hours
    }

    pub fn sample_count(&self) -> usize {
        self.global.spread.count
    }

    pub fn has_baseline(&self) -> bool {
        self.global.spread.has_baseline()
    }

    /// Reporting check: fails when fewer than `min_samples` observations back
    /// the profile. Classification itself never requires it.
    pub fn ensure_samples(&self, min_samples: usize) -> Result<()> {
        if self.sample_count() < min_samples {
            return Err(RegimeError::InsufficientData(format!(
                "profile has {} samples, {} required",
                self.sample_count(),
                min_samples
            )));
        }
        Ok(())
    }

    /// (first, last) observation timestamps, if any
    pub fn time_span_ms(&self) -> Option<(i64, i64)> {
        self.first_timestamp_ms.zip(self.last_timestamp_ms)
    }

    /// All keys of a dimension, in index order
    pub fn keys(dimension: Dimension) -> Vec<BucketKey> {
        match dimension {
            Dimension::Hour => (0..24).map(BucketKey::Hour).collect(),
            Dimension::DayOfWeek => (0..7).map(BucketKey::DayOfWeek).collect(),
            Dimension::Category => Category::ALL.into_iter().map(BucketKey::Category).collect(),
            Dimension::Weekend => vec![BucketKey::Weekend(false), BucketKey::Weekend(true)],
        }
    }

    /// Buckets of a dimension, widest first.
    ///
    /// Ordered by mean spread descending, then sample count descending, then
    /// bucket index ascending.
    pub fn ranked_buckets(&self, dimension: Dimension) -> Vec<BucketKey> {
        let mut keys = Self::keys(dimension);
        keys.sort_by(|a, b| {
            let sa = self.stats(a).spread;
            let sb = self.stats(b).spread;
            sb.mean
                .total_cmp(&sa.mean)
                .then_with(|| sb.count.cmp(&sa.count))
                .then_with(|| a.index().cmp(&b.index()))
        });
        keys
    }

    /// Rank (0 = widest) of a bucket within its dimension
    pub fn rank_of(&self, key: &BucketKey) -> Option<usize> {
        let dimension = match key {
            BucketKey::Hour(_) => Dimension::Hour,
            BucketKey::DayOfWeek(_) => Dimension::DayOfWeek,
            BucketKey::Category(_) => Dimension::Category,
            BucketKey::Weekend(_) => Dimension::Weekend,
            BucketKey::Global => return None,
        };
        self.ranked_buckets(dimension).iter().position(|k| k == key)
    }

    /// Ratio of weekend to weekday mean spread, None without both baselines
    pub fn weekend_premium(&self) -> Option<f64> {
        let weekday = self.stats(&BucketKey::Weekend(false)).spread;
        let weekend = self.stats(&BucketKey::Weekend(true)).spread;
        if !weekday.has_baseline() || !weekend.has_baseline() || weekday.mean <= 0.0 {
            return None;
        }
        Some(weekend.mean / weekday.mean)
    }
}

/// Caller-owned store of prebuilt profiles, keyed by market id
#[derive(Debug, Clone, Default)]
pub struct ProfileCache {
    profiles: HashMap<MarketId, HistoricalProfile>,
}

impl ProfileCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a market's profile, returning the previous one
    pub fn insert(&mut self, market_id: impl Into<MarketId>, profile: HistoricalProfile) -> Option<HistoricalProfile> {
        self.profiles.insert(market_id.into(), profile)
    }

    pub fn get(&self, market_id: &str) -> Option<&HistoricalProfile> {
        self.profiles.get(market_id)
    }

    pub fn remove(&mut self, market_id: &str) -> Option<HistoricalProfile> {
        self.profiles.remove(market_id)
    }

    pub fn contains(&self, market_id: &str) -> bool {
        self.profiles.contains_key(market_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn clear(&mut self) {
        self.profiles.clear();
    }

    pub fn market_ids(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::types::MS_PER_HOUR;

    /// 168 hourly observations starting Sunday 1970-01-04 00:00 UTC;
    /// hour 3 is always 400, every other hour 100
    pub(crate) fn week_with_wide_hour_three() -> Vec<Observation> {
        let sunday = 3 * 24 * MS_PER_HOUR;
        (0..168)
            .map(|i| {
                let hour = i % 24;
                Observation {
                    timestamp_ms: sunday + i * MS_PER_HOUR,
                    spread: if hour == 3 { 400.0 } else { 100.0 },
                    mid_price: 10_000.0,
                    bid_depth: 500.0,
                    ask_depth: 500.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_every_bucket_present_when_empty() {
        let profile = HistoricalProfile::build(std::iter::empty(), |_| Category::Other, 0);
        assert!(!profile.has_baseline());
        for key in HistoricalProfile::keys(Dimension::Hour)
            .into_iter()
            .chain(HistoricalProfile::keys(Dimension::DayOfWeek))
            .chain(HistoricalProfile::keys(Dimension::Category))
            .chain(HistoricalProfile::keys(Dimension::Weekend))
        {
            assert_eq!(profile.stats(&key), BucketStats::default());
        }
        assert_eq!(profile, HistoricalProfile::empty(0));
        assert_eq!(profile.time_span_ms(), None);
        assert!(matches!(profile.ensure_samples(1), Err(RegimeError::InsufficientData(_))));
    }

    #[test]
    fn test_week_partitions() {
        let obs = week_with_wide_hour_three();
        let profile = HistoricalProfile::for_market("m", Category::Politics, &obs, 0);

        assert_eq!(profile.sample_count(), 168);
        assert_eq!(profile.hour(3).spread.count, 7);
        assert_eq!(profile.hour(3).spread.mean, 400.0);
        assert_eq!(profile.hour(3).spread.std, 0.0);
        assert_eq!(profile.hour(4).spread.mean, 100.0);
        assert!((0..7).all(|d| profile.day_of_week(d).spread.count == 24));
        assert_eq!(profile.category(Category::Politics).spread.count, 168);
        assert_eq!(profile.category(Category::Sports).spread.count, 0);
        assert_eq!(profile.stats(&BucketKey::Weekend(true)).spread.count, 48);
        assert_eq!(profile.global().depth.mean, 1000.0);
        assert!(profile.ensure_samples(168).is_ok());
        assert!(profile.ensure_samples(169).is_err());
        assert_eq!(
            profile.time_span_ms(),
            Some((obs[0].timestamp_ms, obs[167].timestamp_ms))
        );
    }

    #[test]
    fn test_ranked_hours_widest_first() {
        let obs = week_with_wide_hour_three();
        let profile = HistoricalProfile::for_market("m", Category::Other, &obs, 0);
        let ranked = profile.ranked_buckets(Dimension::Hour);

        assert_eq!(ranked.len(), 24);
        assert_eq!(ranked[0], BucketKey::Hour(3));
        // remaining hours tie on mean and count, so index order decides
        assert_eq!(ranked[1], BucketKey::Hour(0));
        assert_eq!(ranked[2], BucketKey::Hour(1));
        assert_eq!(ranked[3], BucketKey::Hour(2));
        assert_eq!(ranked[4], BucketKey::Hour(4));
        assert_eq!(profile.rank_of(&BucketKey::Hour(3)), Some(0));
        assert_eq!(profile.rank_of(&BucketKey::Global), None);
    }

    #[test]
    fn test_rank_tie_broken_by_count() {
        // hours 5 and 6 share mean 200; hour 6 has more samples
        let mk = |h: i64, spread: f64| Observation {
            timestamp_ms: h * MS_PER_HOUR,
            spread,
            mid_price: 1.0,
            bid_depth: 1.0,
            ask_depth: 1.0,
        };
        let obs = vec![mk(5, 200.0), mk(6, 200.0), mk(30, 200.0), mk(7, 50.0)];
        let profile = HistoricalProfile::for_market("m", Category::Other, &obs, 0);
        let ranked = profile.ranked_buckets(Dimension::Hour);
        assert_eq!(&ranked[..3], &[BucketKey::Hour(6), BucketKey::Hour(5), BucketKey::Hour(7)]);
    }

    #[test]
    fn test_tz_offset_shifts_hour_buckets() {
        let obs = week_with_wide_hour_three();
        let profile = HistoricalProfile::for_market("m", Category::Other, &obs, -5);
        assert_eq!(profile.tz_offset_hours(), -5);
        assert_eq!(profile.ranked_buckets(Dimension::Hour)[0], BucketKey::Hour(22));
    }

    #[test]
    fn test_multi_market_category_aggregate() {
        let a = week_with_wide_hour_three();
        let b: Vec<Observation> = a.iter().take(24).copied().collect();
        let profile = HistoricalProfile::build(
            [("btc-100k", a.as_slice()), ("election", b.as_slice())],
            |id| if id.starts_with("btc") { Category::Crypto } else { Category::Politics },
            0,
        );
        assert_eq!(profile.sample_count(), 192);
        assert_eq!(profile.category(Category::Crypto).spread.count, 168);
        assert_eq!(profile.category(Category::Politics).spread.count, 24);
        assert_eq!(profile.ranked_buckets(Dimension::Category)[0], BucketKey::Category(Category::Crypto));
    }

    #[test]
    fn test_weekend_premium() {
        let mut obs = week_with_wide_hour_three();
        for o in obs.iter_mut() {
            if crate::bucketing::is_weekend(crate::bucketing::day_of_week_of(o.timestamp_ms, 0)) {
                o.spread *= 2.0;
            }
        }
        let profile = HistoricalProfile::for_market("m", Category::Other, &obs, 0);
        let premium = profile.weekend_premium().unwrap();
        assert!((premium - 2.0).abs() < 1e-9);
        assert_eq!(HistoricalProfile::empty(0).weekend_premium(), None);
    }

    #[test]
    fn test_cache_is_caller_owned() {
        let mut cache = ProfileCache::new();
        assert!(cache.is_empty());
        let profile = HistoricalProfile::empty(0);
        assert!(cache.insert("m1", profile.clone()).is_none());
        assert!(cache.insert("m1", profile).is_some());
        assert!(cache.contains("m1"));
        assert_eq!(cache.len(), 1);
        assert!(cache.remove("m1").is_some());
        assert!(cache.get("m1").is_none());
    }
}
