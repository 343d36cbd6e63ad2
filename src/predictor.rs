//! Forward prediction of thin-liquidity windows
//!
//! Takes the historically widest hour buckets of a profile and projects the
//! next calendar occurrence of one of them within a horizon.

use crate::bucketing::{floor_to_hour, hour_of};
use crate::profile::{Dimension, HistoricalProfile};
use crate::types::{BucketKey, Confidence, PredictedWindow, MS_PER_HOUR};
use tracing::debug;

/// Hours from `now_hour` to the next occurrence of `hour`.
///
/// The current hour maps to 24: the next occurrence, not "now".
pub fn hours_until(hour: u8, now_hour: u8) -> u32 {
    match (hour as u32 + 24 - now_hour as u32) % 24 {
        0 => 24,
        h => h,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowPredictor {
    /// Number of widest hour buckets considered as candidates
    pub top_n: usize,
}

impl Default for WindowPredictor {
    fn default() -> Self {
        Self { top_n: 3 }
    }
}

impl WindowPredictor {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Next window among the top-N hour buckets, or None when none fits the horizon
    pub fn predict_next(
        &self,
        profile: &HistoricalProfile,
        now_ms: i64,
        horizon_hours: u32,
    ) -> Option<PredictedWindow> {
        self.predict_upcoming(profile, now_ms, horizon_hours).into_iter().next()
    }

    /// Every top-N candidate window within the horizon, soonest first
    pub fn predict_upcoming(
        &self,
        profile: &HistoricalProfile,
        now_ms: i64,
        horizon_hours: u32,
    ) -> Vec<PredictedWindow> {
        let now_hour = hour_of(now_ms, profile.tz_offset_hours());
        let hour_start = floor_to_hour(now_ms);

        let mut windows: Vec<PredictedWindow> = self
            .candidate_hours(profile)
            .into_iter()
            .filter_map(|hour| {
                let until = hours_until(hour, now_hour);
                (until <= horizon_hours).then(|| build_window(profile, hour, until, hour_start))
            })
            .collect();
        windows.sort_by_key(|w| w.hours_until);

        debug!(
            "Predicted {} window(s) within {}h from hour {:02}",
            windows.len(),
            horizon_hours,
            now_hour
        );
        windows
    }

    /// Top-N widest hours that carry a baseline
    fn candidate_hours(&self, profile: &HistoricalProfile) -> Vec<u8> {
        profile
            .ranked_buckets(Dimension::Hour)
            .into_iter()
            .filter(|key| profile.stats(key).spread.has_baseline())
            .take(self.top_n)
            .filter_map(|key| match key {
                BucketKey::Hour(h) => Some(h),
                _ => None,
            })
            .collect()
    }
}

fn build_window(profile: &HistoricalProfile, hour: u8, hours_until: u32, hour_start_ms: i64) -> PredictedWindow {
    let key = BucketKey::Hour(hour);
    let stats = profile.stats(&key).spread;
    let global = profile.global().spread;
    let confidence = Confidence::from_sample_count(stats.count);
    let start = hour_start_ms + hours_until as i64 * MS_PER_HOUR;

    let ratio = if global.mean > 0.0 { stats.mean / global.mean } else { 1.0 };
    let rationale = format!(
        "Hour {:02} (UTC{:+}) averages spread {:.4} ({:.2}x the overall mean) over {} samples; {} confidence",
        hour,
        profile.tz_offset_hours(),
        stats.mean,
        ratio,
        stats.count,
        confidence
    );

    PredictedWindow {
        start,
        end: start + MS_PER_HOUR,
        expected_spread: stats.mean,
        confidence,
        bucket_id: key,
        hours_until,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::tests::week_with_wide_hour_three;
    use crate::types::{Category, Observation};

    fn profile() -> HistoricalProfile {
        HistoricalProfile::for_market("m", Category::Other, &week_with_wide_hour_three(), 0)
    }

    #[test]
    fn test_hours_until_wraps() {
        assert_eq!(hours_until(3, 10), 17);
        assert_eq!(hours_until(11, 10), 1);
        assert_eq!(hours_until(10, 10), 24);
        assert_eq!(hours_until(0, 23), 1);
    }

    #[test]
    fn test_next_window_seventeen_hours_ahead() {
        let now = 10 * MS_PER_HOUR + 25 * 60_000; // 10:25 UTC
        let window = WindowPredictor::new(1).predict_next(&profile(), now, 24).unwrap();

        assert_eq!(window.bucket_id, BucketKey::Hour(3));
        assert_eq!(window.hours_until, 17);
        assert_eq!(window.start, 27 * MS_PER_HOUR);
        assert_eq!(window.end - window.start, MS_PER_HOUR);
        assert_eq!(window.expected_spread, 400.0);
        assert_eq!(window.confidence, Confidence::Low);
        assert!(window.rationale.contains("Hour 03"));
        assert!(!window.is_expired(now));
    }

    #[test]
    fn test_zero_horizon_has_no_window() {
        let now = 3 * MS_PER_HOUR;
        assert!(WindowPredictor::default().predict_next(&profile(), now, 0).is_none());
    }

    #[test]
    fn test_current_hour_projects_to_next_day() {
        let now = 3 * MS_PER_HOUR + 1;
        let window = WindowPredictor::new(1).predict_next(&profile(), now, 24).unwrap();
        assert_eq!(window.hours_until, 24);
        assert!(WindowPredictor::new(1).predict_next(&profile(), now, 23).is_none());
    }

    #[test]
    fn test_short_horizon_picks_nearest_candidate() {
        // top-3 hours are 3, 0, 1; from hour 22 the soonest is hour 0
        let now = 22 * MS_PER_HOUR;
        let predictor = WindowPredictor::new(3);
        let window = predictor.predict_next(&profile(), now, 24).unwrap();
        assert_eq!(window.bucket_id, BucketKey::Hour(0));
        assert_eq!(window.hours_until, 2);

        let upcoming = predictor.predict_upcoming(&profile(), now, 24);
        let hours: Vec<u32> = upcoming.iter().map(|w| w.hours_until).collect();
        assert_eq!(hours, vec![2, 3, 5]);
    }

    #[test]
    fn test_empty_profile_predicts_nothing() {
        let empty = HistoricalProfile::empty(0);
        assert!(WindowPredictor::default().predict_next(&empty, 0, 24).is_none());
    }

    #[test]
    fn test_buckets_without_samples_are_not_candidates() {
        let obs = vec![Observation {
            timestamp_ms: 5 * MS_PER_HOUR,
            spread: 10.0,
            mid_price: 1.0,
            bid_depth: 1.0,
            ask_depth: 1.0,
        }];
        let profile = HistoricalProfile::for_market("m", Category::Other, &obs, 0);
        let upcoming = WindowPredictor::new(5).predict_upcoming(&profile, 0, 24);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].bucket_id, BucketKey::Hour(5));
    }
}
