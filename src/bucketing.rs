//! Time bucketing for historical profiles
//!
//! Timestamps are shifted by a fixed number of hours before the hour and
//! weekday are read off. There is no DST table: a market observed in a zone
//! with daylight saving will see its buckets drift by one hour for part of
//! the year.

use crate::types::{MS_PER_DAY, MS_PER_HOUR};

/// 1970-01-01 was a Thursday (0 = Sunday)
const EPOCH_DAY_OF_WEEK: i64 = 4;

fn shifted(timestamp_ms: i64, tz_offset_hours: i32) -> i64 {
    timestamp_ms.saturating_add(tz_offset_hours as i64 * MS_PER_HOUR)
}

/// Hour of day in [0, 23] at the reference offset
pub fn hour_of(timestamp_ms: i64, tz_offset_hours: i32) -> u8 {
    shifted(timestamp_ms, tz_offset_hours)
        .div_euclid(MS_PER_HOUR)
        .rem_euclid(24) as u8
}

/// Day of week in [0, 6], 0 = Sunday, at the reference offset
pub fn day_of_week_of(timestamp_ms: i64, tz_offset_hours: i32) -> u8 {
    let days = shifted(timestamp_ms, tz_offset_hours).div_euclid(MS_PER_DAY);
    (days + EPOCH_DAY_OF_WEEK).rem_euclid(7) as u8
}

pub fn is_weekend(day_of_week: u8) -> bool {
    day_of_week == 0 || day_of_week == 6
}

/// Start of the hour containing `timestamp_ms`, in real (unshifted) time
pub fn floor_to_hour(timestamp_ms: i64) -> i64 {
    timestamp_ms.div_euclid(MS_PER_HOUR) * MS_PER_HOUR
}

/// All classification keys of one timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketKeys {
    pub hour: u8,
    pub day_of_week: u8,
    pub weekend: bool,
}

impl BucketKeys {
    pub fn of(timestamp_ms: i64, tz_offset_hours: i32) -> Self {
        let day_of_week = day_of_week_of(timestamp_ms, tz_offset_hours);
        Self {
            hour: hour_of(timestamp_ms, tz_offset_hours),
            day_of_week,
            weekend: is_weekend(day_of_week),
        }
    }
}
