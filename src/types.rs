//! Core records shared by the statistics engine and the orchestration layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RegimeError;

/// Market identifier as used by the data source (slug, ticker or condition id)
pub type MarketId = String;

pub const MS_PER_HOUR: i64 = 3_600_000;
pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// One recorded top-of-book observation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Timestamp in milliseconds (epoch)
    pub timestamp_ms: i64,
    /// Ask minus bid, in the venue's price units
    pub spread: f64,
    /// Mid price
    pub mid_price: f64,
    /// Resting size on the bid side
    pub bid_depth: f64,
    /// Resting size on the ask side
    pub ask_depth: f64,
}

impl Observation {
    pub fn total_depth(&self) -> f64 {
        self.bid_depth + self.ask_depth
    }

    /// Spread as a percentage of mid price, 0 when mid is not positive
    pub fn spread_pct(&self) -> f64 {
        if self.mid_price > 0.0 {
            self.spread / self.mid_price * 100.0
        } else {
            0.0
        }
    }

    pub fn datetime(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// Market category, supplied by the data source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Sports,
    Crypto,
    Economics,
    Weather,
    Other,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Politics,
        Category::Sports,
        Category::Crypto,
        Category::Economics,
        Category::Weather,
        Category::Other,
    ];

    pub fn index(&self) -> usize {
        match self {
            Category::Politics => 0,
            Category::Sports => 1,
            Category::Crypto => 2,
            Category::Economics => 3,
            Category::Weather => 4,
            Category::Other => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Politics => "politics",
            Category::Sports => "sports",
            Category::Crypto => "crypto",
            Category::Economics => "economics",
            Category::Weather => "weather",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = RegimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RegimeError::InvalidConfiguration(format!("Unknown category: {}", s)))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sampling granularity, ordered narrowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "5m")]
    M5,
    #[serde(rename = "15m")]
    M15,
    #[serde(rename = "1h")]
    H1,
    #[serde(rename = "4h")]
    H4,
    #[serde(rename = "1d")]
    D1,
}

impl Timeframe {
    pub fn duration_ms(&self) -> i64 {
        match self {
            Timeframe::M5 => 5 * 60_000,
            Timeframe::M15 => 15 * 60_000,
            Timeframe::H1 => MS_PER_HOUR,
            Timeframe::H4 => 4 * MS_PER_HOUR,
            Timeframe::D1 => MS_PER_DAY,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::M5 => "5m",
            Timeframe::M15 => "15m",
            Timeframe::H1 => "1h",
            Timeframe::H4 => "4h",
            Timeframe::D1 => "1d",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Partition key of a historical profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "dimension", content = "key", rename_all = "snake_case")]
pub enum BucketKey {
    /// Hour of day, 0-23
    Hour(u8),
    /// Day of week, 0 = Sunday
    DayOfWeek(u8),
    Category(Category),
    /// true for Saturday/Sunday
    Weekend(bool),
    Global,
}

impl BucketKey {
    /// Position of the key within its own dimension
    pub fn index(&self) -> usize {
        match self {
            BucketKey::Hour(h) => *h as usize,
            BucketKey::DayOfWeek(d) => *d as usize,
            BucketKey::Category(c) => c.index(),
            BucketKey::Weekend(w) => *w as usize,
            BucketKey::Global => 0,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BucketKey::Hour(h) => write!(f, "hour:{:02}", h),
            BucketKey::DayOfWeek(d) => write!(f, "dow:{}", d),
            BucketKey::Category(c) => write!(f, "category:{}", c),
            BucketKey::Weekend(true) => f.write_str("weekend"),
            BucketKey::Weekend(false) => f.write_str("weekday"),
            BucketKey::Global => f.write_str("global"),
        }
    }
}

/// Liquidity regime, ordered by wideness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegimeLabel {
    Thick,
    Normal,
    Thin,
    VeryThin,
}

impl RegimeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegimeLabel::Thick => "thick",
            RegimeLabel::Normal => "normal",
            RegimeLabel::Thin => "thin",
            RegimeLabel::VeryThin => "very_thin",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RegimeLabel::Thick => "Spread tighter than usual, deep book",
            RegimeLabel::Normal => "Spread within its usual range",
            RegimeLabel::Thin => "Spread wider than usual",
            RegimeLabel::VeryThin => "Spread far wider than usual",
        }
    }
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trust in a baseline, from its sample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    /// high above 50 samples, medium above 20, low otherwise
    pub fn from_sample_count(count: usize) -> Self {
        if count > 50 {
            Confidence::High
        } else if count > 20 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Low => "low",
            Confidence::Medium => "medium",
            Confidence::High => "high",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of one observation against a profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RegimeResult {
    pub regime: RegimeLabel,
    pub spread_zscore: f64,
    pub depth_zscore: f64,
    pub percentile_hour: f64,
    pub percentile_dow: f64,
    pub percentile_global: f64,
    /// Confidence of the global baseline the regime was decided on
    pub confidence: Confidence,
    pub confidence_hour: Confidence,
    pub confidence_dow: Confidence,
}

impl fmt::Display for RegimeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (z={:+.2}, depth z={:+.2}) | pct hour={:.1} dow={:.1} global={:.1} | confidence {}",
            self.regime,
            self.spread_zscore,
            self.depth_zscore,
            self.percentile_hour,
            self.percentile_dow,
            self.percentile_global,
            self.confidence
        )
    }
}

/// Forward-looking thin-liquidity window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedWindow {
    /// Window start in milliseconds (epoch)
    pub start: i64,
    /// Window end in milliseconds (epoch), exclusive
    pub end: i64,
    pub expected_spread: f64,
    pub confidence: Confidence,
    pub bucket_id: BucketKey,
    pub hours_until: u32,
    pub rationale: String,
}

impl PredictedWindow {
    /// A window no longer holds once its end has passed
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.end
    }
}

impl fmt::Display for PredictedWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = chrono::DateTime::from_timestamp_millis(self.start)
            .map(|d| d.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| self.start.to_string());
        write!(
            f,
            "{} in {}h ({}) | expected spread {:.4} | confidence {}",
            self.bucket_id, self.hours_until, start, self.expected_spread, self.confidence
        )
    }
}

/// Ranked scan candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredOpportunity {
    pub market_id: MarketId,
    pub category: Category,
    pub spread_pct: f64,
    pub net_profit_pct: f64,
    pub spread_percentile: f64,
    pub bid_depth: f64,
    pub ask_depth: f64,
    pub score: u8,
    pub regime: RegimeLabel,
}
