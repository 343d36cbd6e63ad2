//! Data loader module for reading historical orderbook observations from CSV files
//!
//! This module provides functionality to:
//! - Parse top-of-book snapshots from CSV into `Observation`s
//! - Filter data by timestamp ranges
//! - Resample observations to a coarser timeframe
//! - Serve the files as a `MarketDataSource`
//!
//! Layout on disk: `<data_dir>/<market>/observations.csv`, where `<market>` is the
//! market id lowercased with `-` replaced by `_`.

use crate::error::{RegimeError, Result};
use crate::source::MarketDataSource;
use crate::types::{Category, MarketId, Observation, Timeframe};
use csv::ReaderBuilder;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Orderbook snapshot row from CSV data
#[derive(Debug, Clone, Deserialize)]
pub struct OrderbookRow {
    /// Timestamp in milliseconds (epoch)
    pub timestamp_ms: i64,
    /// Human-readable datetime string
    #[serde(default)]
    pub datetime: String,
    /// Market id
    #[serde(default)]
    pub market: String,
    /// Best bid price
    pub bid_price: f64,
    /// Best bid quantity
    pub bid_quantity: f64,
    /// Best ask price
    pub ask_price: f64,
    /// Best ask quantity
    pub ask_quantity: f64,
}

impl OrderbookRow {
    /// Calculate midprice from bid/ask
    pub fn calculate_mid(&self) -> f64 {
        (self.bid_price + self.ask_price) / 2.0
    }

    /// Rows with a crossed or empty side carry no usable spread
    pub fn is_valid(&self) -> bool {
        self.bid_price > 0.0 && self.ask_price >= self.bid_price
    }
}

impl From<&OrderbookRow> for Observation {
    fn from(row: &OrderbookRow) -> Self {
        Observation {
            timestamp_ms: row.timestamp_ms,
            spread: row.ask_price - row.bid_price,
            mid_price: row.calculate_mid(),
            bid_depth: row.bid_quantity,
            ask_depth: row.ask_quantity,
        }
    }
}

/// Parse orderbook CSV file and return valid observations in chronological order
pub fn parse_orderbook_csv<P: AsRef<Path>>(path: P) -> Result<Vec<Observation>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut observations = Vec::new();
    let mut skipped = 0usize;
    for result in reader.deserialize() {
        let row: OrderbookRow = result?;
        if row.is_valid() {
            observations.push(Observation::from(&row));
        } else {
            skipped += 1;
        }
    }
    if skipped > 0 {
        debug!("Skipped {} crossed or empty orderbook rows", skipped);
    }

    observations.sort_by_key(|o| o.timestamp_ms);
    Ok(observations)
}

/// Keep observations whose timestamp lies in `[start_ms, end_ms]`
pub fn filter_range(observations: &mut Vec<Observation>, start_ms: i64, end_ms: i64) {
    observations.retain(|o| o.timestamp_ms >= start_ms && o.timestamp_ms <= end_ms);
}

/// Average observations into aligned `timeframe` intervals.
///
/// Each output carries the interval start as its timestamp and the mean of
/// every field over the interval. Empty intervals produce no output.
pub fn resample(observations: &[Observation], timeframe: Timeframe) -> Vec<Observation> {
    let step = timeframe.duration_ms();
    let mut sorted: Vec<&Observation> = observations.iter().collect();
    sorted.sort_by_key(|o| o.timestamp_ms);

    let mut resampled = Vec::new();
    let mut current: Option<(i64, Vec<&Observation>)> = None;

    for obs in sorted {
        let bucket = obs.timestamp_ms.div_euclid(step) * step;
        match current.as_mut() {
            Some((start, members)) if *start == bucket => members.push(obs),
            _ => {
                if let Some((start, members)) = current.take() {
                    resampled.push(average(start, &members));
                }
                current = Some((bucket, vec![obs]));
            }
        }
    }
    if let Some((start, members)) = current {
        resampled.push(average(start, &members));
    }

    resampled
}

fn average(start: i64, members: &[&Observation]) -> Observation {
    let n = members.len() as f64;
    let mean = |f: fn(&Observation) -> f64| members.iter().map(|o| f(o)).sum::<f64>() / n;
    Observation {
        timestamp_ms: start,
        spread: mean(|o| o.spread),
        mid_price: mean(|o| o.mid_price),
        bid_depth: mean(|o| o.bid_depth),
        ask_depth: mean(|o| o.ask_depth),
    }
}

/// File name of a market's observation archive
pub const OBSERVATIONS_FILE: &str = "observations.csv";

/// Directory of a market's CSV files
pub fn market_dir<P: AsRef<Path>>(data_dir: P, market: &str) -> PathBuf {
    data_dir.as_ref().join(market.to_lowercase().replace('-', "_"))
}

/// Path of a market's observation archive
pub fn observations_path<P: AsRef<Path>>(data_dir: P, market: &str) -> PathBuf {
    market_dir(data_dir, market).join(OBSERVATIONS_FILE)
}

/// Orderbook CSV archive served as a market data source
#[derive(Debug, Clone)]
pub struct CsvDataSource {
    data_dir: PathBuf,
    categories: HashMap<MarketId, Category>,
}

impl CsvDataSource {
    pub fn new<P: Into<PathBuf>>(data_dir: P, categories: HashMap<MarketId, Category>) -> Self {
        Self {
            data_dir: data_dir.into(),
            categories,
        }
    }

    fn load(&self, market_id: &str) -> Result<Vec<Observation>> {
        let path = observations_path(&self.data_dir, market_id);
        if !path.exists() {
            return Err(RegimeError::unavailable(
                market_id,
                format!("Observations CSV not found: {}", path.display()),
            ));
        }
        let observations = parse_orderbook_csv(&path)?;
        info!("Loaded {} observations for {} from {}", observations.len(), market_id, path.display());
        Ok(observations)
    }
}

impl MarketDataSource for CsvDataSource {
    async fn fetch_observations(
        &self,
        market_id: &str,
        start_ms: i64,
        end_ms: i64,
        timeframe: Timeframe,
    ) -> Result<Vec<Observation>> {
        let mut observations = self.load(market_id)?;
        filter_range(&mut observations, start_ms, end_ms);
        if observations.is_empty() {
            return Err(RegimeError::unavailable(
                market_id,
                format!("No observations between {} and {}", start_ms, end_ms),
            ));
        }
        Ok(resample(&observations, timeframe))
    }

    async fn fetch_current_snapshot(&self, market_id: &str) -> Result<Observation> {
        self.load(market_id)?
            .last()
            .copied()
            .ok_or_else(|| RegimeError::unavailable(market_id, "Observations CSV is empty"))
    }

    fn category_of(&self, market_id: &str) -> Category {
        self.categories.get(market_id).copied().unwrap_or(Category::Other)
    }
}
