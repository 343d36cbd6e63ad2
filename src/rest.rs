//! REST market data source
//!
//! Expects a JSON venue API of the form:
//! - `GET {base}/markets/{id}/orderbook` -> `{status, data: {market, bid: [{price, qty}], ask: [...]}}`
//! - `GET {base}/markets/{id}/spreads?startTime&endTime&interval` -> `{status, data: [SpreadCandle]}`
//!
//! Prices and quantities arrive as strings, as most venues send them.

use crate::error::{RegimeError, Result};
use crate::source::MarketDataSource;
use crate::types::{Category, MarketId, Observation, Timeframe};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, info};
use url::Url;

/// Bid or Ask price level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLevel {
    #[serde(rename = "price", alias = "p")]
    pub price: String,
    #[serde(rename = "qty", alias = "q", alias = "size")]
    pub quantity: String,
}

impl PriceLevel {
    fn parsed(&self) -> Option<(f64, f64)> {
        Some((self.price.parse().ok()?, self.quantity.parse().ok()?))
    }
}

/// Orderbook snapshot from REST API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderBook {
    pub market: String,
    #[serde(default)]
    pub bid: Vec<PriceLevel>,
    #[serde(default)]
    pub ask: Vec<PriceLevel>,
}

impl OrderBook {
    /// Top-of-book observation with depth summed over the first `levels` levels
    pub fn to_observation(&self, timestamp_ms: i64, levels: usize) -> Option<Observation> {
        let bids: Vec<(f64, f64)> = self.bid.iter().filter_map(PriceLevel::parsed).collect();
        let asks: Vec<(f64, f64)> = self.ask.iter().filter_map(PriceLevel::parsed).collect();
        let (best_bid, _) = *bids.first()?;
        let (best_ask, _) = *asks.first()?;

        Some(Observation {
            timestamp_ms,
            spread: best_ask - best_bid,
            mid_price: (best_bid + best_ask) / 2.0,
            bid_depth: bids.iter().take(levels).map(|(_, q)| q).sum(),
            ask_depth: asks.iter().take(levels).map(|(_, q)| q).sum(),
        })
    }
}

/// Historical spread candle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpreadCandle {
    #[serde(rename = "t")]
    pub timestamp_ms: i64,
    pub spread: f64,
    #[serde(rename = "mid")]
    pub mid_price: f64,
    #[serde(rename = "bidDepth", default)]
    pub bid_depth: f64,
    #[serde(rename = "askDepth", default)]
    pub ask_depth: f64,
}

impl From<&SpreadCandle> for Observation {
    fn from(candle: &SpreadCandle) -> Self {
        Observation {
            timestamp_ms: candle.timestamp_ms,
            spread: candle.spread,
            mid_price: candle.mid_price,
            bid_depth: candle.bid_depth,
            ask_depth: candle.ask_depth,
        }
    }
}

/// REST API response wrapper
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub status: String,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// REST client serving a venue as a market data source
pub struct RestDataSource {
    client: Client,
    base_url: Url,
    api_key: Option<String>,
    categories: HashMap<MarketId, Category>,
    depth_levels: usize,
}

impl RestDataSource {
    /// Create a new REST source with a custom base URL
    pub fn new(base_url: &str, api_key: Option<String>, categories: HashMap<MarketId, Category>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent("liquidity-regime/0.1.0")
            .build()?;

        // trailing slash so relative joins keep the base path
        let base = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{}/", base_url)
        };

        Ok(Self {
            client,
            base_url: Url::parse(&base)?,
            api_key,
            categories,
            depth_levels: 10,
        })
    }

    /// Number of book levels summed into depth
    pub fn with_depth_levels(mut self, depth_levels: usize) -> Self {
        self.depth_levels = depth_levels.max(1);
        self
    }

    fn endpoint(&self, market_id: &str, path: &str) -> Result<Url> {
        Ok(self.base_url.join(&format!("markets/{}/{}", market_id, path))?)
    }

    async fn get<T: DeserializeOwned>(&self, market_id: &str, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let mut request = self.client.get(url);

        if let Some(api_key) = &self.api_key {
            request = request.header("X-Api-Key", api_key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("API error for {}: {} - {}", market_id, status, error_text);
            return Err(RegimeError::unavailable(
                market_id,
                format!("HTTP {}: {}", status, error_text),
            ));
        }

        let api_response: ApiResponse<T> = response.json().await?;

        match api_response.data {
            Some(data) => Ok(data),
            None => {
                let error_msg = api_response
                    .error
                    .map(|e| format!("{}: {}", e.code, e.message))
                    .unwrap_or_else(|| format!("Empty response (status {})", api_response.status));
                error!("API error response for {}: {}", market_id, error_msg);
                Err(RegimeError::Api(error_msg))
            }
        }
    }

    /// Get orderbook for a specific market
    pub async fn get_orderbook(&self, market_id: &str) -> Result<OrderBook> {
        let url = self.endpoint(market_id, "orderbook")?;
        let orderbook: OrderBook = self.get(market_id, url).await?;
        debug!(
            "Fetched orderbook for {} - {} bids, {} asks",
            market_id,
            orderbook.bid.len(),
            orderbook.ask.len()
        );
        Ok(orderbook)
    }
}

impl MarketDataSource for RestDataSource {
    async fn fetch_observations(
        &self,
        market_id: &str,
        start_ms: i64,
        end_ms: i64,
        timeframe: Timeframe,
    ) -> Result<Vec<Observation>> {
        let mut url = self.endpoint(market_id, "spreads")?;
        url.query_pairs_mut()
            .append_pair("startTime", &start_ms.to_string())
            .append_pair("endTime", &end_ms.to_string())
            .append_pair("interval", timeframe.as_str());

        let candles: Vec<SpreadCandle> = self.get(market_id, url).await?;
        if candles.is_empty() {
            return Err(RegimeError::unavailable(
                market_id,
                format!("No {} history between {} and {}", timeframe, start_ms, end_ms),
            ));
        }

        info!("Fetched {} {} candles for {}", candles.len(), timeframe, market_id);
        let mut observations: Vec<Observation> = candles.iter().map(Observation::from).collect();
        observations.sort_by_key(|o| o.timestamp_ms);
        Ok(observations)
    }

    async fn fetch_current_snapshot(&self, market_id: &str) -> Result<Observation> {
        let orderbook = self.get_orderbook(market_id).await?;
        let now_ms = chrono::Utc::now().timestamp_millis();
        orderbook
            .to_observation(now_ms, self.depth_levels)
            .ok_or_else(|| RegimeError::unavailable(market_id, "Orderbook has an empty side"))
    }

    fn category_of(&self, market_id: &str) -> Category {
        self.categories.get(market_id).copied().unwrap_or(Category::Other)
    }
}
