//! Analyzer configuration
//!
//! Loaded from `config.json`; every field has a default so a partial file is
//! enough. `.env` may provide `LIQUIDITY_API_URL` and `API_KEY`.

use crate::classifier::RegimeThresholds;
use crate::error::{RegimeError, Result};
use crate::source::FlatFeeModel;
use crate::types::{Category, MarketId, Timeframe};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnalyzerConfig {
    /// Markets to analyze and scan
    #[serde(default)]
    pub markets: Vec<MarketId>,

    /// Category per market; unlisted markets are `other`
    #[serde(default)]
    pub categories: HashMap<MarketId, Category>,

    /// Data directory path for the CSV source (default: "data")
    #[serde(default = "default_data_dir")]
    pub data_directory: String,

    /// REST venue base URL; when set, the REST source is used instead of CSV
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// History window for profiles, in days (default: 90)
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,

    /// Reference timezone as a fixed offset from UTC, no DST (default: -5)
    #[serde(default = "default_tz_offset_hours")]
    pub tz_offset_hours: i32,

    /// Sampling granularity of the profile used by classify/predict/scan
    #[serde(default = "default_profile_timeframe")]
    pub profile_timeframe: Timeframe,

    /// Granularities used for multi-timeframe confirmation
    #[serde(default = "default_timeframes")]
    pub confirmation_timeframes: Vec<Timeframe>,

    /// Agreement at or above which a regime counts as confirmed
    #[serde(default = "default_min_agreement")]
    pub min_agreement: f64,

    #[serde(default)]
    pub thresholds: RegimeThresholds,

    /// Widest hour buckets considered by the window predictor
    #[serde(default = "default_top_n")]
    pub top_n: usize,

    /// Prediction horizon in hours (default: 24)
    #[serde(default = "default_horizon_hours")]
    pub horizon_hours: u32,

    /// Scan filter: minimum current spread in percent of mid
    #[serde(default = "default_min_spread_pct")]
    pub min_spread_pct: f64,

    /// Scan filter: minimum net profit in percent after fees
    #[serde(default)]
    pub min_net_profit_pct: f64,

    #[serde(default)]
    pub fees: FlatFeeModel,

    /// Orderbook levels summed into depth by the REST source
    #[serde(default = "default_depth_levels")]
    pub depth_levels: usize,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_lookback_days() -> u32 {
    90
}

fn default_tz_offset_hours() -> i32 {
    -5
}

fn default_profile_timeframe() -> Timeframe {
    Timeframe::H1
}

fn default_timeframes() -> Vec<Timeframe> {
    vec![Timeframe::M15, Timeframe::H1, Timeframe::H4]
}

fn default_min_agreement() -> f64 {
    0.66
}

fn default_top_n() -> usize {
    3
}

fn default_horizon_hours() -> u32 {
    24
}

fn default_min_spread_pct() -> f64 {
    1.0
}

fn default_depth_levels() -> usize {
    10
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            markets: Vec::new(),
            categories: HashMap::new(),
            data_directory: default_data_dir(),
            api_base_url: None,
            lookback_days: default_lookback_days(),
            tz_offset_hours: default_tz_offset_hours(),
            profile_timeframe: default_profile_timeframe(),
            confirmation_timeframes: default_timeframes(),
            min_agreement: default_min_agreement(),
            thresholds: RegimeThresholds::default(),
            top_n: default_top_n(),
            horizon_hours: default_horizon_hours(),
            min_spread_pct: default_min_spread_pct(),
            min_net_profit_pct: 0.0,
            fees: FlatFeeModel::default(),
            depth_levels: default_depth_levels(),
        }
    }
}

impl AnalyzerConfig {
    /// Parse and validate a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: AnalyzerConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, falling back to defaults only when the file is missing.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match Self::from_file(path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(RegimeError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                warn!("Using default configuration ({} not found)", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(e),
        }
    }

    /// Apply `.env` / environment overrides; returns the API key, if any
    pub fn apply_env(&mut self) -> Option<String> {
        dotenv::dotenv().ok();
        if let Ok(url) = env::var("LIQUIDITY_API_URL") {
            self.api_base_url = Some(url);
        }
        env::var("API_KEY").ok()
    }

    pub fn lookback_ms(&self) -> i64 {
        self.lookback_days as i64 * crate::types::MS_PER_DAY
    }

    pub fn validate(&self) -> Result<()> {
        self.thresholds.validate()?;
        if self.lookback_days == 0 {
            return Err(RegimeError::InvalidConfiguration("lookback_days must be positive".to_string()));
        }
        if !(-12..=14).contains(&self.tz_offset_hours) {
            return Err(RegimeError::InvalidConfiguration(format!(
                "tz_offset_hours {} outside [-12, 14]",
                self.tz_offset_hours
            )));
        }
        if self.confirmation_timeframes.is_empty() {
            return Err(RegimeError::InvalidConfiguration(
                "confirmation_timeframes must not be empty".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_agreement) {
            return Err(RegimeError::InvalidConfiguration(format!(
                "min_agreement {} outside [0, 1]",
                self.min_agreement
            )));
        }
        if self.top_n == 0 {
            return Err(RegimeError::InvalidConfiguration("top_n must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = AnalyzerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lookback_days, 90);
        assert_eq!(config.thresholds, RegimeThresholds::default());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "markets": ["fed-cut-december"],
            "categories": {"fed-cut-december": "economics"},
            "tz_offset_hours": 0,
            "confirmation_timeframes": ["15m", "4h"]
        }"#;
        let config: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.markets, vec!["fed-cut-december".to_string()]);
        assert_eq!(config.categories["fed-cut-december"], Category::Economics);
        assert_eq!(config.confirmation_timeframes, vec![Timeframe::M15, Timeframe::H4]);
        assert_eq!(config.top_n, 3);
        assert_eq!(config.data_directory, "data");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_thresholds_fail_validation() {
        let json = r#"{"thresholds": {"very_thin": 1.0, "thin": 2.0, "thick": -1.0}}"#;
        let config: AnalyzerConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(config.validate(), Err(RegimeError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_invalid_ranges_fail_validation() {
        let config = AnalyzerConfig { tz_offset_hours: 20, ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalyzerConfig { confirmation_timeframes: vec![], ..Default::default() };
        assert!(config.validate().is_err());
        let config = AnalyzerConfig { min_agreement: 1.5, ..Default::default() };
        assert!(config.validate().is_err());
    }

    fn write_temp_config(name: &str, body: &str) -> std::path::PathBuf {
        let path = env::temp_dir().join(format!("liquidity_regime_{}_{}.json", name, std::process::id()));
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = AnalyzerConfig::load_or_default("/nonexistent/config.json").unwrap();
        assert_eq!(config.horizon_hours, 24);
    }

    #[test]
    fn test_misordered_thresholds_file_fails_to_load() {
        let path = write_temp_config(
            "misordered",
            r#"{"markets":["m"],"thresholds":{"very_thin":1.0,"thin":2.0,"thick":-1.0}}"#,
        );
        let result = AnalyzerConfig::load_or_default(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(RegimeError::InvalidConfiguration(_))));
    }

    #[test]
    fn test_malformed_file_fails_to_load() {
        let path = write_temp_config("malformed", r#"{"markets": ["m"],"#);
        let result = AnalyzerConfig::load_or_default(&path);
        let _ = fs::remove_file(&path);
        assert!(matches!(result, Err(RegimeError::Json(_))));
    }

    #[test]
    fn test_valid_file_loads() {
        let path = write_temp_config("valid", r#"{"markets":["m"],"top_n":5}"#);
        let config = AnalyzerConfig::load_or_default(&path).unwrap();
        let _ = fs::remove_file(&path);
        assert_eq!(config.markets, vec!["m".to_string()]);
        assert_eq!(config.top_n, 5);
    }
}
