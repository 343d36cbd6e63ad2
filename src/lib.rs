pub mod analyzer;
pub mod bucketing;
pub mod classifier;
pub mod config;
pub mod confirmer;
pub mod data_loader;
pub mod error;
pub mod predictor;
pub mod profile;
pub mod rest;
pub mod scorer;
pub mod source;
pub mod stats;
pub mod types;

// Re-export commonly used types
pub use analyzer::LiquidityAnalyzer;
pub use bucketing::{day_of_week_of, hour_of, is_weekend, BucketKeys};
pub use classifier::{RegimeClassifier, RegimeThresholds};
pub use config::AnalyzerConfig;
pub use confirmer::{majority_label, Confirmation, MultiTimeframeConfirmer};
pub use data_loader::{parse_orderbook_csv, resample, CsvDataSource, OrderbookRow};
pub use error::{RegimeError, Result};
pub use predictor::{hours_until, WindowPredictor};
pub use profile::{BucketStats, Dimension, HistoricalProfile, ProfileCache};
pub use rest::RestDataSource;
pub use scorer::{OpportunityScorer, ScoreBreakdown};
pub use source::{FeeCalculator, FlatFeeModel, MarketDataSource};
pub use stats::{normal_cdf, percentile, percentile_from_zscore, z_score, DescriptiveStats};
pub use types::{
    BucketKey, Category, Confidence, MarketId, Observation, PredictedWindow, RegimeLabel, RegimeResult,
    ScoredOpportunity, Timeframe,
};

/// Initialize logging for the library
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}
