use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegimeError {
    #[error("Insufficient data for {0}")]
    InsufficientData(String),

    #[error("Data unavailable for {market_id}: {reason}")]
    DataUnavailable { market_id: String, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(String),
}

impl RegimeError {
    pub fn unavailable(market_id: &str, reason: impl Into<String>) -> Self {
        RegimeError::DataUnavailable {
            market_id: market_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RegimeError>;
