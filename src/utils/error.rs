use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Missing required configuration: {name}")]
    ConfigMissing { name: String },

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Per-product page fetch failure. Recovered by the orchestrator as a failed scrape.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("bad status {code}")]
    BadStatus { code: u16 },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),
}

impl FetchError {
    pub fn from_reqwest(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if let Some(status) = err.status() {
            FetchError::BadStatus { code: status.as_u16() }
        } else {
            FetchError::Network(err.to_string())
        }
    }

    /// Only a bad status is worth a second attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::BadStatus { .. })
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
