//! Custom error types for the monitoring core
//!
//! Provides structured, typed errors instead of generic Box<dyn Error>

use thiserror::Error;

/// Errors raised by the indicator library
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Not enough history for {indicator}: have {available}, need {required}")]
    InsufficientHistory {
        indicator: &'static str,
        required: usize,
        available: usize,
    },

    #[error("Invalid parameter for {indicator}: {reason}")]
    InvalidParameter {
        indicator: &'static str,
        reason: String,
    },
}

impl IndicatorError {
    pub fn insufficient(indicator: &'static str, required: usize, available: usize) -> Self {
        IndicatorError::InsufficientHistory {
            indicator,
            required,
            available,
        }
    }
}

/// Alert lifecycle and translation errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlertError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Malformed translation: {0}")]
    MalformedTranslation(String),

    #[error("Translation rejected: {0}")]
    TranslationRejected(String),

    #[error("Translation service failed: {0}")]
    TranslationFailed(String),

    #[error("Invalid transition for alert {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("Alert not found: {id}")]
    AlertNotFound { id: String },
}

/// In-memory market data store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("Out-of-order bar for {symbol}: {timestamp} is before {last}")]
    OutOfOrderBar {
        symbol: String,
        timestamp: String,
        last: String,
    },

    #[error("Duplicate bar for {symbol} at {timestamp}")]
    DuplicateBar { symbol: String, timestamp: String },
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Delivery errors from the notification collaborator
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Explanation failed: {0}")]
    Explain(String),
}
