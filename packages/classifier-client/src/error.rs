//! Error types for the classifier client.

use thiserror::Error;

/// Result type for classifier client operations.
pub type Result<T> = std::result::Result<T, ClassifierError>;

/// Classifier client errors.
#[derive(Debug, Error)]
pub enum ClassifierError {
    /// Configuration error (bad base URL, client could not be built)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network error (connection refused, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response from the worker
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Body was not the JSON shape we expected
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClassifierError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ClassifierError::Network(_) => true,
            ClassifierError::Api { status, .. } => *status == 429 || *status >= 500,
            ClassifierError::Config(_) | ClassifierError::Parse(_) => false,
        }
    }
}
