use stability_core::StabilityError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

/// Failures talking to a remote API or persisting what it returned.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] StabilityError),
}

impl FetchError {
    /// Whether another attempt at the same request could succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Network(_) => true,
            FetchError::Api { status, .. } => *status >= 500 || *status == 429,
            FetchError::Parse(_) | FetchError::Core(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(err: serde_json::Error) -> Self {
        FetchError::Parse(err.to_string())
    }
}

impl From<FetchError> for StabilityError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Core(inner) => inner,
            other => StabilityError::Other(anyhow::Error::new(other)),
        }
    }
}
