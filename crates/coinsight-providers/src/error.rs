use thiserror::Error;

/// Failures inside a provider adapter. Never crosses the `SignalSource`
/// boundary: the adapters log these and report "no data" instead.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("Missing API key: {0}")]
    MissingKey(&'static str),
}

impl ProviderError {
    /// Missing keys are a configuration choice, not a degraded provider.
    pub fn is_missing_key(&self) -> bool {
        matches!(self, ProviderError::MissingKey(_))
    }
}
