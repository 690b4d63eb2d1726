use thiserror::Error;

/// Failure of a single provider lookup.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The request never produced a response (DNS, refused connection, timeout...).
    #[error("{0}")]
    Transport(String),

    /// Non-success HTTP status, described by the provider's own error envelope.
    #[error("{code}:{message}")]
    Status {
        status: u16,
        code: i64,
        message: String,
    },

    /// A success status whose body could not be decoded.
    #[error("{0}")]
    Decode(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        ProviderError::Transport(error_chain(&err.without_url()))
    }
}

/// Render an error with all of its causes, joined by `": "`.
///
/// reqwest keeps the interesting part ("Connection refused", "dns error")
/// in the source chain, not in the top-level message.
pub(crate) fn error_chain(err: &dyn std::error::Error) -> String {
    let mut text = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Decode(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregationError {
    #[error("no providers available")]
    NoProviders,

    #[error("timed out")]
    TimedOut,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// A provider task panicked or was cancelled from outside.
    #[error("provider task failed: {0}")]
    Worker(String),
}
