//! Error types for the human channel.

use thiserror::Error;

/// Errors that can occur when talking to a channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload exceeds what the channel accepts
    #[error("Payload is {chars} characters, channel accepts at most {max}")]
    PayloadTooLarge { chars: usize, max: usize },

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The service accepted the request but reported an error
    #[error("API error: {0}")]
    Api(String),

    /// The channel cannot perform this operation
    #[error("Operation not supported by channel {0}")]
    Unsupported(&'static str),

    /// Other error
    #[error("{0}")]
    Other(String),
}
