//! Response source error types

use thiserror::Error;

/// Response failure with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ResponseError {
    pub kind: ResponseErrorKind,
    pub message: String,
}

impl ResponseError {
    pub fn new(kind: ResponseErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    #[allow(dead_code)] // Constructor for backend implementations
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ResponseErrorKind::Network, message)
    }

    #[allow(dead_code)] // Constructor for backend implementations
    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ResponseErrorKind::ServerError, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ResponseErrorKind::Timeout, message)
    }
}

/// Failure classification for a response request
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseErrorKind {
    /// Connection problems reaching the backend
    Network,
    /// Backend refused due to rate limits (429)
    RateLimit,
    /// Backend failure (5xx)
    ServerError,
    /// No reply within the response timeout
    Timeout,
    Unknown,
}

impl ResponseErrorKind {
    /// User-facing explanation for the error turn
    pub fn describe(self) -> &'static str {
        match self {
            Self::Network => "I couldn't reach the assistant service.",
            Self::RateLimit => "The assistant service is busy right now.",
            Self::ServerError => "The assistant service had a problem.",
            Self::Timeout => "The assistant took too long to answer.",
            Self::Unknown => "Something went wrong while generating a reply.",
        }
    }
}
