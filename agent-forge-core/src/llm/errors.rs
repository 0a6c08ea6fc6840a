//! Failures of the text generator backend

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LLMError {
    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Rate limit exceeded: {message}")]
    RateLimitExceeded { message: String },

    #[error("Request timed out after {duration:?}")]
    Timeout { duration: Duration },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    /// Non-success response not covered by a more specific variant
    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    /// Content was blocked by the provider
    #[error("Content filtered: {reason}")]
    ContentFiltered { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Parsing error: {message}")]
    ParseError { message: String },
}

impl LLMError {
    // Constructors

    pub fn auth(message: impl Into<String>) -> Self {
        Self::AuthenticationError { message: message.into() }
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::RateLimitExceeded { message: message.into() }
    }

    pub fn timeout(duration: Duration) -> Self {
        Self::Timeout { duration }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::ApiError { status, message: message.into() }
    }

    pub fn content_filtered(reason: impl Into<String>) -> Self {
        Self::ContentFiltered { reason: reason.into() }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::ParseError { message: message.into() }
    }

    /// Map an HTTP status and body to the matching variant
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let body = body.into();
        match status {
            401 | 403 => Self::auth(body),
            429 => Self::rate_limit(body),
            _ => Self::api(status, body),
        }
    }

    /// Stable label used in error details
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::AuthenticationError { .. } => "AuthenticationError",
            Self::RateLimitExceeded { .. } => "RateLimitExceeded",
            Self::Timeout { .. } => "Timeout",
            Self::NetworkError { .. } => "NetworkError",
            Self::ApiError { .. } => "ApiError",
            Self::ContentFiltered { .. } => "ContentFiltered",
            Self::ConfigurationError { .. } => "ConfigurationError",
            Self::ParseError { .. } => "ParseError",
        }
    }

    /// Whether a later call with the same credentials may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded { .. } | Self::Timeout { .. } | Self::NetworkError { .. }
        ) || matches!(self, Self::ApiError { status, .. } if *status >= 500)
    }

    /// Whether the cached client should be dropped
    pub fn invalidates_client(&self) -> bool {
        matches!(self, Self::AuthenticationError { .. } | Self::ConfigurationError { .. })
    }
}

impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::network(format!("request timed out: {err}"))
        } else if err.is_decode() {
            Self::parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16(), err.to_string())
        } else {
            Self::network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(err.to_string())
    }
}
