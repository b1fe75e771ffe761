//! Error types for the arec system
//!
//! Every collaborator (IP source, DNS provider) and the engine itself report
//! failures through the single [`Error`] enum defined here.

use std::time::Duration;
use thiserror::Error;

/// Result type alias for arec operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the arec system
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The provider has no zone with the requested name
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// The IP-echo endpoint answered with something we cannot parse
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Connection-level failure (DNS resolution, connect, reset, body read)
    #[error("Transport error: {0}")]
    Transport(String),

    /// Non-2xx HTTP status from an endpoint without a richer error model
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Provider-specific error on a lookup call
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The credential was rejected by the provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Record creation failed (transport or application-level)
    #[error("Create record failed: {0}")]
    CreateFailed(String),

    /// Record update failed (transport or application-level)
    #[error("Update record failed: {0}")]
    UpdateFailed(String),

    /// The process-wide shutdown signal fired while the call was in flight
    #[error("Operation cancelled by shutdown")]
    Cancelled,

    /// The call outlived the deadline of its context
    #[error("Operation timed out after {0:?}")]
    TimedOut(Duration),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a "zone not found" error
    pub fn zone_not_found(zone: impl Into<String>) -> Self {
        Self::ZoneNotFound(zone.into())
    }

    /// Create a malformed response error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// Create an HTTP status error
    pub fn http(status: u16, msg: impl Into<String>) -> Self {
        Self::Http {
            status,
            message: msg.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a record creation error
    pub fn create_failed(msg: impl Into<String>) -> Self {
        Self::CreateFailed(msg.into())
    }

    /// Create a record update error
    pub fn update_failed(msg: impl Into<String>) -> Self {
        Self::UpdateFailed(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// True for errors caused by the caller's context rather than the remote side
    pub fn is_context_error(&self) -> bool {
        matches!(self, Self::Cancelled | Self::TimedOut(_))
    }
}
