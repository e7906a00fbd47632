//! Domain errors for the PPM sentinel.

use thiserror::Error;

/// Domain-level errors that can occur while driving checks and recoveries.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Bootstrap failed: {0}")]
    BootstrapFailed(String),

    #[error("Command /{command} failed: {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Send to channel {channel_id} failed: {reason}")]
    SendFailed { channel_id: String, reason: String },

    #[error("Rate limited{}", .retry_after_ms.map(|ms| format!(" (retry after {ms}ms)")).unwrap_or_default())]
    RateLimited { retry_after_ms: Option<u64> },

    #[error("Current identity unavailable: {0}")]
    IdentityUnavailable(String),

    #[error("Role lookup failed: {0}")]
    RoleLookupFailed(String),

    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    #[error("Invalid setting {key}: {reason}")]
    InvalidSetting { key: String, reason: String },
}

impl DomainError {
    /// Whether the error is the outbound rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type of the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;
