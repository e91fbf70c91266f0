//! Gleipnir error types

/// Gleipnir error types
#[derive(Debug, thiserror::Error)]
pub enum GleipnirError {
    // Protocol violations
    #[error("demand must be positive, got {0}")]
    InvalidDemand(u64),

    #[error("subscription already set")]
    DuplicateSubscription,

    #[error("signal received before subscription")]
    NotSubscribed,

    // Streaming errors
    #[error("stream error: {0}")]
    Stream(String),

    /// An error that arrived after the consumer already received its terminal
    /// signal. Only ever handed to the fallback [`ErrorSink`](crate::sink::ErrorSink).
    #[error("undeliverable error: {0}")]
    Undeliverable(Box<GleipnirError>),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl GleipnirError {
    /// Whether this error reports a broken back-pressure contract rather than
    /// a failure of the stream itself.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            GleipnirError::InvalidDemand(_)
                | GleipnirError::DuplicateSubscription
                | GleipnirError::NotSubscribed
        )
    }

    /// Short label used for the `kind` metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            GleipnirError::InvalidDemand(_) => "invalid_demand",
            GleipnirError::DuplicateSubscription => "duplicate_subscription",
            GleipnirError::NotSubscribed => "not_subscribed",
            GleipnirError::Stream(_) => "stream",
            GleipnirError::Undeliverable(_) => "undeliverable",
            GleipnirError::Configuration(_) => "configuration",
        }
    }
}

/// Result type alias for Gleipnir operations
pub type Result<T> = std::result::Result<T, GleipnirError>;
