/*
[INPUT]:  Error sources (payload validation, policy lookup, config, serialization)
[OUTPUT]: Structured error types naming the offending field or id
[POS]:    Error handling layer - unified error types for entire crate
[UPDATE]: When adding new error sources or improving error messages
*/

use thiserror::Error;

/// Main error type for the Deribit connector
#[derive(Error, Debug)]
pub enum DeribitError {
    /// A required field is missing or malformed in an inbound payload
    #[error("Invalid payload field `{field}`: {reason}")]
    InvalidPayload { field: String, reason: String },

    /// Trade direction is neither `buy` nor `sell`
    #[error("Unexpected trade direction: {value}")]
    UnknownDirection { value: String },

    /// Rate limit lookup miss
    #[error("Unknown rate limit id: {limit_id}")]
    UnknownEndpoint { limit_id: String },

    /// Exchange order status outside the known set
    #[error("Unknown order state: {value}")]
    UnknownOrderState { value: String },

    /// Websocket event type outside the known set
    #[error("Unknown event type: {value}")]
    UnknownEventType { value: String },

    /// Rate limit table failed startup validation
    #[error("Invalid rate limit `{limit_id}`: {reason}")]
    InvalidRateLimit { limit_id: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Reading a config file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML config could not be parsed
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// URL parsing failed
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl DeribitError {
    /// Create an invalid payload error for `field`
    pub fn invalid_payload(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DeribitError::InvalidPayload {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing field error
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::invalid_payload(field, "missing required field")
    }

    /// Check if the error was caused by a malformed inbound payload
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            DeribitError::InvalidPayload { .. } | DeribitError::UnknownDirection { .. }
        )
    }

    /// Check if the error is a configuration-time defect
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            DeribitError::UnknownEndpoint { .. }
                | DeribitError::InvalidRateLimit { .. }
                | DeribitError::Config(_)
                | DeribitError::Io(_)
                | DeribitError::Yaml(_)
                | DeribitError::UrlParse(_)
        )
    }
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, DeribitError>;
