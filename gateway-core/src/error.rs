//! Error types for the gateway

use thiserror::Error;

/// Gateway-wide error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Reconnection failed: {0}")]
    Reconnection(String),

    #[error("Progressive fetch failed at iteration {iteration}: {source}")]
    Fetch {
        iteration: usize,
        #[source]
        source: Box<GatewayError>,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Session error: {0}")]
    Session(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Order rejected: {0}")]
    Rejected(String),

    #[error("Invalid request: {0}")]
    Invalid(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatewayError {
    pub fn connection(msg: impl Into<String>) -> Self {
        GatewayError::Connection(msg.into())
    }

    pub fn reconnection(msg: impl Into<String>) -> Self {
        GatewayError::Reconnection(msg.into())
    }

    pub fn fetch(iteration: usize, source: GatewayError) -> Self {
        GatewayError::Fetch {
            iteration,
            source: Box::new(source),
        }
    }

    pub fn session(msg: impl Into<String>) -> Self {
        GatewayError::Session(msg.into())
    }

    pub fn auth(msg: impl Into<String>) -> Self {
        GatewayError::Auth(msg.into())
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        GatewayError::Parse(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GatewayError::NotFound(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        GatewayError::Rejected(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        GatewayError::Invalid(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        GatewayError::Config(msg.into())
    }
}

/// Result type alias for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;
