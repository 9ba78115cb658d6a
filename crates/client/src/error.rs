use chrono::{DateTime, Utc};
use models::cooldown::CooldownRejection;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an error status; `message` is its
    /// user-facing text
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The service refused a request that is still cooling down, e.g. one
    /// another device at the same table already sent
    #[error("{message}")]
    Throttled {
        message: String,
        blocked_until: DateTime<Utc>,
    },

    /// Refused locally, nothing was sent
    #[error(transparent)]
    CoolingDown(#[from] CooldownRejection),

    #[error("{0}")]
    Validation(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Throttled { .. } => Some(429),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
