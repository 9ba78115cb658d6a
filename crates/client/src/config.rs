use crate::error::{ClientError, ClientResult};
use std::env;

const DEFAULT_API_URL: &str = "http://localhost:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Bearer token for staff routes
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Reads `TABLEBUD_API_URL` and `TABLEBUD_TOKEN`
    pub fn from_env() -> Self {
        let base_url = env::var("TABLEBUD_API_URL").unwrap_or_else(|_| {
            log::info!("TABLEBUD_API_URL not set, using default: {DEFAULT_API_URL}");
            DEFAULT_API_URL.to_string()
        });

        Self {
            token: env::var("TABLEBUD_TOKEN").ok().filter(|t| !t.is_empty()),
            ..Self::new(base_url)
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Staff tools cannot work without a token
    pub fn require_token(&self) -> ClientResult<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| ClientError::Config("TABLEBUD_TOKEN is required".to_string()))
    }
}
