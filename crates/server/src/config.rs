use std::{env, fmt::Display, net::SocketAddr, path::PathBuf, str::FromStr};
use thiserror::Error;

/// Default upload limit for request photos (5MB)
pub const DEFAULT_MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Server settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub oidc_issuer_url: String,
    pub bind_addr: SocketAddr,
    /// Base of customer links and photo URLs, without a trailing slash
    pub public_base_url: String,
    pub photo_dir: PathBuf,
    pub max_photo_bytes: usize,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            oidc_issuer_url: required("OIDC_ISSUER_URL")?,
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:3000")?,
            public_base_url: try_load::<String>("PUBLIC_BASE_URL", "http://localhost:3000")?
                .trim_end_matches('/')
                .to_string(),
            photo_dir: try_load("PHOTO_DIR", "uploads/photos")?,
            max_photo_bytes: try_load(
                "MAX_PHOTO_BYTES",
                &DEFAULT_MAX_PHOTO_BYTES.to_string(),
            )?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            log::info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        })
}
