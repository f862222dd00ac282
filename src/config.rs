//! Process configuration, read from the environment (and `.env`) at startup.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_GEMINI_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` must be set")]
    Missing(&'static str),

    #[error("environment variable `{name}` has an invalid value `{value}`")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Settings {
    pub bind_address: SocketAddr,
    pub gemini_api_url: String,
    pub gemini_api_key: String,
    pub gemini_timeout: Duration,
    pub username: String,
    pub password: String,
    pub chat_queue_capacity: usize,
    pub chat_workers: usize,
    pub task_ttl: Duration,
    pub session_ttl: Duration,
    pub eviction_interval: Duration,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

impl Settings {
    /// Loads `.env` (if any) and reads the process environment.
    pub fn from_env() -> Result<Settings, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds settings from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let required = |name: &'static str| lookup(name).ok_or(ConfigError::Missing(name));

        Ok(Settings {
            bind_address: parse_or(
                &lookup,
                "BIND_ADDRESS",
                SocketAddr::from(([0, 0, 0, 0], 5000)),
            )?,
            gemini_api_url: lookup("GEMINI_API_URL")
                .unwrap_or_else(|| DEFAULT_GEMINI_API_URL.to_owned()),
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_timeout: Duration::from_secs(positive(&lookup, "GEMINI_TIMEOUT_SECS", 10)? as u64),
            username: required("APP_USERNAME")?.trim().to_owned(),
            password: required("APP_PASSWORD")?.trim().to_owned(),
            chat_queue_capacity: positive(&lookup, "CHAT_QUEUE_CAPACITY", 64)?,
            chat_workers: positive(&lookup, "CHAT_WORKERS", 8)?,
            task_ttl: Duration::from_secs(positive(&lookup, "TASK_TTL_SECS", 600)? as u64),
            session_ttl: Duration::from_secs(positive(&lookup, "SESSION_TTL_SECS", 43_200)? as u64),
            eviction_interval: Duration::from_secs(positive(
                &lookup,
                "EVICTION_INTERVAL_SECS",
                60,
            )? as u64),
            max_upload_bytes: positive(&lookup, "MAX_UPLOAD_BYTES", 8 * 1024 * 1024)?,
            cors_allowed_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(str::trim)
                        .filter(|origin| !origin.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
                .unwrap_or_default(),
        })
    }
}

// Secrets stay out of the logs.
impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("bind_address", &self.bind_address)
            .field("gemini_api_url", &self.gemini_api_url)
            .field("gemini_timeout", &self.gemini_timeout)
            .field("username", &self.username)
            .field("chat_queue_capacity", &self.chat_queue_capacity)
            .field("chat_workers", &self.chat_workers)
            .field("task_ttl", &self.task_ttl)
            .field("session_ttl", &self.session_ttl)
            .field("eviction_interval", &self.eviction_interval)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .finish_non_exhaustive()
    }
}

fn parse_or<T, F>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(value) => T::from_str(value.trim()).map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn positive<F>(lookup: &F, name: &'static str, default: usize) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match parse_or(lookup, name, default)? {
        0 => Err(ConfigError::Invalid {
            name,
            value: "0".to_owned(),
        }),
        n => Ok(n),
    }
}
