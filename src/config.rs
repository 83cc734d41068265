use serde::Deserialize;
use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

fn default_max_file_size() -> usize {
    // 200 MB in bytes
    200 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub addr: SocketAddr,
    pub max_file_size: usize,
    pub preview_rows: usize,
    pub session_idle: Duration,
    pub max_sessions: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            preview_rows: 5,
            session_idle: Duration::from_secs(30 * 60),
            max_sessions: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file first
        dotenv().ok();

        let defaults = Config::default();
        Ok(Config {
            addr: env_or("SWEEPER_ADDR", defaults.addr)?,
            max_file_size: env_or("SWEEPER_MAX_FILE_SIZE", defaults.max_file_size)?,
            preview_rows: env_or("SWEEPER_PREVIEW_ROWS", defaults.preview_rows)?,
            session_idle: Duration::from_secs(env_or(
                "SWEEPER_SESSION_IDLE_SECS",
                defaults.session_idle.as_secs(),
            )?),
            max_sessions: env_or("SWEEPER_MAX_SESSIONS", defaults.max_sessions)?,
        })
    }
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        Err(_) => Ok(default),
    }
}
