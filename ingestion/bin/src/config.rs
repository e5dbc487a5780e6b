use clap::Parser;
use dayahead_domain::{ValidationPolicy, DEFAULT_MIN_POINTS};
use dayahead_infrastructure::gateways::entsoe::DEFAULT_BASE_URL;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the ENTSO-E security token.
pub const API_KEY_VAR: &str = "ENTSO_API_KEY";

#[derive(Debug, Parser)]
#[command(name = "fetch-dayahead")]
#[command(about = "Fetch tomorrow's Finnish day-ahead prices and store them once", long_about = None)]
pub struct Cli {
    /// Root of the year/month artifact tree
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Fewer published points than this means the auction is not out yet
    #[arg(long, default_value_t = DEFAULT_MIN_POINTS)]
    pub min_points: usize,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub api_url: String,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Preferred price resolution when several are published (0 = finest)
    #[arg(long, default_value_t = 60)]
    pub resolution_minutes: i64,
}

pub struct AppConfig {
    pub data_dir: PathBuf,
    pub policy: ValidationPolicy,
    pub api_url: String,
    pub api_key: String,
    pub timeout: Duration,
    pub resolution_minutes: i64,
}

impl AppConfig {
    pub fn from_env(cli: Cli) -> Result<Self, ConfigError> {
        Self::from_lookup(cli, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(cli: Cli, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;

        if cli.min_points == 0 {
            return Err(ConfigError::InvalidArgument(
                "--min-points must be at least 1".to_string(),
            ));
        }
        if cli.resolution_minutes < 0 {
            return Err(ConfigError::InvalidArgument(
                "--resolution-minutes cannot be negative".to_string(),
            ));
        }

        Ok(Self {
            data_dir: cli.data_dir,
            policy: ValidationPolicy::new(cli.min_points),
            api_url: cli.api_url,
            api_key,
            timeout: Duration::from_secs(cli.timeout_secs),
            resolution_minutes: cli.resolution_minutes,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable {0} is not set")]
    MissingCredential(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
