use crate::datasource::hyperliquid::DEFAULT_API_URL;
use crate::domain::Decimal;
use crate::engine::Thresholds;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub run_mode: RunMode,
    pub port: u16,
    pub hyperliquid_api_url: String,
    pub min_recent_closes: u32,
    pub min_avg_daily_closes: u32,
    pub max_avg_holding_hours: Decimal,
    pub show_full_stats: bool,
    pub screen_concurrency: usize,
    pub address_list_file: Option<String>,
    pub blacklist_file: Option<String>,
    pub report_csv_path: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Screen the configured address list once and exit.
    Batch,
    /// Serve the HTTP API.
    Serve,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let run_mode = match env_map
            .get("RUN_MODE")
            .map(|s| s.as_str())
            .unwrap_or("batch")
        {
            "batch" => RunMode::Batch,
            "serve" => RunMode::Serve,
            other => {
                return Err(ConfigError::InvalidValue(
                    "RUN_MODE".to_string(),
                    format!("must be batch or serve, got {}", other),
                ))
            }
        };

        let port = parse_or(&env_map, "PORT", 8080u16, "must be a valid u16")?;

        let hyperliquid_api_url = env_map
            .get("HYPERLIQUID_API_URL")
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let min_recent_closes =
            parse_or(&env_map, "MIN_RECENT_CLOSES", 24u32, "must be a non-negative integer")?;
        let min_avg_daily_closes =
            parse_or(&env_map, "MIN_AVG_DAILY_CLOSES", 24u32, "must be a non-negative integer")?;

        let max_avg_holding_hours = match env_map.get("MAX_AVG_HOLDING_HOURS") {
            Some(raw) => Decimal::from_str_canonical(raw)
                .ok()
                .filter(|d| !d.is_negative())
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "MAX_AVG_HOLDING_HOURS".to_string(),
                        "must be a non-negative decimal".to_string(),
                    )
                })?,
            None => Decimal::one(),
        };

        let show_full_stats = match env_map
            .get("SHOW_FULL_STATS")
            .map(|s| s.to_ascii_lowercase())
            .as_deref()
        {
            None | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(ConfigError::InvalidValue(
                    "SHOW_FULL_STATS".to_string(),
                    format!("must be true or false, got {}", other),
                ))
            }
        };

        let screen_concurrency =
            parse_or(&env_map, "SCREEN_CONCURRENCY", 4usize, "must be a positive integer")?;
        if screen_concurrency == 0 {
            return Err(ConfigError::InvalidValue(
                "SCREEN_CONCURRENCY".to_string(),
                "must be a positive integer".to_string(),
            ));
        }

        let address_list_file = non_empty(&env_map, "ADDRESS_LIST_FILE");
        if run_mode == RunMode::Batch && address_list_file.is_none() {
            return Err(ConfigError::MissingEnv("ADDRESS_LIST_FILE".to_string()));
        }

        Ok(Config {
            run_mode,
            port,
            hyperliquid_api_url,
            min_recent_closes,
            min_avg_daily_closes,
            max_avg_holding_hours,
            show_full_stats,
            screen_concurrency,
            address_list_file,
            blacklist_file: non_empty(&env_map, "BLACKLIST_FILE"),
            report_csv_path: non_empty(&env_map, "REPORT_CSV_PATH"),
        })
    }

    /// Screening thresholds configured for this process.
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            min_recent_closes: self.min_recent_closes,
            min_avg_daily_closes: self.min_avg_daily_closes,
            max_avg_holding_hours: self.max_avg_holding_hours,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    env_map: &HashMap<String, String>,
    key: &str,
    default: T,
    reason: &str,
) -> Result<T, ConfigError> {
    match env_map.get(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue(key.to_string(), reason.to_string())),
        None => Ok(default),
    }
}

fn non_empty(env_map: &HashMap<String, String>, key: &str) -> Option<String> {
    env_map
        .get(key)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
