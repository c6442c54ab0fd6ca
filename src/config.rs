use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub google_api_key: String,
    pub routes_api_base_url: String,
    pub request_timeout_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub batch_concurrency: usize,
    pub batch_delay_ms: u64,
    pub max_stops_per_route: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            google_api_key: env::var("GOOGLE_ROUTES_API_KEY").unwrap_or_default(),
            routes_api_base_url: env::var("ROUTES_API_BASE_URL")
                .unwrap_or_else(|_| "https://routes.googleapis.com".to_string()),
            request_timeout_ms: parse_or_default("REQUEST_TIMEOUT_MS", 30_000)?,
            max_retries: parse_or_default("MAX_RETRIES", 3)?,
            retry_base_delay_ms: parse_or_default("RETRY_BASE_DELAY_MS", 1_000)?,
            batch_concurrency: parse_or_default("BATCH_CONCURRENCY", 5)?,
            batch_delay_ms: parse_or_default("BATCH_DELAY_MS", 200)?,
            max_stops_per_route: parse_or_default("MAX_STOPS_PER_ROUTE", 15)?,
        })
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
