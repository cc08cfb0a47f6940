use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::api_connection::endpoints::USDA_BASE_URL;
use crate::search::embedding_engine::DEFAULT_MODEL_LOAD_TIMEOUT;

pub const API_KEY_ENV_VAR: &str = "USDA_API_KEY";
pub const BASE_URL_ENV_VAR: &str = "FOOD_MATCH_BASE_URL";
pub const CACHE_PATH_ENV_VAR: &str = "FOOD_MATCH_CACHE_PATH";
pub const PAGE_SIZE_ENV_VAR: &str = "FOOD_MATCH_PAGE_SIZE";
pub const TIMEOUT_ENV_VAR: &str = "FOOD_MATCH_TIMEOUT_SECS";
pub const MAX_RETRIES_ENV_VAR: &str = "FOOD_MATCH_MAX_RETRIES";
pub const ALPHA_ENV_VAR: &str = "FOOD_MATCH_ALPHA";
pub const MODEL_TIMEOUT_ENV_VAR: &str = "FOOD_MATCH_MODEL_TIMEOUT_SECS";

const DEFAULT_CACHE_PATH: &str = "food_cache.json";

#[derive(Debug, Clone)]
pub struct MatcherConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub cache_path: PathBuf,
    pub page_size: u32,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
    pub default_alpha: f32,
    pub model_load_timeout: Duration,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: USDA_BASE_URL.to_string(),
            cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            page_size: 50,
            request_timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            default_alpha: 0.5,
            model_load_timeout: DEFAULT_MODEL_LOAD_TIMEOUT,
        }
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .with_context(|| format!("Invalid value '{}' for {}", raw, name)),
        _ => Ok(None),
    }
}

impl MatcherConfig {
    /// Reads `.env` (if present) and the process environment.
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        config.api_key = lookup(API_KEY_ENV_VAR).filter(|k| !k.trim().is_empty());
        if let Some(url) = lookup(BASE_URL_ENV_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(path) = lookup(CACHE_PATH_ENV_VAR).filter(|p| !p.trim().is_empty()) {
            config.cache_path = PathBuf::from(path);
        }
        if let Some(page_size) = parse_var::<u32>(&lookup, PAGE_SIZE_ENV_VAR)? {
            if page_size == 0 {
                return Err(anyhow!("{} must be at least 1", PAGE_SIZE_ENV_VAR));
            }
            config.page_size = page_size;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, TIMEOUT_ENV_VAR)? {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(retries) = parse_var::<u32>(&lookup, MAX_RETRIES_ENV_VAR)? {
            config.max_retries = retries;
        }
        if let Some(alpha) = parse_var::<f32>(&lookup, ALPHA_ENV_VAR)? {
            if !(0.0..=1.0).contains(&alpha) {
                return Err(anyhow!("{} must be within [0, 1], got {}", ALPHA_ENV_VAR, alpha));
            }
            config.default_alpha = alpha;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, MODEL_TIMEOUT_ENV_VAR)? {
            config.model_load_timeout = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }
}
