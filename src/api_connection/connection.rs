use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::endpoints::{FdcFoodDetails, FdcSearchBody, FdcSearchResponse, NutrientRecord, SearchHit, SearchRequest};
use super::CatalogClient;
use crate::config::{MatcherConfig, API_KEY_ENV_VAR};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("API key not found in environment: {0}")]
    MissingApiKey(String),

    #[error("network error after {attempts} attempt(s): {source}")]
    NetworkError {
        attempts: u32,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error {status}: {error_body}")]
    ApiError { status: StatusCode, error_body: String },

    #[error("catalog has no record '{0}'")]
    NotFound(String),

    #[error("malformed catalog response: {0}")]
    MalformedResponse(String),
}

/// Bounded exponential backoff for transient failures (connection errors,
/// timeouts, 429 and 5xx responses).
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(attempt))
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// HTTP client for USDA FoodData Central.
#[derive(Debug, Clone)]
pub struct UsdaClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl UsdaClient {
    pub fn new(config: &MatcherConfig) -> Result<Self, CatalogError> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| CatalogError::MissingApiKey(API_KEY_ENV_VAR.to_string()))?;
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|source| CatalogError::NetworkError { attempts: 0, source })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            retry: RetryPolicy {
                max_retries: config.max_retries,
                base_delay: config.retry_base_delay,
            },
        })
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        make_request: impl Fn() -> RequestBuilder,
        record_id: Option<&str>,
    ) -> Result<T, CatalogError> {
        let mut attempt = 0u32;
        loop {
            let outcome = make_request()
                .query(&[("api_key", self.api_key.as_str())])
                .header("Content-Type", "application/json")
                .send()
                .await;

            let retry_reason = match outcome {
                Err(source) => {
                    if attempt >= self.retry.max_retries {
                        return Err(CatalogError::NetworkError {
                            attempts: attempt + 1,
                            source,
                        });
                    }
                    source.to_string()
                }
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response
                            .text()
                            .await
                            .map_err(|source| CatalogError::NetworkError { attempts: attempt + 1, source })?;
                        return serde_json::from_str::<T>(&body)
                            .map_err(|e| CatalogError::MalformedResponse(e.to_string()));
                    }
                    if status == StatusCode::NOT_FOUND {
                        if let Some(id) = record_id {
                            return Err(CatalogError::NotFound(id.to_string()));
                        }
                    }
                    let error_body = response
                        .text()
                        .await
                        .unwrap_or_else(|_| "Failed to read error body".to_string());
                    if !is_retryable(status) || attempt >= self.retry.max_retries {
                        return Err(CatalogError::ApiError { status, error_body });
                    }
                    format!("status {}", status)
                }
            };

            let delay = self.retry.delay_for(attempt);
            warn!(attempt = attempt + 1, reason = %retry_reason, delay_ms = delay.as_millis() as u64, "catalog request failed, retrying");
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

#[async_trait]
impl CatalogClient for UsdaClient {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>, CatalogError> {
        let url = format!("{}/foods/search", self.base_url);
        let body = FdcSearchBody::from(request);
        debug!(query = %request.query, page_size = request.page_size, "searching catalog");
        let response: FdcSearchResponse = self
            .execute(|| self.http.post(&url).json(&body), None)
            .await?;
        response.validate()
    }

    async fn fetch_nutrients(&self, candidate_id: &str) -> Result<Vec<NutrientRecord>, CatalogError> {
        let url = format!("{}/food/{}", self.base_url, candidate_id);
        debug!(candidate_id, "fetching nutrients");
        let details: FdcFoodDetails = self
            .execute(|| self.http.get(&url), Some(candidate_id))
            .await?;
        details.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_missing_api_key() {
        let config = MatcherConfig::default();
        let err = UsdaClient::new(&config).unwrap_err();
        assert!(matches!(err, CatalogError::MissingApiKey(ref name) if name == API_KEY_ENV_VAR));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable(StatusCode::TOO_MANY_REQUESTS));
        assert!(!is_retryable(StatusCode::BAD_REQUEST));
        assert!(!is_retryable(StatusCode::FORBIDDEN));
    }
}
