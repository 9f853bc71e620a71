//! HTTP client shared foundation
//!
//! This module provides a shared HTTP client with:
//! - Configurable timeout and User-Agent
//! - Exponential backoff retry logic (max 3 retries)
//! - Rate limit error handling

use crate::error::ResolveError;
use reqwest::Client;
use std::path::Path;
use std::time::Duration;

/// Default timeout for HTTP requests (30 seconds)
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default User-Agent header
const DEFAULT_USER_AGENT: &str = concat!("chub/", env!("CARGO_PKG_VERSION"));

/// Maximum number of retry attempts
const MAX_RETRIES: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_DELAY_MS: u64 = 100;

/// HTTP client wrapper with retry logic
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    max_retries: u32,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, ResolveError> {
        Self::with_config(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(timeout: Duration, user_agent: &str) -> Result<Self, ResolveError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| ResolveError::NetworkError {
                package: String::new(),
                index: "HTTP client".to_string(),
                message: format!("failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            max_retries: MAX_RETRIES,
        })
    }

    /// Set the maximum number of retries
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Perform a GET request with retry logic and error context
    pub async fn get_with_context(
        &self,
        url: &str,
        package: &str,
        index: &str,
    ) -> Result<reqwest::Response, ResolveError> {
        let mut last_error = None;
        let mut delay = BASE_DELAY_MS;

        for attempt in 0..=self.max_retries {
            match self.client.get(url).send().await {
                Ok(response) => {
                    // Check for rate limiting
                    if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(ResolveError::RateLimitExceeded {
                            index: index.to_string(),
                        });

                        if attempt < self.max_retries {
                            tokio::time::sleep(Duration::from_millis(delay)).await;
                            delay *= 2;
                            continue;
                        }
                    }

                    // Check for 404 Not Found
                    if response.status() == reqwest::StatusCode::NOT_FOUND {
                        return Err(ResolveError::package_not_found(package, index));
                    }

                    // Check for other errors
                    if !response.status().is_success() {
                        let status = response.status();
                        return Err(ResolveError::network_error(
                            package,
                            index,
                            format!("HTTP {}", status),
                        ));
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if e.is_timeout() {
                        last_error = Some(ResolveError::timeout(package, index));
                    } else {
                        last_error = Some(ResolveError::network_error(package, index, e.to_string()));
                    }

                    if attempt < self.max_retries {
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                        delay *= 2;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ResolveError::network_error(package, index, "unknown error")))
    }

    /// Perform a GET request and parse the JSON response
    pub async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        package: &str,
        index: &str,
    ) -> Result<T, ResolveError> {
        let response = self.get_with_context(url, package, index).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ResolveError::InvalidResponse {
                package: package.to_string(),
                index: index.to_string(),
                message: format!("failed to parse JSON: {}", e),
            })
    }

    /// Download a URL to a file on disk
    pub async fn download(
        &self,
        url: &str,
        dest: &Path,
        package: &str,
        index: &str,
    ) -> Result<(), ResolveError> {
        let response = self.get_with_context(url, package, index).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ResolveError::InvalidResponse {
                package: package.to_string(),
                index: index.to_string(),
                message: format!("failed to read response body: {}", e),
            })?;
        tokio::fs::write(dest, &bytes)
            .await
            .map_err(|source| ResolveError::Io {
                path: dest.to_path_buf(),
                source,
            })
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new().expect("failed to create default HTTP client")
    }
}
