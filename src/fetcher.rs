use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::config::ScraperConfig;
use crate::utils::error::{AppError, FetchError, Result};

/// One initial attempt plus at most one retry.
pub const MAX_FETCH_ATTEMPTS: u32 = 2;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub body: String,
    pub response_time_ms: u64,
}

pub struct PageFetcher {
    client: Client,
    config: ScraperConfig,
}

impl PageFetcher {
    pub fn new(config: ScraperConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| AppError::Validation(format!("Invalid accept_language header: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn max_attempts(&self) -> u32 {
        if self.config.retry_on_failure {
            MAX_FETCH_ATTEMPTS
        } else {
            1
        }
    }

    /// GET `url`. A bad status is retried once (if enabled); timeouts and
    /// transport errors are returned immediately.
    pub async fn fetch(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let max_attempts = self.max_attempts();
        let mut attempt = 1;

        loop {
            match self.fetch_once(url).await {
                Ok(page) => return Ok(page),
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    warn!("Attempt {}/{} for {} failed: {}, retrying", attempt, max_attempts, url, err);
                    attempt += 1;
                    tokio::time::sleep(Duration::from_millis(self.config.pause_ms)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> std::result::Result<FetchedPage, FetchError> {
        let start_time = Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                code: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&e))?;

        let response_time_ms = start_time.elapsed().as_millis() as u64;
        debug!("Fetched {} ({} bytes) in {}ms", url, body.len(), response_time_ms);

        Ok(FetchedPage {
            body,
            response_time_ms,
        })
    }
}
