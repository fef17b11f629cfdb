use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, StatusCode, Url};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::error::CycleError;

pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// One request per poll cycle, no retries.
#[async_trait]
pub trait HomeworkApi: Send + Sync {
    async fn fetch(&self, from_date: i64) -> Result<Value, CycleError>;
}

#[derive(Clone)]
pub struct PracticumClient {
    http: Client,
    endpoint: Url,
    token: String,
}

impl fmt::Debug for PracticumClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticumClient")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl PracticumClient {
    pub fn new(token: String) -> Result<Self> {
        let endpoint = Url::parse(PRACTICUM_ENDPOINT).context("invalid review API endpoint")?;
        Self::with_endpoint(token, endpoint)
    }

    pub fn with_endpoint(token: String, endpoint: Url) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("homework-bot/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .no_proxy()
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            endpoint,
            token,
        })
    }

    pub fn build_request(&self, from_date: i64) -> reqwest::Result<reqwest::Request> {
        self.http
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .build()
    }
}

#[async_trait]
impl HomeworkApi for PracticumClient {
    async fn fetch(&self, from_date: i64) -> Result<Value, CycleError> {
        // The URL carries the cursor, so it is stripped to keep error texts
        // identical across cycles.
        let request = self
            .build_request(from_date)
            .map_err(|err| CycleError::Transport(err.without_url().to_string()))?;
        debug!(url = %request.url(), "requesting homework statuses");

        let res = self
            .http
            .execute(request)
            .await
            .map_err(|err| CycleError::Transport(err.without_url().to_string()))?;

        let status = res.status();
        if status != StatusCode::OK {
            return Err(CycleError::UnexpectedStatus {
                code: status.as_u16(),
            });
        }

        res.json::<Value>()
            .await
            .map_err(|err| CycleError::Shape(format!("body is not JSON: {}", err.without_url())))
    }
}
