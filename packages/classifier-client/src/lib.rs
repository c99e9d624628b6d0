//! Pure REST client for the job classification worker.
//!
//! The worker exposes three routes:
//!
//! - `POST /` scores a batch of jobs (`{"jobs": [...]}` → `{"results": [...]}`)
//! - `POST /<endpoint>` runs one specialized classifier on a single job
//! - `GET /health` answers when the worker is up
//!
//! The client does no retrying and no defaulting; callers decide how to
//! degrade.
//!
//! # Example
//!
//! ```rust,ignore
//! use classifier_client::{ClassifierClient, ClassifierConfig, JobPayload};
//!
//! let client = ClassifierClient::new(ClassifierConfig::new("http://127.0.0.1:8787"))?;
//! client.health().await?;
//!
//! let jobs = vec![JobPayload::new("UX Designer", "Figma, prototyping")];
//! let results = client.classify_batch(&jobs).await?;
//! ```

pub mod error;
pub mod types;

pub use error::{ClassifierError, Result};
pub use types::{
    BatchRequest, BatchResponse, BatchResultItem, JobPayload, MatchResponse, SingleJobRequest,
};

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;

/// Where the worker lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl ClassifierConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(60),
            health_timeout: Duration::from_secs(5),
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ClassifierClient {
    http: reqwest::Client,
    base_url: String,
    health_timeout: Duration,
}

impl ClassifierClient {
    pub fn new(config: ClassifierConfig) -> Result<Self> {
        let base_url = config.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClassifierError::Config("classifier base URL is empty".into()));
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClassifierError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            health_timeout: config.health_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe `GET /health`. Any non-success status is an error.
    pub async fn health(&self) -> Result<()> {
        let url = format!("{}/health", self.base_url);
        let resp = self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(())
    }

    /// Score a batch of jobs. The worker is expected to answer with one
    /// result per job, in order; this method does not enforce that.
    pub async fn classify_batch(&self, jobs: &[JobPayload]) -> Result<Vec<BatchResultItem>> {
        let url = format!("{}/", self.base_url);
        debug!(url = %url, jobs = jobs.len(), "Sending classification batch");

        let resp: BatchResponse = self.post_json(&url, &BatchRequest { jobs }).await?;
        Ok(resp.results)
    }

    /// Run one specialized classifier (e.g. `/classify-frontend`) on a job.
    pub async fn classify_job(&self, endpoint: &str, job: &JobPayload) -> Result<MatchResponse> {
        let url = if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        };
        debug!(url = %url, title = %job.title, "Calling specialized classifier");

        self.post_json(&url, &SingleJobRequest { job }).await
    }

    async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let resp = self.http.post(url).json(body).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClassifierError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        serde_json::from_str(&text)
            .map_err(|e| ClassifierError::Parse(format!("Failed to deserialize response: {}", e)))
    }
}
