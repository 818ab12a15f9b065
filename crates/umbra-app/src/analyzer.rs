//! Boundary to the analyzer service that produces snapshots and file contents.

use crate::wire::{AnalyzePayload, ErrorDetailDto, HealthDto, ReadFileDto};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use umbra_core::GraphSnapshot;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalyzerError {
    /// The service could not be reached at all.
    #[error("Analyzer unavailable: {0}")]
    Unavailable(String),
    #[error("Not found: {0}")]
    NotFound(String),
    /// The service answered, but with an error.
    #[error("{0}")]
    Remote(String),
    #[error("Failed to decode analyzer response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub backend_online: bool,
    pub llm_online: bool,
}

impl HealthStatus {
    pub fn offline() -> Self {
        Self::default()
    }
}

#[async_trait]
pub trait AnalyzerClient: Send + Sync {
    /// Never fails; an unreachable service is reported as offline.
    async fn health(&self) -> HealthStatus;

    async fn fetch_snapshot(&self) -> Result<GraphSnapshot, AnalyzerError>;

    async fn read_file(&self, path: &str) -> Result<String, AnalyzerError>;
}

pub struct HttpAnalyzer {
    client: Client,
    base_url: String,
    health_timeout: Duration,
}

impl HttpAnalyzer {
    pub fn new(
        base_url: impl Into<String>,
        request_timeout: Duration,
        health_timeout: Duration,
    ) -> Result<Self, AnalyzerError> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| AnalyzerError::Unavailable(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            health_timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, route: &str) -> String {
        format!("{}/{}", self.base_url, route)
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AnalyzerError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let detail = response
            .json::<ErrorDetailDto>()
            .await
            .ok()
            .and_then(|d| d.detail)
            .unwrap_or_else(|| status.to_string());
        if status == StatusCode::NOT_FOUND {
            Err(AnalyzerError::NotFound(detail))
        } else {
            Err(AnalyzerError::Remote(detail))
        }
    }
}

fn transport_error(err: reqwest::Error) -> AnalyzerError {
    if err.is_decode() {
        AnalyzerError::Decode(err.to_string())
    } else {
        AnalyzerError::Unavailable(err.to_string())
    }
}

#[async_trait]
impl AnalyzerClient for HttpAnalyzer {
    async fn health(&self) -> HealthStatus {
        let result = self
            .client
            .get(self.url("health"))
            .timeout(self.health_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                tracing::debug!("Health check returned {}", response.status());
                return HealthStatus::offline();
            }
            Err(e) => {
                tracing::debug!("Health check failed: {}", e);
                return HealthStatus::offline();
            }
        };

        // Reachable is enough for the backend to count as online.
        let llm_online = response
            .json::<HealthDto>()
            .await
            .map(|dto| dto.llm_connected())
            .unwrap_or(false);
        HealthStatus {
            backend_online: true,
            llm_online,
        }
    }

    async fn fetch_snapshot(&self) -> Result<GraphSnapshot, AnalyzerError> {
        let response = self
            .client
            .get(self.url("analyze"))
            .send()
            .await
            .map_err(transport_error)?;
        let payload: AnalyzePayload = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AnalyzerError::Decode(e.to_string()))?;

        tracing::debug!(
            "Fetched snapshot: {} nodes, {} edges",
            payload.nodes.len(),
            payload.edges.len()
        );
        Ok(payload.into())
    }

    async fn read_file(&self, path: &str) -> Result<String, AnalyzerError> {
        let response = self
            .client
            .get(self.url("read-file"))
            .query(&[("path", path)])
            .send()
            .await
            .map_err(transport_error)?;
        let body: ReadFileDto = Self::check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AnalyzerError::Decode(e.to_string()))?;

        match body {
            ReadFileDto::Content { content, .. } => Ok(content),
            ReadFileDto::Failure { error } => Err(AnalyzerError::Remote(error)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let analyzer = HttpAnalyzer::new(
            "http://127.0.0.1:8000/",
            Duration::from_secs(5),
            Duration::from_secs(2),
        )
        .unwrap();
        assert_eq!(analyzer.base_url(), "http://127.0.0.1:8000");
        assert_eq!(analyzer.url("health"), "http://127.0.0.1:8000/health");
    }

    #[tokio::test]
    async fn test_unreachable_service_reports_offline() {
        // Port 9 (discard) on localhost is expected to refuse connections.
        let analyzer = HttpAnalyzer::new(
            "http://127.0.0.1:9",
            Duration::from_millis(500),
            Duration::from_millis(500),
        )
        .unwrap();
        assert_eq!(analyzer.health().await, HealthStatus::offline());
        match analyzer.fetch_snapshot().await {
            Err(AnalyzerError::Unavailable(_)) => {}
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }
}
