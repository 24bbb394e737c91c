//! Client for the detection service's `POST /predict?imgName=<key>` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use polybot_core::config::DetectionConfig;

use crate::error::DetectError;
use crate::types::PredictionSummary;

/// Anything that can run detection on an uploaded image.
#[async_trait]
pub trait DetectionBackend: Send + Sync {
    /// Request a prediction for the object stored under `img_name`.
    ///
    /// `Ok(None)` means the backend found nothing to report.
    async fn predict(&self, img_name: &str) -> Result<Option<PredictionSummary>, DetectError>;
}

pub struct HttpDetectionBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDetectionBackend {
    pub fn new(config: &DetectionConfig) -> Result<Self, DetectError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/predict", self.base_url)
    }
}

#[async_trait]
impl DetectionBackend for HttpDetectionBackend {
    async fn predict(&self, img_name: &str) -> Result<Option<PredictionSummary>, DetectError> {
        debug!(img_name, url = %self.endpoint(), "requesting prediction");

        let resp = self
            .client
            .post(self.endpoint())
            .query(&[("imgName", img_name)])
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), body = %text, "detection backend error");
            return Err(DetectError::Api {
                service: "detection",
                status: status.as_u16(),
                message: text,
            });
        }

        let summary = resp
            .json::<PredictionSummary>()
            .await
            .map_err(|e| DetectError::Parse(e.to_string()))?;
        Ok(Some(summary))
    }
}
