//! Object storage the detection backend reads uploaded photos from.

use std::path::Path;

use async_trait::async_trait;
use tracing::{info, warn};

use polybot_core::config::StorageConfig;

use crate::aws::{self, AwsCredentials, SigV4};
use crate::error::DetectError;

#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload the file at `local` under `key`.
    async fn upload(&self, local: &Path, key: &str) -> Result<(), DetectError>;
}

/// S3 `PutObject` over plain HTTPS with SigV4 signing.
pub struct S3ObjectStore {
    client: reqwest::Client,
    credentials: AwsCredentials,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    pub fn new(
        credentials: AwsCredentials,
        bucket: String,
        region: String,
        endpoint: Option<String>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            bucket,
            region,
            endpoint: endpoint.map(|e| e.trim_end_matches('/').to_string()),
        }
    }

    /// Build from `[storage]`, resolving the bucket name and AWS credentials.
    pub fn from_config(config: &StorageConfig) -> Result<Self, DetectError> {
        let bucket = config
            .bucket()
            .map_err(|e| DetectError::Credentials(e.to_string()))?;
        let credentials = aws::resolve_credentials(config.profile.as_deref())?;
        Ok(Self::new(
            credentials,
            bucket,
            config.region.clone(),
            config.endpoint.clone(),
        ))
    }

    /// Full URL and canonical path for `key`.
    ///
    /// Virtual-hosted style on AWS, path style on a custom endpoint.
    fn object_url(&self, key: &str) -> (String, String) {
        let encoded = aws::encode_key(key.trim_start_matches('/'));
        match self.endpoint {
            Some(ref endpoint) => {
                let path = format!("/{}/{encoded}", self.bucket);
                (format!("{endpoint}{path}"), path)
            }
            None => {
                let path = format!("/{encoded}");
                (
                    format!(
                        "https://{}.s3.{}.amazonaws.com{path}",
                        self.bucket, self.region
                    ),
                    path,
                )
            }
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, local: &Path, key: &str) -> Result<(), DetectError> {
        let body = tokio::fs::read(local).await?;
        let (url, path) = self.object_url(key);

        let parsed = reqwest::Url::parse(&url)
            .map_err(|e| DetectError::Parse(format!("bad object URL {url}: {e}")))?;
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(h), Some(p)) => format!("{h}:{p}"),
            (Some(h), None) => h.to_string(),
            (None, _) => return Err(DetectError::Parse(format!("object URL has no host: {url}"))),
        };

        let signer = SigV4 {
            credentials: &self.credentials,
            region: &self.region,
            service: "s3",
        };
        let headers = signer.sign("PUT", &host, &path, &body, chrono::Utc::now())?;

        let size = body.len();
        let mut builder = self.client.put(parsed).body(body);
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let resp = builder.send().await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            warn!(status, key, body = %text, "S3 upload rejected");
            return Err(DetectError::Api {
                service: "s3",
                status,
                message: text,
            });
        }

        info!(bucket = %self.bucket, key, bytes = size, "uploaded photo");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> AwsCredentials {
        AwsCredentials {
            access_key_id: "AKID".into(),
            secret_access_key: "secret".into(),
            session_token: None,
        }
    }

    #[test]
    fn aws_urls_are_virtual_hosted() {
        let store = S3ObjectStore::new(creds(), "images".into(), "eu-west-1".into(), None);
        let (url, path) = store.object_url("telegram_photos/photos/file 1.jpg");
        assert_eq!(
            url,
            "https://images.s3.eu-west-1.amazonaws.com/telegram_photos/photos/file%201.jpg"
        );
        assert_eq!(path, "/telegram_photos/photos/file%201.jpg");
    }

    #[test]
    fn custom_endpoint_uses_path_style() {
        let store = S3ObjectStore::new(
            creds(),
            "images".into(),
            "us-east-1".into(),
            Some("http://minio:9000/".into()),
        );
        let (url, path) = store.object_url("/a/b.jpg");
        assert_eq!(url, "http://minio:9000/images/a/b.jpg");
        assert_eq!(path, "/images/a/b.jpg");
    }
}
