use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::Deserialize;
use thiserror::Error;

use crate::config::Upload;

#[derive(Error, Debug)]
pub enum ImageHostError {
    #[error("image host is not configured")]
    NotConfigured,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("image host rejected the upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Somewhere uploaded images can be stored and served from
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store an image given as a `data:` URI and return its public URL
    async fn upload(&self, data_uri: String) -> Result<String, ImageHostError>;
}

/// Encode raw image bytes as a base64 `data:` URI
pub fn data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Cloudinary unsigned uploads through an upload preset
pub struct CloudinaryImageHost {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
}

#[derive(Deserialize)]
struct CloudinaryUploadResponse {
    secure_url: String,
}

impl CloudinaryImageHost {
    pub fn new(settings: &Upload) -> Self {
        Self {
            client: reqwest::Client::new(),
            cloud_name: settings.cloud_name.trim().to_string(),
            upload_preset: settings.upload_preset.trim().to_string(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.cloud_name.is_empty() && !self.upload_preset.is_empty()
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.cloud_name
        )
    }
}

#[async_trait]
impl ImageHost for CloudinaryImageHost {
    async fn upload(&self, data_uri: String) -> Result<String, ImageHostError> {
        if !self.is_configured() {
            return Err(ImageHostError::NotConfigured);
        }

        let form = [
            ("file", data_uri.as_str()),
            ("upload_preset", self.upload_preset.as_str()),
        ];
        let response = self
            .client
            .post(self.upload_url())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ImageHostError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let uploaded: CloudinaryUploadResponse = response.json().await?;
        tracing::info!("Uploaded image to {}", uploaded.secure_url);
        Ok(uploaded.secure_url)
    }
}
