//! Image synthesis against a fal.ai-style edit-image endpoint.

use super::{GeneratedAsset, ImageSynthesizer};
use crate::{Error, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://fal.run";
const DEFAULT_MODEL_PATH: &str = "fal-ai/alpha-image-232/edit-image";

/// Synchronous-mode client for the hosted edit-image model.
pub struct FalImageSynthesizer {
    client: reqwest::Client,
    base_url: String,
    credentials: String,
    model_path: String,
}

impl FalImageSynthesizer {
    pub fn new(credentials: impl Into<String>) -> Self {
        Self {
            client: super::http_client(super::DEFAULT_TIMEOUT),
            base_url: DEFAULT_BASE_URL.to_string(),
            credentials: credentials.into(),
            model_path: DEFAULT_MODEL_PATH.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_model_path(mut self, model_path: impl Into<String>) -> Self {
        self.model_path = model_path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = super::http_client(timeout);
        self
    }
}

#[async_trait]
impl ImageSynthesizer for FalImageSynthesizer {
    async fn generate(&self, prompt: &str, image: &Bytes) -> Result<GeneratedAsset> {
        // The endpoint takes image URLs; inlining the source image as a data
        // URI avoids a separate upload round-trip.
        let data_uri = format!("data:image/png;base64,{}", BASE64.encode(image));
        let body = json!({
            "prompt": prompt,
            "image_size": "auto",
            "output_format": "png",
            "image_urls": [data_uri],
        });
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, self.model_path))
            .header("authorization", format!("Key {}", self.credentials))
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport("image-synthesis", e))?;
        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::transport("image-synthesis", e))?;
        Ok(GeneratedAsset {
            url: payload["images"][0]["url"].as_str().map(str::to_string),
            request_id: payload["request_id"].as_str().map(str::to_string),
        })
    }

    async fn fetch_asset(&self, url: &str) -> Result<Bytes> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::transport("image-synthesis", e))?;
        response
            .bytes()
            .await
            .map_err(|e| Error::transport("image-synthesis", e))
    }
}
