//! Durable artifact persistence against an S3-compatible HTTP gateway.
//!
//! The gateway owns request signing; this client authenticates with a bearer
//! token and speaks plain `PUT {endpoint}/{key}`.

use super::ArtifactStore;
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct HttpArtifactStore {
    client: reqwest::Client,
    endpoint: Url,
    public_base: Url,
    token: String,
}

impl HttpArtifactStore {
    /// `endpoint` receives the uploads; `public_base` is where the persisted
    /// artifacts are served from and prefixes every returned URL.
    pub fn new(endpoint: &str, public_base: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: super::http_client(super::DEFAULT_TIMEOUT),
            endpoint: parse_base(endpoint)?,
            public_base: parse_base(public_base)?,
            token: token.into(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = super::http_client(timeout);
        self
    }
}

/// `Url::join` treats a base without a trailing slash as a file; normalize so
/// keys always append below the configured path.
fn parse_base(raw: &str) -> Result<Url> {
    let mut base = raw.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Url::parse(&base).map_err(|e| Error::InvalidArgument(format!("invalid base URL {raw:?}: {e}")))
}

#[async_trait]
impl ArtifactStore for HttpArtifactStore {
    async fn persist(&self, key: &str, data: Bytes, content_type: &str) -> Result<String> {
        let target = self.endpoint.join(key).map_err(|e| Error::persist(key, e))?;
        self.client
            .put(target)
            .bearer_auth(&self.token)
            .header("content-type", content_type)
            .body(data)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| Error::persist(key, e))?;
        let public = self.public_base.join(key).map_err(|e| Error::persist(key, e))?;
        Ok(public.to_string())
    }
}
