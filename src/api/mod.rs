//! Remote picture source: the JSONPlaceholder `/photos` and `/albums` endpoints.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::fmt;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::model::{AlbumRemote, PictureRemote};

pub const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";
pub const DEFAULT_USER_AGENT: &str = "my-pictures/0.1";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request url: {0}")]
    InvalidUrl(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server returned {status}: {body}")]
    Http { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The three reads the app makes against the picture API.
#[async_trait]
pub trait PicturesApi: Send + Sync {
    async fn photos(&self) -> Result<Vec<PictureRemote>, ApiError>;

    async fn photo(&self, id: i64) -> Result<PictureRemote, ApiError>;

    async fn album(&self, id: i64) -> Result<AlbumRemote, ApiError>;
}

#[derive(Clone)]
pub struct JsonPlaceholderClient {
    http: Client,
    base_url: Url,
}

impl fmt::Debug for JsonPlaceholderClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonPlaceholderClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl JsonPlaceholderClient {
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_USER_AGENT)
    }

    pub fn from_config(cfg: &Config) -> Result<Self, ApiError> {
        Self::with_base_url(&cfg.api.base_url, &cfg.api.user_agent)
    }

    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self, ApiError> {
        // Relative joins replace the last path segment unless it ends in '/'.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url =
            Url::parse(&normalized).map_err(|e| ApiError::InvalidUrl(format!("{normalized}: {e}")))?;
        let http = Client::builder()
            .user_agent(user_agent)
            .no_proxy()
            .build()?;
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn build_request(&self, path: &str) -> Result<reqwest::Request, ApiError> {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|e| ApiError::InvalidUrl(format!("{path}: {e}")))?;
        Ok(self
            .http
            .get(endpoint)
            .header("Accept", "application/json")
            .build()?)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let request = self.build_request(path)?;
        debug!(url = %request.url(), "GET");

        let res = self.http.execute(request).await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, path, "picture API error");
            return Err(ApiError::Http { status, body });
        }

        let body = res.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PicturesApi for JsonPlaceholderClient {
    #[instrument(skip_all)]
    async fn photos(&self) -> Result<Vec<PictureRemote>, ApiError> {
        let photos: Vec<PictureRemote> = self.get_json("photos").await?;
        debug!(count = photos.len(), "fetched photos");
        Ok(photos)
    }

    #[instrument(skip(self))]
    async fn photo(&self, id: i64) -> Result<PictureRemote, ApiError> {
        self.get_json(&format!("photos/{id}")).await
    }

    #[instrument(skip(self))]
    async fn album(&self, id: i64) -> Result<AlbumRemote, ApiError> {
        self.get_json(&format!("albums/{id}")).await
    }
}
