use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use thiserror::Error;

use crate::config::PortalConfig;

/// One HTTP response as seen by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Raw `Content-Type` header, empty when absent.
    pub content_type: String,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, content_type: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self { status, content_type: content_type.into(), body: body.into() }
    }

    /// Body decoded lossily as UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Media type without parameters, lowercased (`application/pdf; x=y` -> `application/pdf`).
    pub fn media_type(&self) -> String {
        self.content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("HTTP client init failed: {0}")]
    Init(String),
    #[error("HTTP request to {url} failed: {message}")]
    Request { url: String, message: String },
    #[error("HTTP body read from {url} failed: {message}")]
    Body { url: String, message: String },
}

/// Plain GET transport for portal pages and document bytes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// `reqwest`-backed transport.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(config: &PortalConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| TransportError::Init(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(|e| TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body { url: url.to_string(), message: e.to_string() })?;
        Ok(HttpResponse { status, content_type, body: body.to_vec() })
    }
}
