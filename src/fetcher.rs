// ===============================
// src/fetcher.rs
// ===============================
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;

use crate::error::FetchError;

/// Boundary to the trading service. No retry and no timeout at this layer.
#[async_trait]
pub trait RemoteApi: Send + Sync {
    /// `GET {base}/{resource}` decoded as JSON.
    async fn fetch(&self, resource: &str) -> Result<Value, FetchError>;

    /// `POST {base}/{name}` with an empty body, decoded as JSON.
    async fn command(&self, name: &str) -> Result<Value, FetchError>;
}

/// REST client untuk service trading (reqwest).
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    http: reqwest::Client,
    base: String,
}

impl HttpFetcher {
    pub fn new(api_base: &str) -> Self {
        Self::with_client(reqwest::Client::new(), api_base)
    }

    pub fn with_client(http: reqwest::Client, api_base: &str) -> Self {
        Self { http, base: api_base.trim_end_matches('/').to_string() }
    }

    pub fn url(&self, name: &str) -> String {
        format!("{}/{}", self.base, name.trim_start_matches('/'))
    }

    async fn read_json(rsp: reqwest::Response) -> Result<Value, FetchError> {
        let status = rsp.status();
        if !status.is_success() {
            return Err(FetchError::Http { status: status.as_u16() });
        }
        // body putus di tengah jalan tetap dihitung network error
        let bytes = rsp.bytes().await.map_err(|e| FetchError::Network(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl RemoteApi for HttpFetcher {
    async fn fetch(&self, resource: &str) -> Result<Value, FetchError> {
        let url = self.url(resource);
        let rsp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Self::read_json(rsp).await
    }

    async fn command(&self, name: &str) -> Result<Value, FetchError> {
        let url = self.url(name);
        let rsp = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;
        Self::read_json(rsp).await
    }
}
