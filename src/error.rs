// ===============================
// src/error.rs
// ===============================
use serde::Serialize;
use thiserror::Error;

/// Failure of a single request against the trading service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("HTTP error: status {status}")]
    Http { status: u16 },
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind { Network, Http, Decode }

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::Network(_) => FetchErrorKind::Network,
            FetchError::Http { .. } => FetchErrorKind::Http,
            FetchError::Decode(_) => FetchErrorKind::Decode,
        }
    }
}

impl FetchErrorKind {
    /// Label value used in metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            FetchErrorKind::Network => "network",
            FetchErrorKind::Http => "http",
            FetchErrorKind::Decode => "decode",
        }
    }
}
