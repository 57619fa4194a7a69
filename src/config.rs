// ===============================
// src/config.rs
// ===============================
/*
=============================================================================
Project : trading_dash_sync — cached, polled view of a remote trading service
Module  : config.rs
Version : 0.1.0
Author  : Kukuh Tripamungkas Wicaksono (Kukuh TW)
Email   : kukuhtw@gmail.com
WhatsApp: https://wa.me/628129893706
LinkedIn: https://id.linkedin.com/in/kukuhtw
License : MIT (see LICENSE)

Summary : Polls seven JSON resources from a trading control service into a
          single dashboard snapshot, relays the start/stop trading command,
          exposes Prometheus metrics, and logs every degraded cycle.

(c) 2025 Kukuh TW. All rights reserved where applicable.
=============================================================================
*/
use std::env;
use std::time::Duration;

use dotenvy::dotenv;
use thiserror::Error;
use url::Url;

use crate::scheduler::DEFAULT_PERIOD;

pub const DEFAULT_API_BASE: &str = "http://localhost:5000/api/trading";
pub const DEFAULT_METRICS_PORT: u16 = 9899;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid API_BASE {value:?}: {reason}")]
    ApiBase { value: String, reason: String },
}

#[derive(Clone, Debug)]
pub struct Args {
    pub api_base: String,
    pub poll_interval: Duration,
    pub metrics_port: u16, // 0 = metrics server mati
    pub log_filter: String,
}

/// Validate an API base URL; only http(s) is accepted.
pub fn parse_api_base(raw: &str) -> Result<String, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::ApiBase {
        value: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url.as_str().trim_end_matches('/').to_string()),
        other => Err(ConfigError::ApiBase {
            value: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

fn interval_from(raw: Option<String>) -> Duration {
    raw.and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_PERIOD)
}

pub fn load() -> Result<Args, ConfigError> {
    // Pastikan .env dibaca (agar API_BASE, POLL_INTERVAL_MS, dll ter-load)
    let _ = dotenv();

    let api_base = parse_api_base(
        &env::var("API_BASE").unwrap_or_else(|_| DEFAULT_API_BASE.to_string()),
    )?;
    let poll_interval = interval_from(env::var("POLL_INTERVAL_MS").ok());
    let metrics_port = env::var("METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_METRICS_PORT);
    let log_filter = env::var("LOG_FILTER").unwrap_or_else(|_| "info".to_string());

    Ok(Args { api_base, poll_interval, metrics_port, log_filter })
}
