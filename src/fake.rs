// ===============================
// src/fake.rs (scripted RemoteApi for tests)
// ===============================
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::domain::Resource;
use crate::error::FetchError;
use crate::fetcher::RemoteApi;

struct Scripted {
    delay: Duration,
    result: Result<Value, FetchError>,
}

/// Each name has a queue of one-shot replies and a fallback used once the queue is empty.
#[derive(Default)]
pub(crate) struct ScriptedApi {
    queued: Mutex<HashMap<String, VecDeque<Scripted>>>,
    fallback: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedApi {
    /// Every resource answers with `sample(resource, 0)`; toggle is unscripted.
    pub fn healthy() -> Self {
        let api = Self::default();
        for r in Resource::ALL {
            api.set(r.path(), sample(r, 0));
        }
        api
    }

    pub fn set(&self, name: &str, body: Value) {
        self.fallback.lock().unwrap().insert(name.to_string(), body);
    }

    pub fn push(&self, name: &str, result: Result<Value, FetchError>) {
        self.push_delayed(name, Duration::ZERO, result);
    }

    pub fn push_delayed(&self, name: &str, delay: Duration, result: Result<Value, FetchError>) {
        self.queued
            .lock()
            .unwrap()
            .entry(name.to_string())
            .or_default()
            .push_back(Scripted { delay, result });
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == name).count()
    }

    async fn answer(&self, name: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(name.to_string());
        let next = self.queued.lock().unwrap().get_mut(name).and_then(|q| q.pop_front());
        match next {
            Some(s) => {
                if !s.delay.is_zero() {
                    sleep(s.delay).await;
                }
                s.result
            }
            None => self
                .fallback
                .lock()
                .unwrap()
                .get(name)
                .cloned()
                .ok_or_else(|| FetchError::Network(format!("no route for {name}"))),
        }
    }
}

#[async_trait]
impl RemoteApi for ScriptedApi {
    async fn fetch(&self, resource: &str) -> Result<Value, FetchError> {
        self.answer(resource).await
    }

    async fn command(&self, name: &str) -> Result<Value, FetchError> {
        self.answer(name).await
    }
}

/// A well-formed body for `resource`; `seed` makes bodies from different cycles distinguishable.
pub(crate) fn sample(resource: Resource, seed: u32) -> Value {
    let n = f64::from(seed);
    match resource {
        Resource::Status => json!({
            "is_active": false, "current_price": 51000.0 + n, "balance": 1000.0 + n,
            "total_trades": seed, "win_rate": 0.0
        }),
        Resource::Prediction => json!({"direction": "UP", "confidence": 0.5 + n / 1000.0}),
        Resource::PriceHistory => json!([
            {"time": "09:00", "price": 49800.0 + n},
            {"time": "09:01", "price": 49825.0 + n, "volume": 1100}
        ]),
        Resource::RecentTrades => json!([
            {"id": seed + 1, "time": "09:01", "direction": "DOWN", "result": "LOSS", "profit": -25.0 - n}
        ]),
        Resource::Analytics => json!({
            "total_return": 1.5 + n, "sharpe_ratio": 0.85, "max_drawdown": -5.2,
            "total_profit": 15.0 + n, "avg_profit_per_trade": 1.5
        }),
        Resource::Settings => json!({
            "trade_amount": 50.0 + n, "stop_loss": 2.0, "take_profit": 3.0,
            "min_confidence": 0.7, "max_trades_per_day": 20, "risk_management": "medium"
        }),
        Resource::Logs => json!([
            {"timestamp": "09:05:23", "level": "INFO", "message": format!("seed {seed}")}
        ]),
    }
}
