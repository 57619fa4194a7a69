// ===============================
// src/domain.rs
// ===============================
use std::fmt;

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

use crate::error::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "UP", alias = "ALTA")]
    Up,
    #[serde(rename = "DOWN", alias = "BAIXA")]
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeKind {
    #[default]
    Auto,
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult { Win, Loss }

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel { Info, Warning, Error, Debug }

/// Status agregat dari service (sumber kebenaran untuk `is_active`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub is_active: bool,
    pub current_price: f64,
    pub balance: f64,
    pub total_trades: u64,
    pub win_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_available: Option<bool>,
}

impl Default for SystemStatus {
    fn default() -> Self {
        Self {
            is_active: false,
            current_price: 50_000.0,
            balance: 1_000.0,
            total_trades: 0,
            win_rate: 0.0,
            model_available: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction { pub direction: Direction, pub confidence: f64 }

impl Default for Prediction {
    fn default() -> Self { Self { direction: Direction::Up, confidence: 0.75 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub time: String,
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
}

/// Trade id dari service bisa angka atau string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TradeId {
    Num(i64),
    Text(String),
}

impl fmt::Display for TradeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeId::Num(n) => write!(f, "{n}"),
            TradeId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub id: TradeId,
    pub direction: Direction,
    pub time: String,
    // di wire namanya "type"; trade otomatis tidak mengirim field ini
    #[serde(rename = "type", default)]
    pub kind: TradeKind,
    pub result: TradeResult,
    pub profit: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSummary {
    pub total_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
    pub total_profit: f64,
    pub avg_profit_per_trade: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub trade_amount: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub min_confidence: f64,
    pub max_trades_per_day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_management: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry { pub timestamp: String, pub level: LogLevel, pub message: String }

/// Body of the `POST /toggle` confirmation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToggleResponse {
    pub is_active: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// The seven polled resources, in the order a refresh cycle visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Status,
    Prediction,
    PriceHistory,
    RecentTrades,
    Analytics,
    Settings,
    Logs,
}

impl Resource {
    pub const ALL: [Resource; 7] = [
        Resource::Status,
        Resource::Prediction,
        Resource::PriceHistory,
        Resource::RecentTrades,
        Resource::Analytics,
        Resource::Settings,
        Resource::Logs,
    ];

    /// Path segment under the API base.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Status       => "status",
            Resource::Prediction   => "prediction",
            Resource::PriceHistory => "price-history",
            Resource::RecentTrades => "recent-trades",
            Resource::Analytics    => "analytics",
            Resource::Settings     => "settings",
            Resource::Logs         => "logs",
        }
    }

    pub fn position(self) -> usize {
        Resource::ALL.iter().position(|r| *r == self).unwrap_or(0)
    }

    /// Decode a raw JSON body into the slice this resource owns.
    pub fn decode(self, body: Value) -> Result<Slice, FetchError> {
        Ok(match self {
            Resource::Status       => Slice::Status(typed(self, body)?),
            Resource::Prediction   => Slice::Prediction(typed(self, body)?),
            Resource::PriceHistory => Slice::Prices(typed(self, body)?),
            Resource::RecentTrades => Slice::Trades(typed(self, body)?),
            Resource::Analytics    => Slice::Analytics(typed(self, body)?),
            Resource::Settings     => Slice::Settings(typed(self, body)?),
            Resource::Logs         => Slice::Logs(typed(self, body)?),
        })
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.path()) }
}

fn typed<T: DeserializeOwned>(resource: Resource, body: Value) -> Result<T, FetchError> {
    serde_json::from_value(body).map_err(|e| FetchError::Decode(format!("{resource}: {e}")))
}

/// One resource's worth of dashboard state, replaced as a whole.
#[derive(Debug, Clone, PartialEq)]
pub enum Slice {
    Status(SystemStatus),
    Prediction(Prediction),
    Prices(Vec<PricePoint>),
    Trades(Vec<Trade>),
    Analytics(AnalyticsSummary),
    Settings(Settings),
    Logs(Vec<LogEntry>),
}

impl Slice {
    pub fn resource(&self) -> Resource {
        match self {
            Slice::Status(_)     => Resource::Status,
            Slice::Prediction(_) => Resource::Prediction,
            Slice::Prices(_)     => Resource::PriceHistory,
            Slice::Trades(_)     => Resource::RecentTrades,
            Slice::Analytics(_)  => Resource::Analytics,
            Slice::Settings(_)   => Resource::Settings,
            Slice::Logs(_)       => Resource::Logs,
        }
    }
}

/// Snapshot yang dibaca layer rendering. Semua field punya default eksplisit.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardState {
    pub status: SystemStatus,
    pub prediction: Prediction,
    pub prices: Vec<PricePoint>,
    pub trades: Vec<Trade>,
    pub analytics: AnalyticsSummary,
    pub settings: Settings,
    pub logs: Vec<LogEntry>,
    pub ready: bool,
}

impl DashboardState {
    /// Replace the slice wholesale; `ready` is never touched here.
    pub fn apply(&mut self, slice: Slice) {
        match slice {
            Slice::Status(s)     => self.status = s,
            Slice::Prediction(p) => self.prediction = p,
            Slice::Prices(v)     => self.prices = v,
            Slice::Trades(v)     => self.trades = v,
            Slice::Analytics(a)  => self.analytics = a,
            Slice::Settings(s)   => self.settings = s,
            Slice::Logs(v)       => self.logs = v,
        }
    }

    /// Current value of one slice, for comparisons across cycles.
    pub fn slice(&self, resource: Resource) -> Slice {
        match resource {
            Resource::Status       => Slice::Status(self.status.clone()),
            Resource::Prediction   => Slice::Prediction(self.prediction.clone()),
            Resource::PriceHistory => Slice::Prices(self.prices.clone()),
            Resource::RecentTrades => Slice::Trades(self.trades.clone()),
            Resource::Analytics    => Slice::Analytics(self.analytics.clone()),
            Resource::Settings     => Slice::Settings(self.settings.clone()),
            Resource::Logs         => Slice::Logs(self.logs.clone()),
        }
    }
}
