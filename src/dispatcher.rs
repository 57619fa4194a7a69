// ===============================
// src/dispatcher.rs (start/stop trading command)
// ===============================
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::ToggleResponse;
use crate::error::FetchError;
use crate::fetcher::RemoteApi;
use crate::metrics::TOGGLES;
use crate::store::DashboardStore;

pub const TOGGLE: &str = "toggle";

/// Relays the toggle command. Local state only changes on a confirmed reply.
#[derive(Clone)]
pub struct CommandDispatcher {
    api: Arc<dyn RemoteApi>,
    store: Arc<DashboardStore>,
}

impl CommandDispatcher {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<DashboardStore>) -> Self {
        Self { api, store }
    }

    async fn send_toggle(&self) -> Result<ToggleResponse, FetchError> {
        let body = self.api.command(TOGGLE).await?;
        serde_json::from_value(body).map_err(|e| FetchError::Decode(format!("{TOGGLE}: {e}")))
    }

    /// Returns the `is_active` value confirmed by the service.
    ///
    /// The write is tagged with the generation current at call time; if the
    /// scheduler is stopped before the reply arrives the confirmed value is
    /// still returned but the dashboard is left alone.
    pub async fn toggle_trading(&self) -> Result<bool, FetchError> {
        let generation = self.store.current_generation();
        match self.send_toggle().await {
            Ok(rsp) => {
                if self.store.set_active(generation, rsp.is_active) {
                    TOGGLES.with_label_values(&["confirmed"]).inc();
                    info!(is_active = rsp.is_active, message = ?rsp.message, "trading toggle confirmed");
                } else {
                    TOGGLES.with_label_values(&["discarded"]).inc();
                    warn!(is_active = rsp.is_active, "toggle confirmed after stop, not applied");
                }
                Ok(rsp.is_active)
            }
            Err(e) => {
                TOGGLES.with_label_values(&["failed"]).inc();
                error!(kind = e.kind().as_str(), error = %e, "toggle trading failed");
                self.store.record_error(TOGGLE, &e);
                Err(e)
            }
        }
    }
}
