// ===============================
// src/lib.rs
// ===============================
pub mod config;
pub mod dispatcher;
pub mod domain;
pub mod error;
pub mod fetcher;
pub mod metrics;
pub mod refresh;
pub mod scheduler;
pub mod store;

#[cfg(test)]
mod fake;

pub use dispatcher::CommandDispatcher;
pub use domain::{DashboardState, Resource, Slice};
pub use error::{FetchError, FetchErrorKind};
pub use fetcher::{HttpFetcher, RemoteApi};
pub use refresh::{CycleOutcome, CycleReport, RefreshCycle};
pub use scheduler::PollScheduler;
pub use store::{DashboardStore, DashboardView, Generation, LastError};
