// ===============================
// src/refresh.rs
// ===============================
//
// Satu cycle = 7 resource, urutan tetap (Resource::ALL).
// - Tiap slice langsung di-apply begitu datang (tidak di-batch).
// - Gagal di posisi k -> cycle berhenti; slice < k tetap ter-apply (tanpa rollback).
// - `ready` di-latch di akhir cycle, sukses maupun gagal.
//

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use crate::domain::{Resource, Slice};
use crate::error::FetchError;
use crate::fetcher::RemoteApi;
use crate::metrics::{CYCLES, CYCLE_MS, FETCHES};
use crate::store::{DashboardStore, Generation};

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// All seven slices applied.
    Complete,
    /// A fetch failed; nothing at or after `at` was fetched or applied.
    Aborted { at: Resource, error: FetchError },
    /// The generation was closed while the cycle was in flight.
    Discarded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub generation: Generation,
    pub applied: Vec<Resource>,
    pub outcome: CycleOutcome,
}

#[derive(Clone)]
pub struct RefreshCycle {
    api: Arc<dyn RemoteApi>,
    store: Arc<DashboardStore>,
}

impl RefreshCycle {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<DashboardStore>) -> Self {
        Self { api, store }
    }

    async fn step(&self, resource: Resource) -> Result<Slice, FetchError> {
        let body = self.api.fetch(resource.path()).await?;
        resource.decode(body)
    }

    pub async fn run(&self, generation: Generation) -> CycleReport {
        let started = Instant::now();
        let mut applied = Vec::with_capacity(Resource::ALL.len());
        let mut outcome = CycleOutcome::Complete;

        for resource in Resource::ALL {
            match self.step(resource).await {
                Ok(slice) => {
                    if !self.store.apply(generation, slice) {
                        FETCHES.with_label_values(&[resource.path(), "discarded"]).inc();
                        outcome = CycleOutcome::Discarded;
                        break;
                    }
                    FETCHES.with_label_values(&[resource.path(), "ok"]).inc();
                    debug!(%resource, gen = generation.value(), "slice applied");
                    applied.push(resource);
                }
                Err(error) => {
                    FETCHES.with_label_values(&[resource.path(), error.kind().as_str()]).inc();
                    warn!(
                        %resource,
                        kind = error.kind().as_str(),
                        %error,
                        skipped = Resource::ALL.len() - resource.position() - 1,
                        "refresh cycle aborted"
                    );
                    self.store.record_error(resource.path(), &error);
                    outcome = CycleOutcome::Aborted { at: resource, error };
                    break;
                }
            }
        }

        // latch ready, apapun hasilnya (selama generation masih hidup)
        if !self.store.mark_ready(generation) && !self.store.is_live(generation) {
            outcome = CycleOutcome::Discarded;
        }

        let label = match outcome {
            CycleOutcome::Complete => "complete",
            CycleOutcome::Aborted { .. } => "aborted",
            CycleOutcome::Discarded => "discarded",
        };
        CYCLES.with_label_values(&[label]).inc();
        CYCLE_MS.observe(started.elapsed().as_secs_f64() * 1_000.0);
        debug!(outcome = label, applied = applied.len(), gen = generation.value(), "refresh cycle done");

        CycleReport { generation, applied, outcome }
    }
}
