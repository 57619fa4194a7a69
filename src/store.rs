// ===============================
// src/store.rs (dashboard snapshot holder)
// ===============================
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use tracing::debug;

use crate::domain::{DashboardState, Slice, SystemStatus};
use crate::error::{FetchError, FetchErrorKind};
use crate::metrics::{READY, STALE_WRITES};

/// Identifies one scheduler lifetime. Writes tagged with a stopped lifetime are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    pub fn value(self) -> u64 { self.0 }
}

/// Most recent failure seen by a cycle or command. Diagnostics only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastError {
    pub source: String,
    pub kind: FetchErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug)]
struct Gate {
    current: u64,
    // semua generation <= closed_up_to sudah di-stop
    closed_up_to: u64,
}

impl Default for Gate {
    // generation 0 tidak pernah dipakai, supaya closed_up_to = 0 berarti "belum ada stop"
    fn default() -> Self { Self { current: 1, closed_up_to: 0 } }
}

impl Gate {
    fn is_live(&self, generation: Generation) -> bool {
        generation.0 > self.closed_up_to
    }
}

/// The single mutable holder of `DashboardState`.
///
/// Every write goes through the generation gate: the gate lock is held while
/// the snapshot is replaced, so once a generation is closed no write tagged
/// with it (or anything older) can land afterwards. Opening a generation does
/// not invalidate older, never-stopped work.
pub struct DashboardStore {
    tx: watch::Sender<DashboardState>,
    gate: Mutex<Gate>,
    last_error: Mutex<Option<LastError>>,
}

impl Default for DashboardStore {
    fn default() -> Self { Self::new() }
}

impl DashboardStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(DashboardState::default());
        Self { tx, gate: Mutex::new(Gate::default()), last_error: Mutex::new(None) }
    }

    pub fn current_generation(&self) -> Generation {
        Generation(self.gate.lock().unwrap_or_else(PoisonError::into_inner).current)
    }

    /// Start a new lifetime.
    pub fn open_generation(&self) -> Generation {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        g.current += 1;
        Generation(g.current)
    }

    /// Stop `generation` and everything tagged before it. Returns `false`
    /// unless `generation` is the current one.
    pub fn close_generation(&self, generation: Generation) -> bool {
        let mut g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if g.current != generation.0 {
            return false;
        }
        g.closed_up_to = generation.0;
        // call setelah stop dapat generation baru yang masih hidup
        g.current += 1;
        true
    }

    /// Whether writes tagged with `generation` are still accepted.
    pub fn is_live(&self, generation: Generation) -> bool {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner).is_live(generation)
    }

    fn write_if_live<F>(&self, generation: Generation, what: &str, f: F) -> bool
    where
        F: FnOnce(&mut DashboardState) -> bool,
    {
        let g = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if !g.is_live(generation) {
            STALE_WRITES.inc();
            debug!(what, stale = generation.0, closed_up_to = g.closed_up_to, "discarding stale write");
            return false;
        }
        self.tx.send_if_modified(f);
        true
    }

    /// Replace one slice. Returns `false` when the write was discarded.
    pub fn apply(&self, generation: Generation, slice: Slice) -> bool {
        let resource = slice.resource();
        self.write_if_live(generation, resource.path(), move |s| {
            s.apply(slice);
            true
        })
    }

    /// Replace the status slice with the confirmed `is_active` flag.
    pub fn set_active(&self, generation: Generation, is_active: bool) -> bool {
        self.write_if_live(generation, "toggle", move |s| {
            s.status = SystemStatus { is_active, ..s.status.clone() };
            true
        })
    }

    /// Latch `ready`; it never goes back to false.
    pub fn mark_ready(&self, generation: Generation) -> bool {
        self.write_if_live(generation, "ready", |s| {
            if s.ready {
                return false;
            }
            s.ready = true;
            READY.set(1);
            true
        })
    }

    pub fn record_error(&self, source: &str, err: &FetchError) {
        let entry = LastError {
            source: source.to_string(),
            kind: err.kind(),
            message: err.to_string(),
            at: Utc::now(),
        };
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    pub fn last_error(&self) -> Option<LastError> {
        self.last_error.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn snapshot(&self) -> DashboardState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> DashboardView {
        DashboardView { rx: self.tx.subscribe() }
    }
}

/// Read-only handle given to the rendering side.
#[derive(Debug, Clone)]
pub struct DashboardView {
    rx: watch::Receiver<DashboardState>,
}

impl DashboardView {
    pub fn snapshot(&self) -> DashboardState {
        self.rx.borrow().clone()
    }

    /// Snapshot and mark it as seen.
    pub fn latest(&mut self) -> DashboardState {
        self.rx.borrow_and_update().clone()
    }

    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(false)
    }

    /// Wait for the next write. `false` once the store is gone.
    pub async fn changed(&mut self) -> bool {
        self.rx.changed().await.is_ok()
    }
}
