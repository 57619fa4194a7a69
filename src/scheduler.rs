// ===============================
// src/scheduler.rs (poll loop)
// ===============================
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use crate::fetcher::RemoteApi;
use crate::refresh::RefreshCycle;
use crate::store::{DashboardStore, Generation};

pub const DEFAULT_PERIOD: Duration = Duration::from_millis(3_000);

struct Running {
    generation: Generation,
    ticker: JoinHandle<()>,
}

/// Runs a `RefreshCycle` immediately on start and then once per period.
///
/// Each tick spawns its own cycle, so a slow cycle can still be in flight when
/// the next one begins; whichever write lands last wins. `stop` closes the
/// generation, which makes every still-running cycle's later writes no-ops.
pub struct PollScheduler {
    cycle: RefreshCycle,
    store: Arc<DashboardStore>,
    period: Duration,
    running: Option<Running>,
}

impl PollScheduler {
    pub fn new(api: Arc<dyn RemoteApi>, store: Arc<DashboardStore>, period: Duration) -> Self {
        let period = if period.is_zero() { DEFAULT_PERIOD } else { period };
        Self { cycle: RefreshCycle::new(api, store.clone()), store, period, running: None }
    }

    pub fn period(&self) -> Duration { self.period }

    pub fn is_running(&self) -> bool { self.running.is_some() }

    /// Start polling. Must be called inside a tokio runtime. No-op when already running.
    pub fn start(&mut self) -> Generation {
        if let Some(r) = &self.running {
            return r.generation;
        }
        let generation = self.store.open_generation();
        let cycle = self.cycle.clone();
        let period = self.period;

        let ticker = tokio::spawn(async move {
            let mut tick = interval(period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // tick pertama langsung selesai -> cycle pertama tanpa menunggu period
                tick.tick().await;
                let cycle = cycle.clone();
                tokio::spawn(async move {
                    cycle.run(generation).await;
                });
            }
        });

        info!(gen = generation.value(), period_ms = period.as_millis() as u64, "poll scheduler started");
        self.running = Some(Running { generation, ticker });
        generation
    }

    /// Stop polling. In-flight requests keep running but their results are dropped.
    pub fn stop(&mut self) -> bool {
        let Some(r) = self.running.take() else { return false };
        self.store.close_generation(r.generation);
        r.ticker.abort();
        info!(gen = r.generation.value(), "poll scheduler stopped");
        true
    }
}

impl Drop for PollScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DashboardState, Resource};
    use crate::fake::{sample, ScriptedApi};
    use tokio::time::sleep;

    fn setup(api: ScriptedApi) -> (Arc<ScriptedApi>, Arc<DashboardStore>, PollScheduler) {
        let api = Arc::new(api);
        let store = Arc::new(DashboardStore::new());
        let sched = PollScheduler::new(api.clone(), store.clone(), DEFAULT_PERIOD);
        (api, store, sched)
    }

    #[tokio::test(start_paused = true)]
    async fn first_cycle_runs_without_waiting_a_period() {
        let (api, store, mut sched) = setup(ScriptedApi::healthy());
        let mut view = store.subscribe();
        sched.start();

        sleep(Duration::from_millis(10)).await;
        assert_eq!(api.count("logs"), 1);
        assert!(view.latest().ready);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_every_period() {
        let (api, _store, mut sched) = setup(ScriptedApi::healthy());
        sched.start();

        sleep(Duration::from_millis(6_010)).await;
        assert_eq!(api.count("status"), 3);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn zero_period_falls_back_to_default() {
        let api = Arc::new(ScriptedApi::healthy());
        let sched = PollScheduler::new(api, Arc::new(DashboardStore::new()), Duration::ZERO);
        assert_eq!(sched.period(), DEFAULT_PERIOD);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_older_cycle_overwrites_newer_one() {
        let (api, store, mut sched) = setup(ScriptedApi::healthy());
        // cycle A: status lambat (5s). cycle B (t=3s) dapat jawaban cepat.
        api.push_delayed("status", Duration::from_millis(5_000), Ok(sample(Resource::Status, 1)));
        api.push("status", Ok(sample(Resource::Status, 2)));
        sched.start();

        sleep(Duration::from_millis(3_500)).await;
        let mid = store.snapshot();
        assert_eq!(mid.status.total_trades, 2, "B finished first");

        sleep(Duration::from_millis(2_000)).await;
        let end = store.snapshot();
        assert_eq!(end.status.total_trades, 1, "A landed last and wins");
        assert_eq!(api.count("logs"), 2);
        sched.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_results() {
        let (api, store, mut sched) = setup(ScriptedApi::healthy());
        api.push_delayed("status", Duration::from_millis(2_000), Ok(sample(Resource::Status, 7)));
        sched.start();

        sleep(Duration::from_millis(500)).await;
        assert!(sched.stop());
        assert!(!sched.is_running());

        sleep(Duration::from_millis(10_000)).await;
        assert_eq!(store.snapshot(), DashboardState::default());
        assert_eq!(api.count("status"), 1, "no ticks after stop");
        assert_eq!(api.count("prediction"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_opens_a_fresh_generation() {
        let (api, store, mut sched) = setup(ScriptedApi::healthy());
        let first = sched.start();
        assert_eq!(sched.start(), first, "start while running is a no-op");
        sleep(Duration::from_millis(10)).await;
        sched.stop();
        assert!(!sched.stop());

        api.set("status", sample(Resource::Status, 4));
        let second = sched.start();
        assert!(second > first);
        sleep(Duration::from_millis(10)).await;
        assert_eq!(store.snapshot().status.total_trades, 4);
        sched.stop();
    }
}
