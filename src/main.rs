// ===============================
// src/main.rs
// ===============================
/*
 # jalankan poller (default: watch)
 API_BASE=http://localhost:5000/api/trading cargo run --release

 # toggle trading sekali, lalu keluar
 cargo run --release -- toggle

 # status refresh & toggle
 curl -s localhost:9899/metrics | egrep '^(refresh_cycles_total|toggle_commands_total|dashboard_ready)'
*/
/*
=============================================================================
Project : trading_dash_sync — cached, polled view of a remote trading service
Module  : main.rs
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
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::{select, time::interval};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use trading_dash_sync::config::{self, Args, ConfigError};
use trading_dash_sync::{
    metrics, CommandDispatcher, CycleOutcome, DashboardState, DashboardStore, HttpFetcher,
    PollScheduler, RefreshCycle, RemoteApi,
};

#[derive(Parser, Debug)]
#[command(name = "trading-dash-sync", version, about = "Polled dashboard view of a trading control service")]
struct Cli {
    /// Override API_BASE
    #[arg(long)]
    api_base: Option<String>,

    /// Override POLL_INTERVAL_MS
    #[arg(long)]
    interval_ms: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, Default)]
enum Command {
    /// Poll forever and log a dashboard heartbeat (default)
    #[default]
    Watch,
    /// Send one start/stop toggle and print the confirmed state
    Toggle,
    /// Run a single refresh cycle and print the snapshot as JSON
    Snapshot,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ---- Config (baca .env dulu supaya LOG_FILTER ikut) ----
    let loaded = config::load();
    let filter = loaded.as_ref().map(|a| a.log_filter.clone()).unwrap_or_else(|_| "info".to_string());

    // ---- Logging ----
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let args = match loaded.and_then(|a| apply_overrides(a, &cli)) {
        Ok(a) => a,
        Err(e) => {
            error!(%e, "invalid configuration");
            std::process::exit(2);
        }
    };

    let store = Arc::new(DashboardStore::new());
    let api: Arc<dyn RemoteApi> = Arc::new(HttpFetcher::new(&args.api_base));

    match cli.command.unwrap_or_default() {
        Command::Watch => watch(args, api, store).await,
        Command::Toggle => {
            let dispatcher = CommandDispatcher::new(api, store);
            match dispatcher.toggle_trading().await {
                Ok(active) => println!("{}", serde_json::json!({ "is_active": active })),
                Err(_) => std::process::exit(1),
            }
        }
        Command::Snapshot => {
            let report = RefreshCycle::new(api, store.clone()).run(store.current_generation()).await;
            if let CycleOutcome::Aborted { at, .. } = &report.outcome {
                warn!(%at, applied = report.applied.len(), "snapshot is partial");
            }
            match serde_json::to_string_pretty(&store.snapshot()) {
                Ok(s) => println!("{s}"),
                Err(e) => error!(?e, "snapshot serialize failed"),
            }
        }
    }
}

fn apply_overrides(mut args: Args, cli: &Cli) -> Result<Args, ConfigError> {
    if let Some(base) = &cli.api_base {
        args.api_base = config::parse_api_base(base)?;
    }
    if let Some(ms) = cli.interval_ms.filter(|ms| *ms > 0) {
        args.poll_interval = Duration::from_millis(ms);
    }
    Ok(args)
}

async fn watch(args: Args, api: Arc<dyn RemoteApi>, store: Arc<DashboardStore>) {
    info!(
        api_base = %args.api_base,
        period_ms = args.poll_interval.as_millis() as u64,
        metrics_port = args.metrics_port,
        "startup config"
    );

    // ---- Metrics ----
    metrics::init();
    if args.metrics_port != 0 {
        tokio::spawn(metrics::serve_metrics(args.metrics_port));
    }

    // ---- Poller ----
    let mut view = store.subscribe();
    let mut scheduler = PollScheduler::new(api, store.clone(), args.poll_interval);
    scheduler.start();

    // ---- Ringkasan tiap snapshot berubah + heartbeat error terakhir ----
    let mut beat = interval(args.poll_interval);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        select! {
            alive = view.changed() => {
                if !alive {
                    break;
                }
                log_summary(&view.latest());
            }
            _ = beat.tick() => {
                if let Some(e) = store.last_error() {
                    tracing::debug!(source = %e.source, kind = ?e.kind, at = %e.at, "last error: {}", e.message);
                }
            }
            _ = &mut shutdown => {
                info!("ctrl-c received, stopping");
                break;
            }
        }
    }

    scheduler.stop();
}

fn log_summary(s: &DashboardState) {
    info!(
        ready = s.ready,
        active = s.status.is_active,
        price = s.status.current_price,
        balance = s.status.balance,
        total_trades = s.status.total_trades,
        win_rate = s.status.win_rate,
        direction = ?s.prediction.direction,
        confidence = s.prediction.confidence,
        prices = s.prices.len(),
        recent_trades = s.trades.len(),
        logs = s.logs.len(),
        total_return = s.analytics.total_return,
        "dashboard"
    );
}
