// Background status poller.
// Calls the aggregator on a fixed cadence, publishes each snapshot to WebSocket
// subscribers (broadcast) and to the latest-snapshot slot (watch).

use crate::aggregator::Aggregator;
use crate::models::{Severity, StatusSnapshot};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{broadcast, watch};
use tokio::time::{Duration, Instant, interval};
use tracing::Instrument;

/// Rate limit for "no receivers" message (avoid logging every poll when no one is on /ws/status)
const NO_RECEIVERS_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Aggregator, channels, counters and shutdown for the poller.
pub struct WorkerDeps {
    pub aggregator: Arc<Aggregator>,
    pub tx: broadcast::Sender<StatusSnapshot>,
    pub latest: watch::Sender<Option<StatusSnapshot>>,
    pub ws_status_connections: Arc<AtomicUsize>,
    pub polls_total: Arc<AtomicU64>,
    pub shutdown_rx: tokio::sync::oneshot::Receiver<()>,
}

/// Poller timing and logging config.
pub struct WorkerConfig {
    pub poll_interval_ms: u64,
    /// How often to log app stats (real seconds).
    pub stats_log_interval_secs: u64,
}

pub fn spawn(deps: WorkerDeps, config: WorkerConfig) -> tokio::task::JoinHandle<()> {
    let WorkerDeps {
        aggregator,
        tx,
        latest,
        ws_status_connections,
        polls_total,
        mut shutdown_rx,
    } = deps;
    let WorkerConfig {
        poll_interval_ms,
        stats_log_interval_secs,
    } = config;

    let worker_span = tracing::span!(tracing::Level::DEBUG, "status_poller", poll_interval_ms);

    let poller = async move {
        let mut tick = interval(Duration::from_millis(poll_interval_ms));
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let mut stats_log_tick = interval(Duration::from_secs(stats_log_interval_secs));
        stats_log_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        let mut last_severity: Option<Severity> = None;
        let mut last_no_receivers_log: Option<Instant> = None;
        let mut degraded_polls_total: u64 = 0;

        loop {
            tokio::select! {
                _ = tick.tick() => {
                    let snapshot = aggregator.status().await;
                    polls_total.fetch_add(1, Ordering::Relaxed);

                    let severity = snapshot.overall.severity;
                    if severity != Severity::Healthy {
                        degraded_polls_total += 1;
                    }
                    if last_severity != Some(severity) {
                        tracing::info!(
                            operation = "poll_status",
                            severity = ?severity,
                            previous = ?last_severity,
                            issues = ?snapshot.overall.issues,
                            summary = %snapshot.overall.summary,
                            "overall health changed"
                        );
                        last_severity = Some(severity);
                    }

                    if tx.send(snapshot.clone()).is_err() {
                        let should_log = last_no_receivers_log
                            .is_none_or(|t| t.elapsed() >= NO_RECEIVERS_LOG_INTERVAL);
                        if should_log {
                            tracing::debug!(
                                operation = "broadcast_snapshot",
                                "No active WebSocket clients; broadcast channel has no receivers"
                            );
                            last_no_receivers_log = Some(Instant::now());
                        }
                    }
                    latest.send_replace(Some(snapshot));
                }
                _ = &mut shutdown_rx => {
                    tracing::debug!("Status poller shutting down");
                    break;
                }
                _ = stats_log_tick.tick() => {
                    tracing::info!(
                        ws_status_clients = ws_status_connections.load(Ordering::Relaxed),
                        polls_total = polls_total.load(Ordering::Relaxed),
                        degraded_polls_total,
                        "app stats"
                    );
                }
            }
        }
    };
    tokio::spawn(poller.instrument(worker_span))
}
