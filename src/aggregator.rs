// Unified status: fan out to every collector, race the fan-in against one deadline.
//
// Collectors still running at the deadline are abandoned (their tasks are
// aborted on drop of the JoinSet) and reported as Unknown "timed out".

use chrono::Utc;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::instrument;

use crate::collector::{Collector, standard_collectors};
use crate::config::MonitorConfig;
use crate::health::{self, HealthThresholds};
use crate::models::{StatusSnapshot, SubsystemKind, SubsystemStatus, Systems};
use crate::probe::Probes;

pub struct Aggregator {
    collectors: Vec<Arc<dyn Collector>>,
    thresholds: HealthThresholds,
    deadline: Duration,
}

impl Aggregator {
    /// Production wiring: the five standard collectors over `probes`.
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        let thresholds = config.thresholds();
        let deadline = config.deadline;
        Self {
            collectors: standard_collectors(probes, config),
            thresholds,
            deadline,
        }
    }

    /// Custom collector set. Kinds without a collector are reported as Unknown.
    pub fn with_collectors(
        collectors: Vec<Arc<dyn Collector>>,
        thresholds: HealthThresholds,
        deadline: Duration,
    ) -> Self {
        Self {
            collectors,
            thresholds,
            deadline,
        }
    }

    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Unified status within the configured deadline.
    pub async fn status(&self) -> StatusSnapshot {
        self.get_unified_status(self.deadline).await
    }

    /// Always returns a complete snapshot, within `deadline` plus scheduling slack.
    #[instrument(skip(self, deadline), fields(deadline_ms = deadline.as_millis() as u64))]
    pub async fn get_unified_status(&self, deadline: Duration) -> StatusSnapshot {
        let until = Instant::now() + deadline;

        let mut tasks = JoinSet::new();
        for collector in &self.collectors {
            let collector = collector.clone();
            tasks.spawn(async move {
                let kind = collector.kind();
                let status = AssertUnwindSafe(collector.collect())
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|_| {
                        tracing::error!(subsystem = %kind, "collector panicked");
                        SubsystemStatus::degraded(kind, "collector panicked")
                    });
                (kind, status)
            });
        }

        let mut finished: HashMap<SubsystemKind, SubsystemStatus> = HashMap::new();
        let mut timed_out = false;
        loop {
            match tokio::time::timeout_at(until, tasks.join_next()).await {
                Ok(Some(Ok((kind, status)))) => {
                    finished.entry(kind).or_insert(status);
                }
                Ok(Some(Err(e))) => {
                    tracing::warn!(error = %e, "collector task failed");
                }
                Ok(None) => break,
                Err(_) => {
                    timed_out = true;
                    break;
                }
            }
        }
        // Dropping the set aborts whatever is still running; late results are discarded.
        drop(tasks);

        let pending: Vec<SubsystemKind> = SubsystemKind::ALL
            .into_iter()
            .filter(|k| !finished.contains_key(k))
            .collect();
        let systems = Systems::from_fn(|kind| {
            finished.remove(&kind).unwrap_or_else(|| {
                if timed_out {
                    SubsystemStatus::timed_out(kind)
                } else {
                    SubsystemStatus::unknown(kind, "no collector reported")
                }
            })
        });

        let mut overall = health::evaluate(&systems, &self.thresholds);
        if timed_out && !pending.is_empty() {
            tracing::warn!(
                pending = ?pending,
                deadline_ms = deadline.as_millis() as u64,
                "status check deadline elapsed"
            );
            overall = health::mark_timed_out(overall, &pending);
        }

        StatusSnapshot {
            timestamp: Utc::now(),
            overall,
            systems,
        }
    }
}
