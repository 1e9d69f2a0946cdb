// Subsystem collectors: compose probes into one SubsystemStatus each.
//
// A collector always returns a status. Probe failures are recorded on the
// builder and turn the result into Degraded/Unknown instead of propagating.

mod network;
mod recording;
mod sample_extractor;
mod storage;
mod transfer;

pub use network::NetworkCollector;
pub use recording::RecordingCollector;
pub use sample_extractor::SampleExtractorCollector;
pub use storage::StorageCollector;
pub use transfer::TransferCollector;

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::config::MonitorConfig;
use crate::models::{MetricValue, SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::{ProbeOutcome, Probes, ScheduleFact, next_cron_run};

#[async_trait]
pub trait Collector: Send + Sync {
    fn kind(&self) -> SubsystemKind;

    /// Never fails and never outlives the collector's own probe budgets.
    async fn collect(&self) -> SubsystemStatus;
}

/// The five production collectors, in `SubsystemKind::ALL` order.
pub fn standard_collectors(
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
) -> Vec<Arc<dyn Collector>> {
    vec![
        Arc::new(RecordingCollector::new(probes.clone(), config.clone())),
        Arc::new(TransferCollector::new(probes.clone(), config.clone())),
        Arc::new(SampleExtractorCollector::new(probes.clone(), config.clone())),
        Arc::new(StorageCollector::new(probes.clone(), config.clone())),
        Arc::new(NetworkCollector::new(probes, config)),
    ]
}

/// Accumulates metrics and probe failures for one collection.
pub(crate) struct StatusBuilder {
    kind: SubsystemKind,
    metrics: BTreeMap<String, MetricValue>,
    problems: Vec<String>,
}

impl StatusBuilder {
    pub(crate) fn new(kind: SubsystemKind) -> Self {
        Self {
            kind,
            metrics: BTreeMap::new(),
            problems: Vec::new(),
        }
    }

    pub(crate) fn metric(&mut self, key: &str, value: impl Into<MetricValue>) -> &mut Self {
        self.metrics.insert(key.to_string(), value.into());
        self
    }

    /// Unwraps a probe fact, or records which probe failed and returns `None`.
    pub(crate) fn absorb<T>(&mut self, probe: &str, outcome: ProbeOutcome<T>) -> Option<T> {
        match outcome {
            ProbeOutcome::Fact(v) => Some(v),
            other => {
                tracing::debug!(
                    subsystem = %self.kind,
                    probe,
                    outcome = %other,
                    "probe did not produce a fact"
                );
                self.problems.push(format!("{} probe {}", probe, other));
                None
            }
        }
    }

    /// Records a condition that degrades the subsystem even though every probe answered.
    pub(crate) fn problem(&mut self, reason: impl Into<String>) -> &mut Self {
        self.problems.push(reason.into());
        self
    }

    pub(crate) fn schedule_metrics(&mut self, schedule: &ScheduleFact) {
        self.metric(keys::CRON_CONFIGURED, schedule.configured);
        if let Some(expr) = &schedule.schedule {
            self.metric(keys::CRON_SCHEDULE, expr.as_str());
            if let Some(next) = next_cron_run(expr, Utc::now()) {
                self.metric(keys::CRON_NEXT_RUN, next.to_rfc3339());
            }
        }
    }

    /// Finalizes with `state`, downgrading to `Degraded` if any problem was recorded.
    pub(crate) fn finish(self, state: SubsystemState) -> SubsystemStatus {
        let state = if !self.problems.is_empty() && !state.is_impaired() {
            SubsystemState::Degraded
        } else {
            state
        };
        let message = state.is_impaired().then(|| {
            if self.problems.is_empty() {
                "state could not be determined".to_string()
            } else {
                self.problems.join("; ")
            }
        });
        SubsystemStatus {
            kind: self.kind,
            state,
            metrics: self.metrics,
            message,
            collected_at: Utc::now(),
        }
    }
}
