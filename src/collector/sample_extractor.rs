// Sample extractor: sampler process, its cron job, sample/recording counts

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use super::{Collector, StatusBuilder};
use crate::config::MonitorConfig;
use crate::models::{SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::{FileQuery, Probes};

pub struct SampleExtractorCollector {
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
}

impl SampleExtractorCollector {
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        Self { probes, config }
    }
}

/// Samples per recording, two decimals; "0" without recordings.
pub(crate) fn sample_ratio(samples: u64, recordings: u64) -> String {
    if recordings == 0 {
        return "0".into();
    }
    format!("{:.2}", samples as f64 / recordings as f64)
}

#[async_trait]
impl Collector for SampleExtractorCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::SampleExtractor
    }

    async fn collect(&self) -> SubsystemStatus {
        let cfg = &self.config.sample_extractor;
        let timeouts = &self.config.timeouts;
        let data_dir = &self.config.data_dir;

        let samples = FileQuery::new(data_dir, cfg.sample_glob.as_str());
        let recent = samples
            .clone()
            .newer_than(Duration::from_secs(cfg.recent_window_secs));
        let recordings = FileQuery::new(data_dir, self.config.recording.recordings_glob.as_str())
            .path_contains(self.config.recording.recordings_path_contains.clone());

        let (service, schedule, sample_count, recent_count, recording_count) = tokio::join!(
            self.probes
                .process_presence(&cfg.process_pattern, timeouts.process),
            self.probes.schedule_listing(&cfg.cron_job, timeouts.schedule),
            self.probes.file_count(&samples, timeouts.file_count),
            self.probes.file_count(&recent, timeouts.file_count),
            self.probes.file_count(&recordings, timeouts.file_count),
        );

        let mut b = StatusBuilder::new(SubsystemKind::SampleExtractor);

        if let Some(schedule) = b.absorb("schedule-listing", schedule) {
            b.schedule_metrics(&schedule);
        }
        let sample_count = b.absorb("sample-count", sample_count);
        let recording_count = b.absorb("recording-count", recording_count);
        if let Some(s) = sample_count {
            b.metric(keys::SAMPLE_COUNT, s.count);
        }
        if let Some(r) = recording_count {
            b.metric(keys::RECORDING_COUNT, r.count);
        }
        if let (Some(s), Some(r)) = (sample_count, recording_count) {
            b.metric(keys::SAMPLE_RATIO, sample_ratio(s.count, r.count));
        }
        if let Some(recent) = b.absorb("recent-samples", recent_count) {
            b.metric(keys::RECENT_SAMPLES, recent.count);
        }

        let Some(service) = b.absorb("process-presence", service) else {
            return b.finish(SubsystemState::Unknown);
        };
        b.metric(keys::SERVICE_RUNNING, service.count > 0);
        if let Some(pid) = service.pids.first() {
            b.metric(keys::SERVICE_PID, *pid);
        }

        // Between cron runs the sampler is simply idle, not stopped.
        let state = if service.count > 0 {
            SubsystemState::Running
        } else {
            SubsystemState::Idle
        };
        b.finish(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_formats_two_decimals() {
        assert_eq!(sample_ratio(10, 4), "2.50");
        assert_eq!(sample_ratio(1, 3), "0.33");
        assert_eq!(sample_ratio(5, 0), "0");
    }
}
