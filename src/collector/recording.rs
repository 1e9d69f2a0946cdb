// Recording subsystem: recorder processes and recorded file count

use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};

use super::{Collector, StatusBuilder};
use crate::config::MonitorConfig;
use crate::models::{SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::{FileQuery, Probes};

/// Recorder pids reported in metrics.
const MAX_REPORTED_PIDS: usize = 5;

/// Camera ids look like `CAM_12`, `NYC_0042B`.
static CAMERA_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+_\d+[A-Z]*").expect("camera id pattern"));

/// First camera id in a recorder's command line, or "unknown".
fn camera_id(command: &str) -> &str {
    CAMERA_ID
        .find(command)
        .map(|m| m.as_str())
        .unwrap_or("unknown")
}

pub struct RecordingCollector {
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
}

impl RecordingCollector {
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        Self { probes, config }
    }
}

#[async_trait]
impl Collector for RecordingCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::Recording
    }

    async fn collect(&self) -> SubsystemStatus {
        let cfg = &self.config.recording;
        let timeouts = &self.config.timeouts;
        let recordings = FileQuery::new(&self.config.data_dir, cfg.recordings_glob.as_str())
            .path_contains(cfg.recordings_path_contains.clone());

        let (processes, files) = tokio::join!(
            self.probes
                .process_presence(&cfg.process_pattern, timeouts.process),
            self.probes.file_count(&recordings, timeouts.file_count),
        );

        let mut b = StatusBuilder::new(SubsystemKind::Recording);
        if let Some(files) = b.absorb("file-count", files) {
            b.metric(keys::TOTAL_RECORDINGS, files.count);
        }
        let Some(processes) = b.absorb("process-presence", processes) else {
            return b.finish(SubsystemState::Unknown);
        };

        b.metric(keys::ACTIVE_RECORDINGS, processes.count);
        let pids: Vec<String> = processes
            .pids
            .iter()
            .take(MAX_REPORTED_PIDS)
            .map(u32::to_string)
            .collect();
        b.metric(keys::PIDS, pids.join(","));
        let cameras: Vec<&str> = (0..pids.len())
            .map(|i| processes.commands.get(i).map_or("unknown", |c| camera_id(c)))
            .collect();
        b.metric(keys::CAMERAS, cameras.join(","));
        if let Some(oldest) = processes.ages_secs.iter().max() {
            b.metric(keys::OLDEST_UPTIME_SECS, *oldest);
        }

        let state = if processes.count > 0 {
            SubsystemState::Running
        } else {
            SubsystemState::Stopped
        };
        b.finish(state)
    }
}
