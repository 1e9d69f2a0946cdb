// Subsystem identity, state and the status value each collector produces

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Metric keys shared between collectors and the health evaluator.
pub mod keys {
    pub const ACTIVE_RECORDINGS: &str = "activeRecordings";
    pub const TOTAL_RECORDINGS: &str = "totalRecordings";
    pub const PIDS: &str = "pids";
    pub const OLDEST_UPTIME_SECS: &str = "oldestUptimeSecs";
    /// Camera id per reported pid, same order as `pids`.
    pub const CAMERAS: &str = "cameras";

    pub const SERVICE_RUNNING: &str = "serviceRunning";
    pub const SERVICE_PID: &str = "servicePid";
    pub const SERVICE_UPTIME_SECS: &str = "serviceUptimeSecs";
    pub const CRON_CONFIGURED: &str = "cronConfigured";
    pub const CRON_SCHEDULE: &str = "cronSchedule";
    pub const CRON_NEXT_RUN: &str = "cronNextRun";
    pub const MOUNTED_COUNT: &str = "mountedCount";
    pub const TOTAL_MOUNTS: &str = "totalMounts";
    pub const ACTIVE_TRANSFERS: &str = "activeTransfers";
    pub const TRANSFERRING: &str = "transferring";
    pub const QUEUE_DEPTH: &str = "queueDepth";

    pub const SAMPLE_COUNT: &str = "sampleCount";
    pub const RECENT_SAMPLES: &str = "recentSamples";
    pub const RECORDING_COUNT: &str = "recordingCount";
    pub const SAMPLE_RATIO: &str = "sampleRatio";

    pub const DISK_USAGE_PERCENT: &str = "diskUsagePercent";
    pub const AVAILABLE_BYTES: &str = "availableBytes";
    pub const REMOTE_FILES: &str = "remoteFiles";
    /// Bytes in regular files under the data dir.
    pub const TOTAL_SIZE: &str = "totalSize";
    /// Per-drive prefixes, suffixed with `.<mount name>`.
    pub const REMOTE_FILES_PREFIX: &str = "remoteFiles.";
    pub const ACCESSIBLE_PREFIX: &str = "accessible.";
    pub const DRIVE_KIND_PREFIX: &str = "driveKind.";

    pub const REACHABLE: &str = "reachable";
    pub const HOST: &str = "host";
    pub const INTERFACE: &str = "interface";
}

/// The fixed set of subsystems every snapshot reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SubsystemKind {
    Recording,
    TransferService,
    SampleExtractor,
    Storage,
    Network,
}

impl SubsystemKind {
    pub const ALL: [SubsystemKind; 5] = [
        SubsystemKind::Recording,
        SubsystemKind::TransferService,
        SubsystemKind::SampleExtractor,
        SubsystemKind::Storage,
        SubsystemKind::Network,
    ];

    /// JSON key under `systems`.
    pub fn as_str(self) -> &'static str {
        match self {
            SubsystemKind::Recording => "recording",
            SubsystemKind::TransferService => "transferService",
            SubsystemKind::SampleExtractor => "sampleExtractor",
            SubsystemKind::Storage => "storage",
            SubsystemKind::Network => "network",
        }
    }
}

impl fmt::Display for SubsystemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subsystem state; serializes to lowercase JSON (e.g. "running").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemState {
    Running,
    Stopped,
    Idle,
    Degraded,
    #[serde(other)]
    Unknown,
}

impl SubsystemState {
    /// True when the real state could not be determined (probe or collector trouble).
    pub fn is_impaired(self) -> bool {
        matches!(self, SubsystemState::Degraded | SubsystemState::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl From<bool> for MetricValue {
    fn from(v: bool) -> Self {
        MetricValue::Bool(v)
    }
}

impl From<i64> for MetricValue {
    fn from(v: i64) -> Self {
        MetricValue::Int(v)
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<usize> for MetricValue {
    fn from(v: usize) -> Self {
        MetricValue::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<i32> for MetricValue {
    fn from(v: i32) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

impl From<u32> for MetricValue {
    fn from(v: u32) -> Self {
        MetricValue::Int(i64::from(v))
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Float(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<&str> for MetricValue {
    fn from(v: &str) -> Self {
        MetricValue::Text(v.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubsystemStatus {
    pub kind: SubsystemKind,
    pub state: SubsystemState,
    #[serde(default)]
    pub metrics: BTreeMap<String, MetricValue>,
    /// Only set for `Degraded` and `Unknown`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub collected_at: DateTime<Utc>,
}

impl SubsystemStatus {
    pub fn new(kind: SubsystemKind, state: SubsystemState) -> Self {
        Self {
            kind,
            state,
            metrics: BTreeMap::new(),
            message: None,
            collected_at: Utc::now(),
        }
    }

    pub fn unknown(kind: SubsystemKind, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(kind, SubsystemState::Unknown)
        }
    }

    pub fn degraded(kind: SubsystemKind, message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::new(kind, SubsystemState::Degraded)
        }
    }

    /// Placeholder for a collector that missed the global deadline.
    pub fn timed_out(kind: SubsystemKind) -> Self {
        Self::unknown(kind, "timed out")
    }

    pub fn metric(&self, key: &str) -> Option<&MetricValue> {
        self.metrics.get(key)
    }

    pub fn metric_i64(&self, key: &str) -> Option<i64> {
        match self.metrics.get(key)? {
            MetricValue::Int(v) => Some(*v),
            MetricValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn metric_f64(&self, key: &str) -> Option<f64> {
        match self.metrics.get(key)? {
            MetricValue::Int(v) => Some(*v as f64),
            MetricValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn metric_bool(&self, key: &str) -> Option<bool> {
        match self.metrics.get(key)? {
            MetricValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}
