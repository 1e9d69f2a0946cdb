use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::health::HealthThresholds;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub monitoring: MonitoringConfig,
    #[serde(default)]
    pub probes: ProbesConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub recording: RecordingConfig,
    #[serde(default)]
    pub transfer: TransferConfig,
    #[serde(default)]
    pub sample_extractor: SampleExtractorConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonitoringConfig {
    /// Global budget for one unified status call.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    /// How often the background poller refreshes the latest snapshot.
    pub poll_interval_ms: u64,
    /// Max number of snapshots kept in the broadcast channel for /ws/status (slow clients may lag).
    pub broadcast_capacity: usize,
    /// How often to log app stats (ws_status clients, polls, timeouts) at INFO level.
    pub stats_log_interval_secs: u64,
}

fn default_deadline_ms() -> u64 {
    10_000
}

/// Per-call probe budgets. Filesystem scans get the longest budget.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbesConfig {
    pub process_timeout_ms: u64,
    pub mount_timeout_ms: u64,
    pub disk_timeout_ms: u64,
    pub reachability_timeout_ms: u64,
    pub schedule_timeout_ms: u64,
    pub file_count_timeout_ms: u64,
}

impl Default for ProbesConfig {
    fn default() -> Self {
        Self {
            process_timeout_ms: 2_000,
            mount_timeout_ms: 1_000,
            disk_timeout_ms: 2_000,
            reachability_timeout_ms: 2_000,
            schedule_timeout_ms: 1_000,
            file_count_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root of recordings and samples (e.g. ~/.traffic-provenance/data).
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordingConfig {
    /// Regex matched against the full command line of each process.
    pub process_pattern: String,
    pub recordings_glob: String,
    pub recordings_path_contains: Option<String>,
}

impl Default for RecordingConfig {
    fn default() -> Self {
        Self {
            process_pattern: "ffmpeg.*-i.*-f segment".into(),
            recordings_glob: "*.mp4".into(),
            recordings_path_contains: Some("/recordings/".into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MountConfig {
    pub path: PathBuf,
    pub name: String,
    #[serde(default = "default_mount_kind")]
    pub kind: String,
}

fn default_mount_kind() -> String {
    "overflow".into()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    pub service_pattern: String,
    pub cron_job: String,
    /// Pattern for individual copy processes (each one counts as an active transfer).
    pub transfer_pattern: String,
    /// Fewer mounted remote drives than this marks the transfer service degraded.
    /// Unset means every configured mount is required.
    pub min_mounted: Option<usize>,
    pub mounts: Vec<MountConfig>,
}

impl TransferConfig {
    pub fn required_mounts(&self) -> usize {
        self.min_mounted.unwrap_or(self.mounts.len())
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            service_pattern: "nas-transfer".into(),
            cron_job: "nas-watchdog".into(),
            transfer_pattern: "rsync".into(),
            min_mounted: None,
            mounts: vec![
                MountConfig {
                    path: "/mnt/qnap".into(),
                    name: "18TB Primary".into(),
                    kind: "primary".into(),
                },
                MountConfig {
                    path: "/mnt/qnap-26tb".into(),
                    name: "26TB Overflow #1".into(),
                    kind: "overflow".into(),
                },
                MountConfig {
                    path: "/mnt/qnap-26tb-2".into(),
                    name: "26TB Overflow #2".into(),
                    kind: "overflow".into(),
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SampleExtractorConfig {
    pub process_pattern: String,
    pub cron_job: String,
    pub sample_glob: String,
    pub recent_window_secs: u64,
}

impl Default for SampleExtractorConfig {
    fn default() -> Self {
        Self {
            process_pattern: "simple_sampler".into(),
            cron_job: "sample_extractor".into(),
            sample_glob: "*_sample_*.mp4".into(),
            recent_window_secs: 3_600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub warning_percent: f64,
    pub critical_percent: f64,
    /// Count recordings on each mounted remote drive (slow on large shares).
    pub count_remote_files: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            warning_percent: 75.0,
            critical_percent: 90.0,
            count_remote_files: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Host pinged to decide whether remote storage is reachable.
    pub host: String,
    pub interface: Option<String>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "192.168.100.2".into(),
            interface: None,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Immutable view of everything the collectors and aggregator need.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig {
            deadline: Duration::from_millis(self.monitoring.deadline_ms),
            timeouts: ProbeTimeouts::from(&self.probes),
            data_dir: self.paths.data_dir.clone(),
            recording: self.recording.clone(),
            transfer: self.transfer.clone(),
            sample_extractor: self.sample_extractor.clone(),
            storage: self.storage.clone(),
            network: self.network.clone(),
        }
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            self.monitoring.deadline_ms > 0,
            "monitoring.deadline_ms must be > 0, got {}",
            self.monitoring.deadline_ms
        );
        anyhow::ensure!(
            self.monitoring.poll_interval_ms > 0,
            "monitoring.poll_interval_ms must be > 0, got {}",
            self.monitoring.poll_interval_ms
        );
        anyhow::ensure!(
            self.monitoring.broadcast_capacity > 0,
            "monitoring.broadcast_capacity must be > 0, got {}",
            self.monitoring.broadcast_capacity
        );
        anyhow::ensure!(
            self.monitoring.stats_log_interval_secs > 0,
            "monitoring.stats_log_interval_secs must be > 0, got {}",
            self.monitoring.stats_log_interval_secs
        );
        for (name, value) in [
            ("process_timeout_ms", self.probes.process_timeout_ms),
            ("mount_timeout_ms", self.probes.mount_timeout_ms),
            ("disk_timeout_ms", self.probes.disk_timeout_ms),
            ("reachability_timeout_ms", self.probes.reachability_timeout_ms),
            ("schedule_timeout_ms", self.probes.schedule_timeout_ms),
            ("file_count_timeout_ms", self.probes.file_count_timeout_ms),
        ] {
            anyhow::ensure!(value > 0, "probes.{} must be > 0, got {}", name, value);
        }
        // ping waits whole seconds; anything shorter cannot tell unreachable from timed out.
        anyhow::ensure!(
            self.probes.reachability_timeout_ms > 1_000,
            "probes.reachability_timeout_ms must be > 1000, got {}",
            self.probes.reachability_timeout_ms
        );
        anyhow::ensure!(
            !self.paths.data_dir.as_os_str().is_empty(),
            "paths.data_dir must be non-empty"
        );
        anyhow::ensure!(
            !self.recording.process_pattern.is_empty(),
            "recording.process_pattern must be non-empty"
        );
        anyhow::ensure!(
            regex::Regex::new(&self.recording.process_pattern).is_ok(),
            "recording.process_pattern is not a valid regex: {}",
            self.recording.process_pattern
        );
        anyhow::ensure!(
            !self.transfer.service_pattern.is_empty(),
            "transfer.service_pattern must be non-empty"
        );
        anyhow::ensure!(
            self.transfer.required_mounts() <= self.transfer.mounts.len(),
            "transfer.min_mounted must be <= number of mounts ({}), got {}",
            self.transfer.mounts.len(),
            self.transfer.required_mounts()
        );
        anyhow::ensure!(
            !self.sample_extractor.process_pattern.is_empty(),
            "sample_extractor.process_pattern must be non-empty"
        );
        anyhow::ensure!(
            self.sample_extractor.recent_window_secs > 0,
            "sample_extractor.recent_window_secs must be > 0, got {}",
            self.sample_extractor.recent_window_secs
        );
        anyhow::ensure!(
            self.storage.warning_percent > 0.0
                && self.storage.warning_percent < self.storage.critical_percent
                && self.storage.critical_percent <= 100.0,
            "storage thresholds must satisfy 0 < warning_percent < critical_percent <= 100, got {} / {}",
            self.storage.warning_percent,
            self.storage.critical_percent
        );
        anyhow::ensure!(!self.network.host.is_empty(), "network.host must be non-empty");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeTimeouts {
    pub process: Duration,
    pub mount: Duration,
    pub disk: Duration,
    pub reachability: Duration,
    pub schedule: Duration,
    pub file_count: Duration,
}

impl From<&ProbesConfig> for ProbeTimeouts {
    fn from(p: &ProbesConfig) -> Self {
        Self {
            process: Duration::from_millis(p.process_timeout_ms),
            mount: Duration::from_millis(p.mount_timeout_ms),
            disk: Duration::from_millis(p.disk_timeout_ms),
            reachability: Duration::from_millis(p.reachability_timeout_ms),
            schedule: Duration::from_millis(p.schedule_timeout_ms),
            file_count: Duration::from_millis(p.file_count_timeout_ms),
        }
    }
}

impl Default for ProbeTimeouts {
    fn default() -> Self {
        Self::from(&ProbesConfig::default())
    }
}

/// Configuration handed to the status core at construction; never re-read from the environment.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub deadline: Duration,
    pub timeouts: ProbeTimeouts,
    pub data_dir: PathBuf,
    pub recording: RecordingConfig,
    pub transfer: TransferConfig,
    pub sample_extractor: SampleExtractorConfig,
    pub storage: StorageConfig,
    pub network: NetworkConfig,
}

impl MonitorConfig {
    /// Defaults for every section, rooted at `data_dir`.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            deadline: Duration::from_millis(default_deadline_ms()),
            timeouts: ProbeTimeouts::default(),
            data_dir: data_dir.into(),
            recording: RecordingConfig::default(),
            transfer: TransferConfig::default(),
            sample_extractor: SampleExtractorConfig::default(),
            storage: StorageConfig::default(),
            network: NetworkConfig::default(),
        }
    }

    pub fn thresholds(&self) -> HealthThresholds {
        HealthThresholds {
            disk_warning_percent: self.storage.warning_percent,
            disk_critical_percent: self.storage.critical_percent,
        }
    }
}
