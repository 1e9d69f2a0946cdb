// Shared test helpers: scripted probes and a default monitor config

#![allow(dead_code)]

use async_trait::async_trait;
use fleetstatus::config::MonitorConfig;
use fleetstatus::probe::*;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// What a scripted probe does when called.
#[derive(Debug, Clone)]
pub enum Scripted<T> {
    Fact(T),
    Fail(&'static str),
    TimeOut,
    /// Never resolves and ignores its timeout (a misbehaving probe).
    Hang,
}

impl<T: Clone> Scripted<T> {
    async fn run(&self) -> ProbeOutcome<T> {
        match self {
            Scripted::Fact(v) => ProbeOutcome::Fact(v.clone()),
            Scripted::Fail(reason) => ProbeOutcome::Failed(reason.to_string()),
            Scripted::TimeOut => ProbeOutcome::TimedOut,
            Scripted::Hang => std::future::pending().await,
        }
    }
}

pub fn processes(count: usize) -> ProcessFacts {
    ProcessFacts {
        count,
        pids: (0..count as u32).map(|i| 1000 + i).collect(),
        ages_secs: (0..count as u64).map(|i| 60 * (i + 1)).collect(),
        commands: (1..=count)
            .map(|i| format!("ffmpeg -i rtsp://10.0.0.{i}/live -f segment /data/CAM_{i}/recordings/%s.mp4"))
            .collect(),
    }
}

/// Probe answers keyed by the default config's patterns.
#[derive(Debug, Clone)]
pub struct FakeProbes {
    pub recorders: Scripted<ProcessFacts>,
    pub transfer_service: Scripted<ProcessFacts>,
    pub transfers: Scripted<ProcessFacts>,
    pub sampler: Scripted<ProcessFacts>,
    pub mounts: Scripted<MountFact>,
    pub disk: Scripted<DiskUsage>,
    pub reachability: Scripted<Reachability>,
    pub schedule: Scripted<ScheduleFact>,
    pub files: Scripted<FileCount>,
    /// Mount paths that report unmounted regardless of `mounts`.
    pub unmounted: Vec<&'static str>,
    /// Roots whose file scans fail regardless of `files`.
    pub unreadable: Vec<&'static str>,
}

impl FakeProbes {
    /// 3 recorders, transfer service up with everything mounted, sampler idle,
    /// disk at 40%, remote storage reachable.
    pub fn healthy() -> Self {
        Self {
            recorders: Scripted::Fact(processes(3)),
            transfer_service: Scripted::Fact(processes(1)),
            transfers: Scripted::Fact(processes(0)),
            sampler: Scripted::Fact(processes(0)),
            mounts: Scripted::Fact(MountFact { mounted: true }),
            disk: Scripted::Fact(DiskUsage {
                used_percent: 40.0,
                available_bytes: 600_000_000_000,
            }),
            reachability: Scripted::Fact(Reachability { reachable: true }),
            schedule: Scripted::Fact(ScheduleFact {
                configured: true,
                schedule: Some("*/5 * * * *".into()),
            }),
            files: Scripted::Fact(FileCount {
                count: 12,
                total_bytes: 12_000_000,
            }),
            unmounted: Vec::new(),
            unreadable: Vec::new(),
        }
    }

    pub fn with_disk_percent(mut self, used_percent: f64) -> Self {
        self.disk = Scripted::Fact(DiskUsage {
            used_percent,
            available_bytes: 1_000_000,
        });
        self
    }

    pub fn shared(self) -> Arc<dyn Probes> {
        Arc::new(self)
    }
}

#[async_trait]
impl Probes for FakeProbes {
    async fn process_presence(
        &self,
        pattern: &str,
        _timeout: Duration,
    ) -> ProbeOutcome<ProcessFacts> {
        let defaults = MonitorConfig::with_data_dir("/data");
        if pattern == defaults.recording.process_pattern {
            self.recorders.run().await
        } else if pattern == defaults.transfer.service_pattern {
            self.transfer_service.run().await
        } else if pattern == defaults.transfer.transfer_pattern {
            self.transfers.run().await
        } else if pattern == defaults.sample_extractor.process_pattern {
            self.sampler.run().await
        } else {
            ProbeOutcome::Failed(format!("unexpected pattern {}", pattern))
        }
    }

    async fn mount_status(&self, path: &Path, _timeout: Duration) -> ProbeOutcome<MountFact> {
        if self.unmounted.iter().any(|p| path == Path::new(p)) {
            return ProbeOutcome::Fact(MountFact { mounted: false });
        }
        self.mounts.run().await
    }

    async fn disk_usage(&self, _path: &Path, _timeout: Duration) -> ProbeOutcome<DiskUsage> {
        self.disk.run().await
    }

    async fn reachability(&self, _host: &str, _timeout: Duration) -> ProbeOutcome<Reachability> {
        self.reachability.run().await
    }

    async fn schedule_listing(
        &self,
        _job: &str,
        _timeout: Duration,
    ) -> ProbeOutcome<ScheduleFact> {
        self.schedule.run().await
    }

    async fn file_count(&self, query: &FileQuery, _timeout: Duration) -> ProbeOutcome<FileCount> {
        if self.unreadable.iter().any(|p| query.root == Path::new(p)) {
            return ProbeOutcome::Failed("permission denied".into());
        }
        self.files.run().await
    }
}

pub fn monitor_config() -> Arc<MonitorConfig> {
    Arc::new(MonitorConfig::with_data_dir("/data/traffic-provenance"))
}
