// Storage: local data disk usage and size, plus per-drive remote storage

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

use super::{Collector, StatusBuilder};
use crate::config::{MonitorConfig, MountConfig};
use crate::models::{SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::{FileQuery, Probes};

pub struct StorageCollector {
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
}

impl StorageCollector {
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        Self { probes, config }
    }

    fn recordings_on(&self, mount: &MountConfig) -> FileQuery {
        let recording = &self.config.recording;
        FileQuery::new(&mount.path, recording.recordings_glob.as_str())
            .path_contains(recording.recordings_path_contains.clone())
    }
}

#[async_trait]
impl Collector for StorageCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::Storage
    }

    async fn collect(&self) -> SubsystemStatus {
        let cfg = &self.config.storage;
        let mounts = &self.config.transfer.mounts;
        let timeouts = &self.config.timeouts;
        let data_dir_files = FileQuery::new(&self.config.data_dir, "*");

        let (usage, size, mount_states) = tokio::join!(
            self.probes.disk_usage(&self.config.data_dir, timeouts.disk),
            self.probes.file_count(&data_dir_files, timeouts.file_count),
            join_all(
                mounts
                    .iter()
                    .map(|m| self.probes.mount_status(&m.path, timeouts.mount))
            ),
        );

        let mut b = StatusBuilder::new(SubsystemKind::Storage);
        if let Some(size) = b.absorb("data-dir-size", size) {
            b.metric(keys::TOTAL_SIZE, size.total_bytes);
        }

        let mounted: Vec<bool> = mounts
            .iter()
            .zip(mount_states)
            .map(|(mount, outcome)| {
                let probe = format!("mount-status {}", mount.path.display());
                b.absorb(&probe, outcome).is_some_and(|f| f.mounted)
            })
            .collect();
        let mounted_count = mounted.iter().filter(|m| **m).count();
        b.metric(keys::MOUNTED_COUNT, mounted_count);
        b.metric(keys::TOTAL_MOUNTS, mounts.len());

        for mount in mounts {
            let key = format!("{}{}", keys::DRIVE_KIND_PREFIX, mount.name);
            b.metric(&key, mount.kind.as_str());
        }
        if cfg.count_remote_files {
            let counts = join_all(mounts.iter().zip(&mounted).map(|(mount, &is_mounted)| async move {
                if is_mounted {
                    let query = self.recordings_on(mount);
                    Some(self.probes.file_count(&query, timeouts.file_count).await)
                } else {
                    None
                }
            }))
            .await;
            // A drive that is unmounted or fails its count is inaccessible with zero files.
            let mut total = 0u64;
            for (mount, outcome) in mounts.iter().zip(counts) {
                let files = outcome.and_then(|outcome| {
                    b.absorb(&format!("file-count {}", mount.path.display()), outcome)
                });
                let count = files.map_or(0, |f| f.count);
                total += count;
                b.metric(
                    &format!("{}{}", keys::ACCESSIBLE_PREFIX, mount.name),
                    files.is_some(),
                );
                b.metric(&format!("{}{}", keys::REMOTE_FILES_PREFIX, mount.name), count);
            }
            b.metric(keys::REMOTE_FILES, total);
        } else {
            for (mount, is_mounted) in mounts.iter().zip(&mounted) {
                b.metric(&format!("{}{}", keys::ACCESSIBLE_PREFIX, mount.name), *is_mounted);
            }
        }

        let Some(usage) = b.absorb("disk-usage", usage) else {
            return b.finish(SubsystemState::Unknown);
        };
        b.metric(keys::DISK_USAGE_PERCENT, usage.used_percent);
        b.metric(keys::AVAILABLE_BYTES, usage.available_bytes);

        if usage.used_percent > cfg.critical_percent {
            b.problem(format!(
                "local disk usage {:.0}% above critical threshold {:.0}%",
                usage.used_percent, cfg.critical_percent
            ));
        }
        if !mounts.is_empty() && mounted_count == 0 {
            b.problem("no remote drives mounted");
        }
        b.finish(SubsystemState::Running)
    }
}
