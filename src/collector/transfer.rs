// Transfer service: NAS transfer daemon, its watchdog cron job, remote mounts, copy processes

use async_trait::async_trait;
use futures_util::future::join_all;
use std::sync::Arc;

use super::{Collector, StatusBuilder};
use crate::config::MonitorConfig;
use crate::models::{SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::Probes;

pub struct TransferCollector {
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
}

impl TransferCollector {
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        Self { probes, config }
    }
}

#[async_trait]
impl Collector for TransferCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::TransferService
    }

    async fn collect(&self) -> SubsystemStatus {
        let cfg = &self.config.transfer;
        let timeouts = &self.config.timeouts;

        let (service, schedule, transfers, mounts) = tokio::join!(
            self.probes
                .process_presence(&cfg.service_pattern, timeouts.process),
            self.probes.schedule_listing(&cfg.cron_job, timeouts.schedule),
            self.probes
                .process_presence(&cfg.transfer_pattern, timeouts.process),
            join_all(
                cfg.mounts
                    .iter()
                    .map(|m| self.probes.mount_status(&m.path, timeouts.mount))
            ),
        );

        let mut b = StatusBuilder::new(SubsystemKind::TransferService);

        if let Some(schedule) = b.absorb("schedule-listing", schedule) {
            b.schedule_metrics(&schedule);
        }
        if let Some(transfers) = b.absorb("transfer-processes", transfers) {
            b.metric(keys::ACTIVE_TRANSFERS, transfers.count);
            b.metric(keys::TRANSFERRING, transfers.count > 0);
        }
        b.metric(keys::QUEUE_DEPTH, 0u64);

        let mut mounted = 0usize;
        for (mount, outcome) in cfg.mounts.iter().zip(mounts) {
            let probe = format!("mount-status {}", mount.path.display());
            if let Some(fact) = b.absorb(&probe, outcome) {
                b.metric(&format!("mount.{}", mount.name), fact.mounted);
                if fact.mounted {
                    mounted += 1;
                }
            }
        }
        b.metric(keys::MOUNTED_COUNT, mounted);
        b.metric(keys::TOTAL_MOUNTS, cfg.mounts.len());

        let Some(service) = b.absorb("process-presence", service) else {
            return b.finish(SubsystemState::Unknown);
        };
        b.metric(keys::SERVICE_RUNNING, service.count > 0);
        if let (Some(pid), Some(age)) = (service.pids.first(), service.ages_secs.first()) {
            b.metric(keys::SERVICE_PID, *pid);
            b.metric(keys::SERVICE_UPTIME_SECS, *age);
        }

        if service.count == 0 {
            return b.finish(SubsystemState::Stopped);
        }
        if mounted < cfg.required_mounts() {
            b.problem(format!(
                "only {} of {} remote mounts available",
                mounted,
                cfg.mounts.len()
            ));
        }
        b.finish(SubsystemState::Running)
    }
}
