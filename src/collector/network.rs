// Network: reachability of the remote storage host

use async_trait::async_trait;
use std::sync::Arc;

use super::{Collector, StatusBuilder};
use crate::config::MonitorConfig;
use crate::models::{SubsystemKind, SubsystemState, SubsystemStatus, keys};
use crate::probe::Probes;

pub struct NetworkCollector {
    probes: Arc<dyn Probes>,
    config: Arc<MonitorConfig>,
}

impl NetworkCollector {
    pub fn new(probes: Arc<dyn Probes>, config: Arc<MonitorConfig>) -> Self {
        Self { probes, config }
    }
}

#[async_trait]
impl Collector for NetworkCollector {
    fn kind(&self) -> SubsystemKind {
        SubsystemKind::Network
    }

    async fn collect(&self) -> SubsystemStatus {
        let cfg = &self.config.network;
        let outcome = self
            .probes
            .reachability(&cfg.host, self.config.timeouts.reachability)
            .await;

        let mut b = StatusBuilder::new(SubsystemKind::Network);
        b.metric(keys::HOST, cfg.host.as_str());
        if let Some(interface) = &cfg.interface {
            b.metric(keys::INTERFACE, interface.as_str());
        }

        match b.absorb("reachability", outcome) {
            Some(fact) => {
                b.metric(keys::REACHABLE, fact.reachable);
                b.finish(if fact.reachable {
                    SubsystemState::Running
                } else {
                    SubsystemState::Stopped
                })
            }
            None => {
                b.metric(keys::REACHABLE, false);
                b.finish(SubsystemState::Unknown)
            }
        }
    }
}
