// Status snapshot handed to callers (HTTP, WebSocket, poller)

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{OverallHealth, SubsystemKind, SubsystemStatus};

/// One status per subsystem. A struct rather than a map so that every key is always present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Systems {
    pub recording: SubsystemStatus,
    pub transfer_service: SubsystemStatus,
    pub sample_extractor: SubsystemStatus,
    pub storage: SubsystemStatus,
    pub network: SubsystemStatus,
}

impl Systems {
    /// Builds the set by asking `status_for` once per kind, in `SubsystemKind::ALL` order.
    pub fn from_fn(mut status_for: impl FnMut(SubsystemKind) -> SubsystemStatus) -> Self {
        Self {
            recording: status_for(SubsystemKind::Recording),
            transfer_service: status_for(SubsystemKind::TransferService),
            sample_extractor: status_for(SubsystemKind::SampleExtractor),
            storage: status_for(SubsystemKind::Storage),
            network: status_for(SubsystemKind::Network),
        }
    }

    pub fn get(&self, kind: SubsystemKind) -> &SubsystemStatus {
        match kind {
            SubsystemKind::Recording => &self.recording,
            SubsystemKind::TransferService => &self.transfer_service,
            SubsystemKind::SampleExtractor => &self.sample_extractor,
            SubsystemKind::Storage => &self.storage,
            SubsystemKind::Network => &self.network,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubsystemStatus> {
        SubsystemKind::ALL.into_iter().map(|kind| self.get(kind))
    }
}

/// Immutable result of one aggregation call; not cached by the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub overall: OverallHealth,
    pub systems: Systems,
}
