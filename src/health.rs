// Overall health evaluation: pure function over the five subsystem statuses.
//
// Rules run in a fixed order (recording, transfer, storage, network); each one
// can only raise the running severity, and issues keep rule order.

use crate::models::{OverallHealth, Severity, SubsystemKind, SubsystemState, Systems, keys};

pub const ISSUE_RECORDING_ERROR: &str = "Recording system error";
pub const ISSUE_NO_RECORDINGS: &str = "No active recordings";
pub const ISSUE_TRANSFER_ERROR: &str = "Transfer error";
pub const ISSUE_TRANSFER_STOPPED: &str = "Transfer service stopped";
pub const ISSUE_DISK_CRITICAL: &str = "Local disk critical";
pub const ISSUE_DISK_WARNING: &str = "Local disk warning";
pub const ISSUE_REMOTE_UNREACHABLE: &str = "Remote storage unreachable";
pub const SUMMARY_IDLE: &str = "System idle";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HealthThresholds {
    pub disk_warning_percent: f64,
    pub disk_critical_percent: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            disk_warning_percent: 75.0,
            disk_critical_percent: 90.0,
        }
    }
}

struct Verdict {
    severity: Severity,
    issues: Vec<String>,
}

impl Verdict {
    fn raise(&mut self, severity: Severity, issue: &str) {
        self.severity = self.severity.max(severity);
        self.issues.push(issue.to_string());
    }
}

pub fn evaluate(systems: &Systems, thresholds: &HealthThresholds) -> OverallHealth {
    let mut v = Verdict {
        severity: Severity::Healthy,
        issues: Vec::new(),
    };

    let recording = &systems.recording;
    if recording.state.is_impaired() {
        v.raise(Severity::Error, ISSUE_RECORDING_ERROR);
    } else if recording.metric_i64(keys::ACTIVE_RECORDINGS).unwrap_or(0) == 0 {
        v.raise(Severity::Warning, ISSUE_NO_RECORDINGS);
    }

    let transfer = &systems.transfer_service;
    if transfer.state.is_impaired() {
        v.raise(Severity::Error, ISSUE_TRANSFER_ERROR);
    } else if transfer.state != SubsystemState::Running {
        v.raise(Severity::Warning, ISSUE_TRANSFER_STOPPED);
    }

    if let Some(usage) = systems.storage.metric_f64(keys::DISK_USAGE_PERCENT) {
        if usage > thresholds.disk_critical_percent {
            v.raise(Severity::Error, ISSUE_DISK_CRITICAL);
        } else if usage > thresholds.disk_warning_percent {
            v.raise(Severity::Warning, ISSUE_DISK_WARNING);
        }
    }

    if systems.network.state != SubsystemState::Running {
        v.raise(Severity::Warning, ISSUE_REMOTE_UNREACHABLE);
    }

    OverallHealth {
        severity: v.severity,
        issues: v.issues,
        summary: summarize(systems),
    }
}

/// "3 recording, transferring, sampling"; "System idle" when nothing is active.
pub fn summarize(systems: &Systems) -> String {
    let mut parts = Vec::new();
    let active = systems
        .recording
        .metric_i64(keys::ACTIVE_RECORDINGS)
        .unwrap_or(0);
    if active > 0 {
        parts.push(format!("{} recording", active));
    }
    if systems
        .transfer_service
        .metric_bool(keys::TRANSFERRING)
        .unwrap_or(false)
    {
        parts.push("transferring".to_string());
    }
    if systems.sample_extractor.state == SubsystemState::Running {
        parts.push("sampling".to_string());
    }
    if parts.is_empty() {
        return SUMMARY_IDLE.to_string();
    }
    parts.join(", ")
}

/// Forces `Error` and records which subsystems missed the global deadline.
pub fn mark_timed_out(mut overall: OverallHealth, pending: &[SubsystemKind]) -> OverallHealth {
    let names: Vec<&str> = pending.iter().map(|k| k.as_str()).collect();
    overall.severity = Severity::Error;
    overall
        .issues
        .push(format!("Status check timeout: {}", names.join(", ")));
    overall
}
