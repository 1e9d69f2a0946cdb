// Overall health verdict

use serde::{Deserialize, Serialize};

/// Ordered severity; `max` is the escalation operator.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Healthy,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallHealth {
    pub severity: Severity,
    /// In rule evaluation order.
    pub issues: Vec<String>,
    pub summary: String,
}
