// Status domain models: per-subsystem facts, overall health, snapshot

mod health;
mod snapshot;
mod subsystem;

pub use health::{OverallHealth, Severity};
pub use snapshot::{StatusSnapshot, Systems};
pub use subsystem::{MetricValue, SubsystemKind, SubsystemState, SubsystemStatus, keys};
