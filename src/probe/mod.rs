// Probes: bounded-time queries for single raw facts about the host.
//
// Every probe resolves to a `ProbeOutcome` within the timeout it is given;
// none of them return errors to the caller.

mod files;
mod linux;
mod schedule;
mod system;

pub use files::count_matching_files;
pub use schedule::{find_cron_entry, next_cron_run};
pub use system::{ProbeError, SystemProbes};

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome<T> {
    Fact(T),
    TimedOut,
    Failed(String),
}

impl<T> ProbeOutcome<T> {
    pub fn fact(self) -> Option<T> {
        match self {
            ProbeOutcome::Fact(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_fact(&self) -> bool {
        matches!(self, ProbeOutcome::Fact(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ProbeOutcome<U> {
        match self {
            ProbeOutcome::Fact(v) => ProbeOutcome::Fact(f(v)),
            ProbeOutcome::TimedOut => ProbeOutcome::TimedOut,
            ProbeOutcome::Failed(reason) => ProbeOutcome::Failed(reason),
        }
    }
}

impl<T> fmt::Display for ProbeOutcome<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Fact(_) => f.write_str("ok"),
            ProbeOutcome::TimedOut => f.write_str("timed out"),
            ProbeOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

/// Runs `fut` for at most `timeout`, folding errors and elapsed time into a `ProbeOutcome`.
pub async fn bounded<T, E, F>(timeout: Duration, fut: F) -> ProbeOutcome<T>
where
    E: fmt::Display,
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(v)) => ProbeOutcome::Fact(v),
        Ok(Err(e)) => ProbeOutcome::Failed(e.to_string()),
        Err(_) => ProbeOutcome::TimedOut,
    }
}

/// Processes whose command line matches a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessFacts {
    pub count: usize,
    /// Sorted ascending; `ages_secs[i]` and `commands[i]` belong to `pids[i]`.
    pub pids: Vec<u32>,
    pub ages_secs: Vec<u64>,
    /// Full command line, arguments joined by spaces.
    pub commands: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MountFact {
    pub mounted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskUsage {
    pub used_percent: f64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reachability {
    pub reachable: bool,
}

/// Whether a scheduled job mentioning a name is installed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFact {
    pub configured: bool,
    /// Schedule expression from the job line (e.g. "*/5 * * * *").
    pub schedule: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileCount {
    pub count: u64,
    /// Sum of the matched files' sizes.
    pub total_bytes: u64,
}

/// Files under `root` whose name matches `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileQuery {
    pub root: PathBuf,
    /// Glob matched against the file name (e.g. "*_sample_*.mp4").
    pub pattern: String,
    /// Substring the full path must contain (e.g. "/recordings/").
    pub path_contains: Option<String>,
    /// Only files modified at least this long ago.
    pub min_age: Option<Duration>,
    /// Only files modified within this window.
    pub max_age: Option<Duration>,
}

impl FileQuery {
    pub fn new(root: impl Into<PathBuf>, pattern: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            pattern: pattern.into(),
            path_contains: None,
            min_age: None,
            max_age: None,
        }
    }

    pub fn path_contains(mut self, needle: Option<String>) -> Self {
        self.path_contains = needle;
        self
    }

    pub fn newer_than(mut self, window: Duration) -> Self {
        self.max_age = Some(window);
        self
    }
}

/// The raw facts the collectors are built from. Implementations must honour `timeout`.
#[async_trait]
pub trait Probes: Send + Sync {
    async fn process_presence(&self, pattern: &str, timeout: Duration)
    -> ProbeOutcome<ProcessFacts>;

    async fn mount_status(&self, path: &Path, timeout: Duration) -> ProbeOutcome<MountFact>;

    async fn disk_usage(&self, path: &Path, timeout: Duration) -> ProbeOutcome<DiskUsage>;

    async fn reachability(&self, host: &str, timeout: Duration) -> ProbeOutcome<Reachability>;

    async fn schedule_listing(&self, job: &str, timeout: Duration) -> ProbeOutcome<ScheduleFact>;

    async fn file_count(&self, query: &FileQuery, timeout: Duration) -> ProbeOutcome<FileCount>;
}
