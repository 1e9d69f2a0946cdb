// Production probes: sysinfo process table and disks, mountinfo, ping, crontab, file walks

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, TryLockError};
use std::time::{Duration, SystemTime};
use sysinfo::{Disks, ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tokio::process::Command;
use tracing::instrument;

use super::files::count_matching_files;
use super::schedule::find_cron_entry;
use super::{
    DiskUsage, FileCount, FileQuery, MountFact, ProbeOutcome, Probes, ProcessFacts, Reachability,
    ScheduleFact, bounded, linux,
};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{command} exited with {status}")]
    CommandFailed { command: String, status: String },
    #[error("parse: {0}")]
    Parse(String),
    #[error("probe task join: {0}")]
    Join(#[from] tokio::task::JoinError),
    #[error("lock poisoned: {0}")]
    Poisoned(String),
    #[error("{0} busy with another caller")]
    Busy(&'static str),
    #[error("no filesystem found for {0}")]
    NoFilesystem(PathBuf),
    #[error("unsupported on this platform")]
    Unsupported,
    #[error("cancelled")]
    Cancelled,
}

/// Seconds `ping -W` may wait for a reply: half the budget, at least one.
/// An unanswered ping has to exit before the probe's own timeout fires.
fn ping_wait_secs(timeout: Duration) -> u64 {
    (timeout / 2).as_secs().max(1)
}

/// Sets the shared flag when the owning future is dropped (timed out or abandoned).
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

pub struct SystemProbes {
    disks: Arc<Mutex<Disks>>,
    ping_program: PathBuf,
}

impl Default for SystemProbes {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemProbes {
    pub fn new() -> Self {
        Self {
            disks: Arc::new(Mutex::new(Disks::new_with_refreshed_list())),
            ping_program: PathBuf::from("ping"),
        }
    }

    /// Uses `program` instead of `ping` from `PATH` for reachability checks.
    pub fn with_ping_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.ping_program = program.into();
        self
    }

    async fn scan_processes(&self, pattern: &str) -> Result<ProcessFacts, ProbeError> {
        let re = Regex::new(pattern).map_err(|e| ProbeError::Parse(e.to_string()))?;
        // Per-call process table; concurrent scans share no lock.
        tokio::task::spawn_blocking(move || {
            let mut sys = System::new();
            sys.refresh_processes_specifics(
                ProcessesToUpdate::All,
                true,
                ProcessRefreshKind::nothing().with_cmd(UpdateKind::OnlyIfNotSet),
            );
            let own_pid = std::process::id();
            let mut matches: Vec<(u32, u64, String)> = sys
                .processes()
                .iter()
                .filter(|(pid, _)| pid.as_u32() != own_pid)
                .filter_map(|(pid, process)| {
                    let cmdline = if process.cmd().is_empty() {
                        process.name().to_string_lossy().into_owned()
                    } else {
                        process
                            .cmd()
                            .iter()
                            .map(|arg| arg.to_string_lossy())
                            .collect::<Vec<_>>()
                            .join(" ")
                    };
                    re.is_match(&cmdline)
                        .then(|| (pid.as_u32(), process.run_time(), cmdline))
                })
                .collect();
            matches.sort_unstable_by_key(|(pid, _, _)| *pid);
            let mut facts = ProcessFacts {
                count: matches.len(),
                ..ProcessFacts::default()
            };
            for (pid, age, cmdline) in matches {
                facts.pids.push(pid);
                facts.ages_secs.push(age);
                facts.commands.push(cmdline);
            }
            Ok(facts)
        })
        .await?
    }

    async fn usage_for(&self, path: &Path) -> Result<DiskUsage, ProbeError> {
        let path = tokio::fs::canonicalize(path).await?;
        let disks = self.disks.clone();
        tokio::task::spawn_blocking(move || {
            let mut disks = match disks.try_lock() {
                Ok(guard) => guard,
                Err(TryLockError::WouldBlock) => return Err(ProbeError::Busy("disk list")),
                Err(TryLockError::Poisoned(e)) => return Err(ProbeError::Poisoned(e.to_string())),
            };
            disks.refresh(true);
            // Longest mount point containing the path is the filesystem it lives on.
            let disk = disks
                .list()
                .iter()
                .filter(|d| path.starts_with(d.mount_point()))
                .max_by_key(|d| d.mount_point().as_os_str().len())
                .ok_or_else(|| ProbeError::NoFilesystem(path.clone()))?;
            let total = disk.total_space();
            let available = disk.available_space();
            let used = total.saturating_sub(available);
            let used_percent = if total > 0 {
                (used as f64 / total as f64) * 100.0
            } else {
                0.0
            };
            Ok(DiskUsage {
                used_percent,
                available_bytes: available,
            })
        })
        .await?
    }

    async fn mountinfo_contains(path: &Path) -> Result<bool, ProbeError> {
        if !cfg!(target_os = "linux") {
            return Err(ProbeError::Unsupported);
        }
        let content = tokio::fs::read_to_string(linux::MOUNTINFO).await?;
        Ok(linux::is_mount_point(&content, path))
    }

    async fn ping(&self, host: &str, timeout: Duration) -> Result<bool, ProbeError> {
        let wait_secs = ping_wait_secs(timeout).to_string();
        let status = Command::new(&self.ping_program)
            .args(["-c", "1", "-W", &wait_secs, host])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await?;
        Ok(status.success())
    }

    async fn crontab(job: &str) -> Result<ScheduleFact, ProbeError> {
        let output = Command::new("crontab")
            .arg("-l")
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await?;
        // `crontab -l` exits non-zero when the user has no crontab at all.
        if !output.status.success() {
            if output.stderr.is_empty()
                || String::from_utf8_lossy(&output.stderr).contains("no crontab")
            {
                return Ok(ScheduleFact::default());
            }
            return Err(ProbeError::CommandFailed {
                command: "crontab -l".into(),
                status: output.status.to_string(),
            });
        }
        let listing = String::from_utf8_lossy(&output.stdout);
        let schedule = find_cron_entry(&listing, job);
        Ok(ScheduleFact {
            configured: schedule.is_some(),
            schedule,
        })
    }

    async fn count_files(query: FileQuery) -> Result<FileCount, ProbeError> {
        let cancelled = Arc::new(AtomicBool::new(false));
        let _guard = CancelOnDrop(cancelled.clone());
        let found = tokio::task::spawn_blocking(move || {
            count_matching_files(&query, SystemTime::now(), &cancelled)
        })
        .await??;
        Ok(found)
    }
}

#[async_trait]
impl Probes for SystemProbes {
    #[instrument(skip(self, timeout), fields(probe = "process_presence"))]
    async fn process_presence(
        &self,
        pattern: &str,
        timeout: Duration,
    ) -> ProbeOutcome<ProcessFacts> {
        bounded(timeout, self.scan_processes(pattern)).await
    }

    #[instrument(skip(self, timeout), fields(probe = "mount_status"))]
    async fn mount_status(&self, path: &Path, timeout: Duration) -> ProbeOutcome<MountFact> {
        bounded(timeout, async {
            let mounted = Self::mountinfo_contains(path).await?;
            Ok::<_, ProbeError>(MountFact { mounted })
        })
        .await
    }

    #[instrument(skip(self, timeout), fields(probe = "disk_usage"))]
    async fn disk_usage(&self, path: &Path, timeout: Duration) -> ProbeOutcome<DiskUsage> {
        bounded(timeout, self.usage_for(path)).await
    }

    #[instrument(skip(self, timeout), fields(probe = "reachability"))]
    async fn reachability(&self, host: &str, timeout: Duration) -> ProbeOutcome<Reachability> {
        bounded(timeout, async {
            let reachable = self.ping(host, timeout).await?;
            Ok::<_, ProbeError>(Reachability { reachable })
        })
        .await
    }

    #[instrument(skip(self, timeout), fields(probe = "schedule_listing"))]
    async fn schedule_listing(&self, job: &str, timeout: Duration) -> ProbeOutcome<ScheduleFact> {
        bounded(timeout, Self::crontab(job)).await
    }

    #[instrument(skip(self, query, timeout), fields(probe = "file_count", root = %query.root.display()))]
    async fn file_count(&self, query: &FileQuery, timeout: Duration) -> ProbeOutcome<FileCount> {
        bounded(timeout, Self::count_files(query.clone())).await
    }
}
