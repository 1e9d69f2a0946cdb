// File counting for the file-count probe (walkdir + globset)

use globset::Glob;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

use super::{FileCount, FileQuery, ProbeError};

/// Counts and sizes regular files under `query.root` matching the query. Blocking.
///
/// A missing root counts as zero files. Unreadable entries are skipped.
/// Returns `ProbeError::Cancelled` as soon as `cancelled` is set.
pub fn count_matching_files(
    query: &FileQuery,
    now: SystemTime,
    cancelled: &AtomicBool,
) -> Result<FileCount, ProbeError> {
    let matcher = Glob::new(&query.pattern)
        .map_err(|e| ProbeError::Parse(format!("glob {}: {}", query.pattern, e)))?
        .compile_matcher();

    if !query.root.exists() {
        return Ok(FileCount::default());
    }

    let mut found = FileCount::default();
    for entry in WalkDir::new(&query.root).into_iter().filter_map(|e| e.ok()) {
        if cancelled.load(Ordering::Relaxed) {
            return Err(ProbeError::Cancelled);
        }
        if !entry.file_type().is_file() || !matcher.is_match(entry.file_name()) {
            continue;
        }
        if let Some(needle) = &query.path_contains
            && !entry.path().to_string_lossy().contains(needle.as_str())
        {
            continue;
        }
        if (query.min_age.is_some() || query.max_age.is_some())
            && !age_in_window(&entry, now, query.min_age, query.max_age)
        {
            continue;
        }
        found.count += 1;
        found.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
    }
    Ok(found)
}

fn age_in_window(
    entry: &walkdir::DirEntry,
    now: SystemTime,
    min_age: Option<Duration>,
    max_age: Option<Duration>,
) -> bool {
    let Some(modified) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
        return false;
    };
    // Files stamped in the future count as brand new.
    let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
    min_age.is_none_or(|min| age >= min) && max_age.is_none_or(|max| age <= max)
}
