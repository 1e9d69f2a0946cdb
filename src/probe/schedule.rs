// Crontab listing helpers

use chrono::{DateTime, Utc};
use std::str::FromStr;

/// Schedule expression of the first active crontab line mentioning `job`.
///
/// Returns `None` when no uncommented line mentions the job. `@daily`-style
/// entries return the macro itself.
pub fn find_cron_entry(listing: &str, job: &str) -> Option<String> {
    let line = listing
        .lines()
        .map(str::trim)
        .find(|line| !line.starts_with('#') && line.contains(job))?;
    let mut fields = line.split_whitespace();
    let first = fields.next()?;
    if first.starts_with('@') {
        return Some(first.to_string());
    }
    let rest: Vec<&str> = fields.take(4).collect();
    if rest.len() < 4 {
        return Some(first.to_string());
    }
    Some(std::iter::once(first).chain(rest).collect::<Vec<_>>().join(" "))
}

/// Next time a five-field crontab expression fires, if the `cron` crate can parse it.
pub fn next_cron_run(expr: &str, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let expr = expr.trim();
    let full = match expr {
        "@yearly" | "@annually" => "0 0 0 1 1 *".to_string(),
        "@monthly" => "0 0 0 1 * *".to_string(),
        "@weekly" => "0 0 0 * * Sun".to_string(),
        "@daily" | "@midnight" => "0 0 0 * * *".to_string(),
        "@hourly" => "0 0 * * * *".to_string(),
        _ if expr.split_whitespace().count() == 5 => format!("0 {}", expr),
        _ => return None,
    };
    let schedule = cron::Schedule::from_str(&full).ok()?;
    schedule.after(&after).next()
}
