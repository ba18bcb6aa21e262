//! Recurrence expressions accepted for jobs.
//!
//! Jobs are defined with classic 5-field cron (`*/5 * * * *`), but the
//! scheduler underneath speaks the `cron` crate dialect: a leading seconds
//! field and day-of-week numbered 1-7 from Sunday. Expressions are normalized
//! here once so both the timer registry and diagnostics agree on them.
//!
//! Also accepted:
//! - 6/7-field expressions (seconds, optional year), passed through
//! - descriptors: `@yearly`, `@monthly`, `@weekly`, `@daily`, `@hourly`
//! - fixed intervals: `@every 5m`, `@every 1h30m`, `@every 45s`

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Invalid recurrence expression `{expression}`: {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Scheduler error: {0}")]
    Scheduler(String),
}

impl ScheduleError {
    fn invalid(expression: &str, reason: impl Into<String>) -> Self {
        ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Recurrence {
    /// Cron schedule; `expression` is the normalized form
    Cron {
        expression: String,
        schedule: cron::Schedule,
    },
    /// Fixed interval from registration time
    Every(Duration),
}

impl Recurrence {
    pub fn parse(expression: &str) -> Result<Self, ScheduleError> {
        let trimmed = expression.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::invalid(expression, "expression is empty"));
        }

        if let Some(spec) = trimmed.strip_prefix("@every") {
            let interval =
                parse_interval(spec.trim()).map_err(|reason| ScheduleError::invalid(expression, reason))?;
            return Ok(Recurrence::Every(interval));
        }

        let normalized = normalize_cron(trimmed);
        let schedule = cron::Schedule::from_str(&normalized)
            .map_err(|e| ScheduleError::invalid(expression, e.to_string()))?;

        Ok(Recurrence::Cron {
            expression: normalized,
            schedule,
        })
    }

    /// Next firing strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Recurrence::Cron { schedule, .. } => schedule.after(&after).next(),
            Recurrence::Every(interval) => chrono::Duration::from_std(*interval)
                .ok()
                .map(|step| after + step),
        }
    }
}

/// Bring a classic 5-field expression into the seconds-first dialect.
/// Anything else (descriptors, 6/7 fields) is returned unchanged.
fn normalize_cron(expression: &str) -> String {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if fields.len() != 5 {
        return fields.join(" ");
    }

    let day_of_week = fields[4]
        .split(',')
        .map(shift_day_of_week)
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "0 {} {} {} {} {}",
        fields[0], fields[1], fields[2], fields[3], day_of_week
    )
}

/// Classic cron numbers days 0-7 (0 and 7 = Sunday); the `cron` crate uses 1-7.
/// Numeric items become an explicit list of shifted days, since a range or
/// step ending on Sunday-as-7 has no 1-7 range equivalent. Names and
/// malformed items are left for the `cron` crate to judge.
fn shift_day_of_week(item: &str) -> String {
    match classic_days(item) {
        Some(days) => days
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join(","),
        None => item.to_string(),
    }
}

/// Days named by `a`, `a-b`, `a/s` or `a-b/s`, in the 1-7 numbering
fn classic_days(item: &str) -> Option<Vec<u32>> {
    let (range, step) = match item.split_once('/') {
        Some((range, step)) => (range, Some(step.parse::<usize>().ok().filter(|s| *s > 0)?)),
        None => (item, None),
    };

    let (start, end) = match range.split_once('-') {
        Some((start, end)) => (start.parse::<u32>().ok()?, end.parse::<u32>().ok()?),
        None => {
            let day = range.parse::<u32>().ok()?;
            // `a/s` runs to the end of the week
            (day, if step.is_some() { 7 } else { day })
        }
    };
    if start > end || end > 7 {
        return None;
    }

    let mut days: Vec<u32> = (start..=end)
        .step_by(step.unwrap_or(1))
        .map(|day| day % 7 + 1)
        .collect();
    days.sort_unstable();
    days.dedup();
    Some(days)
}

/// Parse `1h30m`, `5m`, `45s`.
fn parse_interval(spec: &str) -> Result<Duration, String> {
    if spec.is_empty() {
        return Err("missing interval after @every".to_string());
    }

    let mut total = 0u64;
    let mut digits = String::new();
    for ch in spec.chars() {
        if ch.is_ascii_digit() {
            digits.push(ch);
            continue;
        }
        let unit = match ch {
            'h' => 3600,
            'm' => 60,
            's' => 1,
            _ => return Err(format!("unknown interval unit `{}`", ch)),
        };
        let amount: u64 = digits
            .parse()
            .map_err(|_| format!("missing number before `{}`", ch))?;
        total = amount
            .checked_mul(unit)
            .and_then(|secs| total.checked_add(secs))
            .ok_or_else(|| "interval is too large".to_string())?;
        digits.clear();
    }

    if !digits.is_empty() {
        return Err(format!("missing unit after `{}`", digits));
    }
    if total == 0 {
        return Err("interval must be greater than zero".to_string());
    }
    let interval = Duration::from_secs(total);
    // Must stay representable as a chrono step for next-due computation
    chrono::Duration::from_std(interval).map_err(|_| "interval is too large".to_string())?;
    Ok(interval)
}
