//! Per-firing work of a watch job: fetch → decode → extract → diff → persist → notify.
//!
//! Every step before the diff aborts the run; the next firing is the retry.
//! Once a changed value is persisted it stays, whatever happens to the mail.

use serde::Serialize;
use tracing::{debug, error, info, warn, Instrument};

use super::errors::PipelineError;
use super::matcher::ExtractionPattern;
use super::models::Job;
use super::notification;
use crate::kernel::{decode_to_utf8, ServerDeps};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Extracted value equals the stored one; nothing written or sent
    Unchanged,
    /// New value stored and mailed
    Notified { new_value: String },
    /// New value stored, mail not delivered (not retried)
    NotificationFailed { new_value: String, reason: String },
    /// Job was deleted or paused after this firing was scheduled
    Inactive,
}

/// Fetch a page and return its body as UTF-8 text
pub async fn fetch_content(deps: &ServerDeps, url: &str) -> Result<String, PipelineError> {
    let page = deps.fetcher.fetch(url).await?;
    Ok(decode_to_utf8(&page))
}

/// Run the pipeline once for the job definition captured at registration
pub async fn run(deps: &ServerDeps, job: &Job) -> Result<PipelineOutcome, PipelineError> {
    let content = fetch_content(deps, &job.url).await?;
    debug!(bytes = content.len(), "Page decoded");

    let new_value = ExtractionPattern::compile(&job.pattern)?.extract(&content)?;
    debug!(value = %new_value, "Value extracted");

    // Compare against the stored row, not the snapshot this task was built from
    let Some(current) = deps.store.find_job(job.id).await? else {
        warn!("Job no longer exists, skipping");
        return Ok(PipelineOutcome::Inactive);
    };
    if !current.is_running() {
        warn!("Job is paused, skipping");
        return Ok(PipelineOutcome::Inactive);
    }
    if let Some(entry_id) = current.entry_id {
        tracing::Span::current().record("entry_id", tracing::field::display(entry_id));
    }

    if current.last_value == new_value {
        debug!("Value unchanged");
        return Ok(PipelineOutcome::Unchanged);
    }

    deps.store.set_job_last_value(job.id, &new_value).await?;
    info!(old = %current.last_value, new = %new_value, "Value changed");

    match notification::notify_change(deps, &current, &new_value).await {
        Ok(()) => Ok(PipelineOutcome::Notified { new_value }),
        Err(e) => {
            error!(error = %e, "Failed to send change notification");
            Ok(PipelineOutcome::NotificationFailed {
                new_value,
                reason: e.to_string(),
            })
        }
    }
}

/// Entry point used by schedule entries: runs inside a span and logs the result
pub async fn run_logged(deps: &ServerDeps, job: &Job) -> Option<PipelineOutcome> {
    let span = tracing::info_span!(
        "watch_job",
        job_id = job.id,
        job_name = %job.name,
        entry_id = tracing::field::Empty
    );

    async {
        info!(url = %job.url, "Watch run started");
        match run(deps, job).await {
            Ok(outcome) => {
                info!(outcome = ?outcome, "Watch run finished");
                Some(outcome)
            }
            Err(e) => {
                error!(error = %e, "Watch run failed");
                None
            }
        }
    }
    .instrument(span)
    .await
}
