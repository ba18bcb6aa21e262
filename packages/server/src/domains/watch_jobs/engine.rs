//! Watch-job engine: keeps schedule entries and job records in step.
//!
//! Invariant: a job has a live schedule entry iff it is running and not
//! deleted. There is no lock spanning store and schedule; each operation
//! mutates one side, confirms, then the other, and compensates on failure.
//!
//! ```text
//! create  : insert row ─► add entry ─► store entry id   (undo: remove entry, hard delete row)
//! update  : remove old entry ─► add entry ─► persist row (undo: remove new entry)
//! delete  : soft delete row ─► remove entry              (entry stays if the write fails)
//! startup : running rows ─► add entry ─► store entry id  (failures skipped, entry id cleared)
//! ```
//!
//! An undo step that fails is reported as `RollbackFailed`, never swallowed.

use futures::FutureExt;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::errors::EngineError;
use super::matcher::ExtractionPattern;
use super::models::{Job, JobInput, RunStatus};
use super::pipeline;
use crate::kernel::{Recurrence, ScheduleEntry, ScheduleError, ScheduledTask, ServerDeps};

/// Result of registering stored jobs at startup
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub scheduled: Vec<i64>,
    /// (job id, reason)
    pub skipped: Vec<(i64, String)>,
}

#[derive(Clone)]
pub struct WatchEngine {
    deps: ServerDeps,
}

impl WatchEngine {
    pub fn new(deps: ServerDeps) -> Self {
        Self { deps }
    }

    pub fn deps(&self) -> &ServerDeps {
        &self.deps
    }

    fn validate(input: &JobInput) -> Result<(), EngineError> {
        let missing = input.missing_fields();
        if !missing.is_empty() {
            return Err(EngineError::InvalidInput(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }
        Recurrence::parse(&input.cron)?;
        ExtractionPattern::compile(&input.pattern)?;
        Ok(())
    }

    /// Schedule task running the pipeline for this job definition
    fn task_for(&self, job: &Job) -> ScheduledTask {
        let deps = self.deps.clone();
        let job = Arc::new(job.clone());
        Arc::new(move || {
            let deps = deps.clone();
            let job = job.clone();
            async move {
                pipeline::run_logged(&deps, &job).await;
            }
            .boxed()
        })
    }

    async fn register(&self, job: &Job) -> Result<Uuid, ScheduleError> {
        let entry_id = self.deps.schedule.add(&job.cron, self.task_for(job)).await?;
        info!(job_id = job.id, entry_id = %entry_id, cron = %job.cron, "Job scheduled");
        Ok(entry_id)
    }

    /// Remove an entry during compensation
    async fn discard_entry(&self, job_id: i64, entry_id: Uuid) -> Result<(), ScheduleError> {
        self.deps.schedule.remove(entry_id).await.inspect_err(|e| {
            error!(job_id, entry_id = %entry_id, error = %e, "Failed to discard schedule entry");
        })
    }

    /// Undo an insert whose schedule side failed: discard `entry_id` if one
    /// was registered, then hard delete the row. The row is deleted even when
    /// the discard fails. Returns `cause` unless some undo step fails.
    async fn roll_back_insert(
        &self,
        job_id: i64,
        entry_id: Option<Uuid>,
        cause: EngineError,
    ) -> EngineError {
        let mut failures = Vec::new();
        if let Some(entry_id) = entry_id {
            if let Err(e) = self.discard_entry(job_id, entry_id).await {
                failures.push(e.to_string());
            }
        }
        if let Err(e) = self.deps.store.hard_delete_job(job_id).await {
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            warn!(job_id, cause = %cause, "Job creation rolled back");
            return cause;
        }
        let rollback = failures.join("; ");
        error!(job_id, cause = %cause, error = %rollback, "Job creation rollback failed");
        EngineError::RollbackFailed {
            job_id,
            cause: cause.to_string(),
            rollback,
        }
    }

    /// Drop an entry id that no longer names a live entry
    async fn clear_entry_id(&self, job_id: i64) -> anyhow::Result<()> {
        self.deps
            .store
            .set_job_entry_id(job_id, None)
            .await
            .inspect_err(|e| warn!(job_id, error = %e, "Failed to clear stale entry id"))
    }

    async fn log_schedule(&self) {
        for entry in self.deps.schedule.entries().await {
            debug!(entry_id = %entry.id, next_due = ?entry.next_due, "Schedule entry");
        }
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn create(&self, input: JobInput) -> Result<Job, EngineError> {
        Self::validate(&input)?;

        if self.deps.store.find_job_by_name(&input.name).await?.is_some() {
            return Err(EngineError::DuplicateName(input.name));
        }

        let mut job = self.deps.store.insert_job(&input).await?;
        info!(job_id = job.id, job_name = %job.name, "Job created");

        if job.is_running() {
            let entry_id = match self.register(&job).await {
                Ok(entry_id) => entry_id,
                Err(e) => return Err(self.roll_back_insert(job.id, None, e.into()).await),
            };

            if let Err(e) = self.deps.store.set_job_entry_id(job.id, Some(entry_id)).await {
                return Err(self.roll_back_insert(job.id, Some(entry_id), e.into()).await);
            }
            job.entry_id = Some(entry_id);
        }

        self.log_schedule().await;
        Ok(job)
    }

    pub async fn update(&self, input: JobInput) -> Result<Job, EngineError> {
        let id = input
            .id
            .ok_or_else(|| EngineError::InvalidInput("id is required".to_string()))?;
        Self::validate(&input)?;

        let stored = self
            .deps
            .store
            .find_job(id)
            .await?
            .ok_or(EngineError::JobNotFound(id))?;

        if input.name != stored.name {
            if let Some(other) = self.deps.store.find_job_by_name(&input.name).await? {
                if other.id != id {
                    return Err(EngineError::DuplicateName(input.name));
                }
            }
        }

        // Unconditional remove-then-add; never patch an existing entry
        if let Some(old_entry) = stored.entry_id {
            self.deps.schedule.remove(old_entry).await?;
            debug!(job_id = id, entry_id = %old_entry, "Previous schedule entry removed");
        }

        let mut job = stored.clone();
        job.apply(&input);
        job.entry_id = None;

        if job.is_running() {
            match self.register(&job).await {
                Ok(entry_id) => job.entry_id = Some(entry_id),
                Err(e) => {
                    error!(job_id = id, error = %e, "Failed to reschedule job");
                    // The definition is left as stored; only the dead entry reference goes
                    if stored.entry_id.is_some() {
                        if let Err(clear) = self.clear_entry_id(id).await {
                            return Err(EngineError::RollbackFailed {
                                job_id: id,
                                cause: e.to_string(),
                                rollback: clear.to_string(),
                            });
                        }
                    }
                    return Err(e.into());
                }
            }
        }

        let updated = match self.deps.store.update_job(&job).await {
            Ok(updated) => updated,
            Err(e) => {
                error!(job_id = id, error = %e, "Failed to persist job update");
                if let Some(entry_id) = job.entry_id {
                    if let Err(discard) = self.discard_entry(id, entry_id).await {
                        return Err(EngineError::RollbackFailed {
                            job_id: id,
                            cause: e.to_string(),
                            rollback: discard.to_string(),
                        });
                    }
                }
                return Err(e.into());
            }
        };

        info!(job_id = id, status = %updated.status, entry_id = ?updated.entry_id, "Job updated");
        self.log_schedule().await;
        Ok(updated)
    }

    /// Pause or resume: an update that only changes the run status
    pub async fn set_run_status(&self, id: i64, status: RunStatus) -> Result<Job, EngineError> {
        let stored = self
            .deps
            .store
            .find_job(id)
            .await?
            .ok_or(EngineError::JobNotFound(id))?;

        let mut input = JobInput::from(&stored);
        input.status = status;
        self.update(input).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), EngineError> {
        // Entry id comes from the stored row, never from the caller
        let stored = self
            .deps
            .store
            .find_job(id)
            .await?
            .ok_or(EngineError::JobNotFound(id))?;

        self.deps.store.soft_delete_job(id).await?;

        if let Some(entry_id) = stored.entry_id {
            self.deps.schedule.remove(entry_id).await?;
        }

        info!(job_id = id, job_name = %stored.name, "Job deleted");
        self.log_schedule().await;
        Ok(())
    }

    /// Register every running job. Entry ids left by a previous process are
    /// replaced; a job that cannot be registered is skipped and its old entry
    /// id cleared.
    pub async fn sync_from_store(&self) -> Result<SyncReport, EngineError> {
        let jobs = self.deps.store.list_running_jobs().await?;
        let mut report = SyncReport::default();

        for job in jobs {
            let reason = match self.register(&job).await {
                Ok(entry_id) => match self.deps.store.set_job_entry_id(job.id, Some(entry_id)).await {
                    Ok(()) => {
                        report.scheduled.push(job.id);
                        continue;
                    }
                    Err(e) => match self.discard_entry(job.id, entry_id).await {
                        Ok(()) => e.to_string(),
                        Err(discard) => format!("{e}; entry {entry_id} still live: {discard}"),
                    },
                },
                Err(e) => e.to_string(),
            };

            warn!(job_id = job.id, job_name = %job.name, reason = %reason, "Skipping job at startup");
            // Nothing in this process answers to the old id
            if job.entry_id.is_some() {
                let _ = self.clear_entry_id(job.id).await;
            }
            report.skipped.push((job.id, reason));
        }

        info!(
            scheduled = report.scheduled.len(),
            skipped = report.skipped.len(),
            "Startup synchronization finished"
        );
        self.log_schedule().await;
        Ok(report)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn list_jobs(&self) -> Result<Vec<Job>, EngineError> {
        Ok(self.deps.store.list_jobs().await?)
    }

    pub async fn find_job(&self, id: i64) -> Result<Job, EngineError> {
        self.deps
            .store
            .find_job(id)
            .await?
            .ok_or(EngineError::JobNotFound(id))
    }

    pub async fn schedule_entries(&self) -> Vec<ScheduleEntry> {
        self.deps.schedule.entries().await
    }
}
