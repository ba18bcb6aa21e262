//! Recurring timers backed by tokio-cron-scheduler.
//!
//! Every running watch job owns exactly one entry here. Entries only carry a
//! callback; which job it belongs to lives in the job record (`entry_id`).
//!
//! ```text
//! CronSchedule
//!     │
//!     ├─► add(expr, task)  → Job::new_async / new_repeated_async → entry id
//!     ├─► remove(entry id) → forgets the entry (unknown ids are a no-op)
//!     └─► on each tick     → tokio::spawn(task())
//! ```
//!
//! Firings are spawned rather than awaited so a slow page never delays other
//! jobs or a later firing of the same job.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job as TimerJob, JobScheduler, JobSchedulerError};
use uuid::Uuid;

use super::recurrence::{Recurrence, ScheduleError};
use super::{BaseSchedule, ScheduleEntry, ScheduledTask};

impl From<JobSchedulerError> for ScheduleError {
    fn from(e: JobSchedulerError) -> Self {
        ScheduleError::Scheduler(e.to_string())
    }
}

struct RegisteredEntry {
    expression: String,
    recurrence: Recurrence,
}

pub struct CronSchedule {
    scheduler: JobScheduler,
    entries: Mutex<HashMap<Uuid, RegisteredEntry>>,
}

impl CronSchedule {
    pub async fn new() -> Result<Self, ScheduleError> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler,
            entries: Mutex::new(HashMap::new()),
        })
    }

    /// Begin firing registered entries
    pub async fn start(&self) -> Result<(), ScheduleError> {
        self.scheduler.start().await?;
        tracing::info!("Schedule started");
        Ok(())
    }

    pub async fn shutdown(&self) -> Result<(), ScheduleError> {
        let mut scheduler = self.scheduler.clone();
        scheduler.shutdown().await?;
        Ok(())
    }

    fn timer_for(recurrence: &Recurrence, task: ScheduledTask) -> Result<TimerJob, ScheduleError> {
        let run = move |_uuid: Uuid, _lock: JobScheduler| {
            let task = task.clone();
            Box::pin(async move {
                tokio::spawn(task());
            }) as std::pin::Pin<Box<dyn std::future::Future<Output = ()> + Send>>
        };

        let timer = match recurrence {
            Recurrence::Cron { expression, .. } => TimerJob::new_async(expression.as_str(), run)?,
            Recurrence::Every(interval) => TimerJob::new_repeated_async(*interval, run)?,
        };
        Ok(timer)
    }
}

#[async_trait]
impl BaseSchedule for CronSchedule {
    async fn add(&self, expression: &str, task: ScheduledTask) -> Result<Uuid, ScheduleError> {
        let recurrence = Recurrence::parse(expression)?;
        let timer = Self::timer_for(&recurrence, task)?;
        let entry_id = self.scheduler.add(timer).await?;

        self.entries.lock().await.insert(
            entry_id,
            RegisteredEntry {
                expression: expression.trim().to_string(),
                recurrence,
            },
        );

        tracing::debug!(entry_id = %entry_id, expression = %expression, "Schedule entry added");
        Ok(entry_id)
    }

    async fn remove(&self, entry_id: Uuid) -> Result<(), ScheduleError> {
        let mut entries = self.entries.lock().await;
        let Some(entry) = entries.remove(&entry_id) else {
            tracing::debug!(entry_id = %entry_id, "Schedule entry already gone");
            return Ok(());
        };

        if let Err(e) = self.scheduler.remove(&entry_id).await {
            // Timer still exists, so the registry keeps it too
            entries.insert(entry_id, entry);
            tracing::warn!(entry_id = %entry_id, error = %e, "Failed to remove schedule entry");
            return Err(e.into());
        }

        tracing::debug!(entry_id = %entry_id, "Schedule entry removed");
        Ok(())
    }

    async fn entries(&self) -> Vec<ScheduleEntry> {
        let registered: Vec<(Uuid, String, Recurrence)> = self
            .entries
            .lock()
            .await
            .iter()
            .map(|(id, entry)| (*id, entry.expression.clone(), entry.recurrence.clone()))
            .collect();

        let mut scheduler = self.scheduler.clone();
        let mut result = Vec::with_capacity(registered.len());
        for (id, expression, recurrence) in registered {
            let next_due = match scheduler.next_tick_for_job(id).await {
                Ok(Some(next)) => Some(next),
                _ => recurrence.next_after(Utc::now()),
            };
            result.push(ScheduleEntry {
                id,
                expression,
                next_due,
            });
        }
        result.sort_by_key(|entry| entry.next_due);
        result
    }
}
