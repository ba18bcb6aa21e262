// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// The watch engine and pipeline are written against these so tests can swap
// in the doubles from test_dependencies.rs.
//
// Naming convention: Base* for trait names (e.g., BaseSchedule, BaseMailer)

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use mailer::{MailerError, OutgoingEmail, SmtpCredentials, SmtpTarget};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::domains::accounts::models::{Account, AccountStatus};
use crate::domains::watch_jobs::models::{Job, JobInput, PatternStatus};
use crate::kernel::recurrence::ScheduleError;

// =============================================================================
// Schedule Trait (Infrastructure - recurring timers)
// =============================================================================

/// Work run on every firing of a schedule entry
pub type ScheduledTask = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;

/// A live entry in the schedule
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleEntry {
    pub id: Uuid,
    pub expression: String,
    pub next_due: Option<DateTime<Utc>>,
}

#[async_trait]
pub trait BaseSchedule: Send + Sync {
    /// Register a recurring task. Fails without side effects when the
    /// expression is malformed.
    async fn add(&self, expression: &str, task: ScheduledTask) -> Result<Uuid, ScheduleError>;

    /// Unregister an entry. Removing an unknown entry is a no-op.
    async fn remove(&self, entry_id: Uuid) -> Result<(), ScheduleError>;

    /// Entries currently registered
    async fn entries(&self) -> Vec<ScheduleEntry>;
}

// =============================================================================
// Watch Store Trait (Infrastructure - durable job records)
// =============================================================================

#[async_trait]
pub trait BaseWatchStore: Send + Sync {
    async fn insert_job(&self, input: &JobInput) -> Result<Job>;

    /// Non-deleted job by ID
    async fn find_job(&self, id: i64) -> Result<Option<Job>>;

    async fn find_job_by_name(&self, name: &str) -> Result<Option<Job>>;

    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn list_running_jobs(&self) -> Result<Vec<Job>>;

    /// Persist definition, status and entry id; never the last value
    async fn update_job(&self, job: &Job) -> Result<Job>;

    async fn set_job_entry_id(&self, id: i64, entry_id: Option<Uuid>) -> Result<()>;

    async fn set_job_last_value(&self, id: i64, value: &str) -> Result<()>;

    async fn set_job_pattern_status(&self, id: i64, status: PatternStatus) -> Result<()>;

    async fn soft_delete_job(&self, id: i64) -> Result<()>;

    /// Undo an insert that never became a live job
    async fn hard_delete_job(&self, id: i64) -> Result<()>;

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>>;

    async fn find_account(&self, id: i64) -> Result<Option<Account>>;

    async fn set_account_status(&self, id: i64, status: AccountStatus) -> Result<()>;
}

// =============================================================================
// Page Fetcher Trait (Infrastructure - HTTP GET)
// =============================================================================

/// Raw response of a page fetch, before decoding
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub bytes: Vec<u8>,
    /// Content-Type header, when the server sent one
    pub content_type: Option<String>,
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error("Reading body of {url} failed: {reason}")]
    Body { url: String, reason: String },
}

#[async_trait]
pub trait BasePageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

// =============================================================================
// Mailer Trait (Infrastructure - SMTP)
// =============================================================================

#[async_trait]
pub trait BaseMailer: Send + Sync {
    async fn send(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), MailerError>;

    /// Connect and authenticate without sending
    async fn verify(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
    ) -> Result<(), MailerError>;
}
