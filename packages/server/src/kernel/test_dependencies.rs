// TestDependencies - in-memory implementations for testing
//
// Provides doubles that can be injected into ServerDeps for tests: a store
// with failure injection and write counters, a schedule that only fires when
// told to, a scripted page fetcher and a mailer that records what it sent.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use mailer::{MailerError, OutgoingEmail, SmtpCredentials, SmtpTable, SmtpTarget};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use super::recurrence::{Recurrence, ScheduleError};
use super::{
    BaseMailer, BasePageFetcher, BaseSchedule, BaseWatchStore, FetchError, FetchedPage,
    ScheduleEntry, ScheduledTask, ServerDeps,
};
use crate::config::WatchSettings;
use crate::domains::accounts::models::{Account, AccountStatus};
use crate::domains::watch_jobs::models::{Job, JobInput, PatternStatus, RunStatus};

// =============================================================================
// In-Memory Watch Store
// =============================================================================

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertJob,
    UpdateJob,
    SetEntryId,
    SetLastValue,
    SoftDelete,
    HardDelete,
    FindJob,
}

pub struct InMemoryWatchStore {
    jobs: Mutex<Vec<Job>>,
    accounts: Mutex<Vec<Account>>,
    next_id: AtomicI64,
    failing: Mutex<Vec<StoreOp>>,
    value_writes: Mutex<Vec<(i64, String)>>,
}

impl InMemoryWatchStore {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
            accounts: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(1),
            failing: Mutex::new(Vec::new()),
            value_writes: Mutex::new(Vec::new()),
        }
    }

    /// Add a sender account
    pub fn with_account(self, email: &str, password: &str) -> Self {
        let account = Account {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            email: email.to_string(),
            password: password.to_string(),
            smtp_host: None,
            smtp_port: None,
            status: AccountStatus::Unknown.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        };
        self.accounts.lock().unwrap().push(account);
        self
    }

    /// Make every later call of `op` fail until `recover` is called
    pub fn fail(&self, op: StoreOp) {
        self.failing.lock().unwrap().push(op);
    }

    pub fn recover(&self, op: StoreOp) {
        self.failing.lock().unwrap().retain(|o| *o != op);
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        if self.failing.lock().unwrap().contains(&op) {
            anyhow::bail!("injected {:?} failure", op);
        }
        Ok(())
    }

    /// Insert a job row directly, bypassing the engine
    pub fn seed_job(&self, mut job: Job) -> Job {
        job.id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.jobs.lock().unwrap().push(job.clone());
        job
    }

    /// Job row by ID, including soft-deleted rows
    pub fn raw_job(&self, id: i64) -> Option<Job> {
        self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned()
    }

    pub fn job_count(&self) -> usize {
        self.jobs.lock().unwrap().len()
    }

    pub fn account_by_email(&self, email: &str) -> Option<Account> {
        self.accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned()
    }

    /// Every last-value write, in order
    pub fn value_writes(&self) -> Vec<(i64, String)> {
        self.value_writes.lock().unwrap().clone()
    }

    fn with_live_job<T>(&self, id: i64, f: impl FnOnce(&mut Job) -> T) -> Result<T> {
        let mut jobs = self.jobs.lock().unwrap();
        let job = jobs
            .iter_mut()
            .find(|j| j.id == id && j.deleted_at.is_none())
            .ok_or_else(|| anyhow::anyhow!("Job {} not found", id))?;
        Ok(f(job))
    }
}

impl Default for InMemoryWatchStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseWatchStore for InMemoryWatchStore {
    async fn insert_job(&self, input: &JobInput) -> Result<Job> {
        self.check(StoreOp::InsertJob)?;
        let now = Utc::now();
        let job = Job {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            name: input.name.clone(),
            cron: input.cron.clone(),
            entry_id: None,
            url: input.url.clone(),
            pattern: input.pattern.clone(),
            last_value: String::new(),
            pattern_status: PatternStatus::Untested.to_string(),
            email: input.email.clone(),
            content: input.content.clone(),
            status: input.status.to_string(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        self.jobs.lock().unwrap().push(job.clone());
        Ok(job)
    }

    async fn find_job(&self, id: i64) -> Result<Option<Job>> {
        self.check(StoreOp::FindJob)?;
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.id == id && j.deleted_at.is_none())
            .cloned())
    }

    async fn find_job_by_name(&self, name: &str) -> Result<Option<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .find(|j| j.name == name && j.deleted_at.is_none())
            .cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn list_running_jobs(&self) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.deleted_at.is_none() && j.run_status() == RunStatus::Running)
            .cloned()
            .collect())
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        self.check(StoreOp::UpdateJob)?;
        self.with_live_job(job.id, |stored| {
            let last_value = std::mem::take(&mut stored.last_value);
            *stored = job.clone();
            stored.last_value = last_value;
            stored.updated_at = Utc::now();
            stored.clone()
        })
    }

    async fn set_job_entry_id(&self, id: i64, entry_id: Option<Uuid>) -> Result<()> {
        self.check(StoreOp::SetEntryId)?;
        self.with_live_job(id, |job| job.entry_id = entry_id)
    }

    async fn set_job_last_value(&self, id: i64, value: &str) -> Result<()> {
        self.check(StoreOp::SetLastValue)?;
        self.with_live_job(id, |job| job.last_value = value.to_string())?;
        self.value_writes
            .lock()
            .unwrap()
            .push((id, value.to_string()));
        Ok(())
    }

    async fn set_job_pattern_status(&self, id: i64, status: PatternStatus) -> Result<()> {
        self.with_live_job(id, |job| job.pattern_status = status.to_string())
    }

    async fn soft_delete_job(&self, id: i64) -> Result<()> {
        self.check(StoreOp::SoftDelete)?;
        self.with_live_job(id, |job| {
            job.deleted_at = Some(Utc::now());
            job.entry_id = None;
            job.status = RunStatus::Stopped.to_string();
        })
    }

    async fn hard_delete_job(&self, id: i64) -> Result<()> {
        self.check(StoreOp::HardDelete)?;
        self.jobs.lock().unwrap().retain(|j| j.id != id);
        Ok(())
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email && a.deleted_at.is_none())
            .cloned())
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned())
    }

    async fn set_account_status(&self, id: i64, status: AccountStatus) -> Result<()> {
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| anyhow::anyhow!("Account {} not found", id))?;
        account.status = status.to_string();
        Ok(())
    }
}

// =============================================================================
// Manual Schedule
// =============================================================================

/// Schedule that never fires on its own; tests call `fire`
pub struct ManualSchedule {
    entries: Mutex<HashMap<Uuid, (String, ScheduledTask)>>,
    removed: Mutex<Vec<Uuid>>,
    fail_add: AtomicBool,
    fail_remove: AtomicBool,
}

impl ManualSchedule {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            removed: Mutex::new(Vec::new()),
            fail_add: AtomicBool::new(false),
            fail_remove: AtomicBool::new(false),
        }
    }

    pub fn fail_add(&self, fail: bool) {
        self.fail_add.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    pub fn contains(&self, entry_id: Uuid) -> bool {
        self.entries.lock().unwrap().contains_key(&entry_id)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entry IDs passed to `remove`, including unknown ones
    pub fn removed(&self) -> Vec<Uuid> {
        self.removed.lock().unwrap().clone()
    }

    /// Run one firing of an entry to completion. False if the entry is gone.
    pub async fn fire(&self, entry_id: Uuid) -> bool {
        let task = self
            .entries
            .lock()
            .unwrap()
            .get(&entry_id)
            .map(|(_, task)| task.clone());
        match task {
            Some(task) => {
                task().await;
                true
            }
            None => false,
        }
    }
}

impl Default for ManualSchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseSchedule for ManualSchedule {
    async fn add(&self, expression: &str, task: ScheduledTask) -> Result<Uuid, ScheduleError> {
        Recurrence::parse(expression)?;
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(ScheduleError::Scheduler("injected add failure".to_string()));
        }
        let entry_id = Uuid::new_v4();
        self.entries
            .lock()
            .unwrap()
            .insert(entry_id, (expression.to_string(), task));
        Ok(entry_id)
    }

    async fn remove(&self, entry_id: Uuid) -> Result<(), ScheduleError> {
        if self.fail_remove.load(Ordering::SeqCst) {
            return Err(ScheduleError::Scheduler("injected remove failure".to_string()));
        }
        self.removed.lock().unwrap().push(entry_id);
        self.entries.lock().unwrap().remove(&entry_id);
        Ok(())
    }

    async fn entries(&self) -> Vec<ScheduleEntry> {
        let now = Utc::now();
        self.entries
            .lock()
            .unwrap()
            .iter()
            .map(|(id, (expression, _))| ScheduleEntry {
                id: *id,
                expression: expression.clone(),
                next_due: Recurrence::parse(expression)
                    .ok()
                    .and_then(|r| r.next_after(now)),
            })
            .collect()
    }
}

// =============================================================================
// Mock Page Fetcher
// =============================================================================

pub struct MockPageFetcher {
    responses: Mutex<VecDeque<Result<FetchedPage, FetchError>>>,
    fallback: Mutex<Option<FetchedPage>>,
    calls: Mutex<Vec<String>>,
}

impl MockPageFetcher {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Body returned whenever no scripted response is queued
    pub fn with_body(self, body: &str) -> Self {
        self.set_body(body);
        self
    }

    pub fn set_body(&self, body: &str) {
        *self.fallback.lock().unwrap() = Some(FetchedPage {
            bytes: body.as_bytes().to_vec(),
            content_type: Some("text/html; charset=utf-8".to_string()),
        });
    }

    /// Queue a one-off response
    pub fn push_page(&self, page: FetchedPage) {
        self.responses.lock().unwrap().push_back(Ok(page));
    }

    /// Queue a one-off request failure
    pub fn push_failure(&self, reason: &str) {
        self.responses.lock().unwrap().push_back(Err(FetchError::Request {
            url: String::new(),
            reason: reason.to_string(),
        }));
    }

    /// URLs fetched so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockPageFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BasePageFetcher for MockPageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(response) = self.responses.lock().unwrap().pop_front() {
            return response.map_err(|e| match e {
                FetchError::Request { reason, .. } => FetchError::Request {
                    url: url.to_string(),
                    reason,
                },
                other => other,
            });
        }

        self.fallback
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| FetchError::Request {
                url: url.to_string(),
                reason: "no scripted response".to_string(),
            })
    }
}

// =============================================================================
// Recording Mailer
// =============================================================================

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub target: SmtpTarget,
    pub username: String,
    pub email: OutgoingEmail,
}

pub struct RecordingMailer {
    sent: Mutex<Vec<SentEmail>>,
    verified: Mutex<Vec<SmtpTarget>>,
    reject: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            verified: Mutex::new(Vec::new()),
            reject: AtomicBool::new(false),
        }
    }

    /// Make the SMTP server refuse every send and connection check
    pub fn reject_all(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn verified(&self) -> Vec<SmtpTarget> {
        self.verified.lock().unwrap().clone()
    }

    fn rejection(&self, target: &SmtpTarget) -> Result<(), MailerError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(MailerError::ConnectionRejected {
                host: target.host.clone(),
                port: target.port,
            });
        }
        Ok(())
    }
}

impl Default for RecordingMailer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseMailer for RecordingMailer {
    async fn send(
        &self,
        target: &SmtpTarget,
        credentials: &SmtpCredentials,
        email: &OutgoingEmail,
    ) -> Result<(), MailerError> {
        self.rejection(target)?;
        self.sent.lock().unwrap().push(SentEmail {
            target: target.clone(),
            username: credentials.username.clone(),
            email: email.clone(),
        });
        Ok(())
    }

    async fn verify(
        &self,
        target: &SmtpTarget,
        _credentials: &SmtpCredentials,
    ) -> Result<(), MailerError> {
        self.verified.lock().unwrap().push(target.clone());
        self.rejection(target)
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<InMemoryWatchStore>,
    pub schedule: Arc<ManualSchedule>,
    pub fetcher: Arc<MockPageFetcher>,
    pub mailer: Arc<RecordingMailer>,
    pub settings: WatchSettings,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(InMemoryWatchStore::new()),
            schedule: Arc::new(ManualSchedule::new()),
            fetcher: Arc::new(MockPageFetcher::new()),
            mailer: Arc::new(RecordingMailer::new()),
            settings: WatchSettings::default(),
        }
    }

    pub fn mock_store(mut self, store: InMemoryWatchStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn mock_fetcher(mut self, fetcher: MockPageFetcher) -> Self {
        self.fetcher = Arc::new(fetcher);
        self
    }

    /// Convert to ServerDeps for use with the engine
    pub fn into_server_deps(self) -> ServerDeps {
        ServerDeps::new(
            self.store,
            self.schedule,
            self.fetcher,
            self.mailer,
            Arc::new(SmtpTable::builtin()),
            self.settings,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
