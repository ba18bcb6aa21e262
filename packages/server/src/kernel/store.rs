//! Postgres-backed watch store. Queries live on the models; this only adapts
//! them to `BaseWatchStore`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::BaseWatchStore;
use crate::domains::accounts::models::{Account, AccountStatus};
use crate::domains::watch_jobs::models::{Job, JobInput, PatternStatus};

#[derive(Clone)]
pub struct PostgresWatchStore {
    pool: PgPool,
}

impl PostgresWatchStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BaseWatchStore for PostgresWatchStore {
    async fn insert_job(&self, input: &JobInput) -> Result<Job> {
        Job::create(input, &self.pool).await
    }

    async fn find_job(&self, id: i64) -> Result<Option<Job>> {
        Job::find_by_id(id, &self.pool).await
    }

    async fn find_job_by_name(&self, name: &str) -> Result<Option<Job>> {
        Job::find_by_name(name, &self.pool).await
    }

    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Job::find_all(&self.pool).await
    }

    async fn list_running_jobs(&self) -> Result<Vec<Job>> {
        Job::find_running(&self.pool).await
    }

    async fn update_job(&self, job: &Job) -> Result<Job> {
        Job::update(job, &self.pool).await
    }

    async fn set_job_entry_id(&self, id: i64, entry_id: Option<Uuid>) -> Result<()> {
        Job::set_entry_id(id, entry_id, &self.pool).await
    }

    async fn set_job_last_value(&self, id: i64, value: &str) -> Result<()> {
        Job::set_last_value(id, value, &self.pool).await
    }

    async fn set_job_pattern_status(&self, id: i64, status: PatternStatus) -> Result<()> {
        Job::set_pattern_status(id, status, &self.pool).await
    }

    async fn soft_delete_job(&self, id: i64) -> Result<()> {
        Job::soft_delete(id, &self.pool).await
    }

    async fn hard_delete_job(&self, id: i64) -> Result<()> {
        Job::hard_delete(id, &self.pool).await
    }

    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>> {
        Account::find_by_email(email, &self.pool).await
    }

    async fn find_account(&self, id: i64) -> Result<Option<Account>> {
        Account::find_by_id(id, &self.pool).await
    }

    async fn set_account_status(&self, id: i64, status: AccountStatus) -> Result<()> {
        Account::set_status(id, status, &self.pool).await
    }
}
