use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Job - a monitored page, its extraction rule and who to notify
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i64,
    pub name: String,
    /// Recurrence expression (cron, descriptor or `@every <duration>`)
    pub cron: String,
    /// Live schedule entry; None while paused or deleted
    pub entry_id: Option<Uuid>,
    pub url: String,
    /// Regex with at least one capture group; group 1 is the watched value
    pub pattern: String,
    pub last_value: String,
    pub pattern_status: String, // 'untested', 'valid', 'invalid', 'testing'
    /// Recipient address; also the key of the sending account
    pub email: String,
    /// Body template, may embed %target% and %name%
    pub content: String,
    pub status: String, // 'running', 'stopped'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Run status of a job
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Stopped,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Stopped => write!(f, "stopped"),
        }
    }
}

impl std::str::FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "running" => Ok(RunStatus::Running),
            "stopped" => Ok(RunStatus::Stopped),
            _ => Err(anyhow::anyhow!("Invalid run status: {}", s)),
        }
    }
}

/// Result of the last pattern probe
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    #[default]
    Untested,
    Valid,
    Invalid,
    Testing,
}

impl std::fmt::Display for PatternStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PatternStatus::Untested => write!(f, "untested"),
            PatternStatus::Valid => write!(f, "valid"),
            PatternStatus::Invalid => write!(f, "invalid"),
            PatternStatus::Testing => write!(f, "testing"),
        }
    }
}

impl std::str::FromStr for PatternStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "untested" => Ok(PatternStatus::Untested),
            "valid" => Ok(PatternStatus::Valid),
            "invalid" => Ok(PatternStatus::Invalid),
            "testing" => Ok(PatternStatus::Testing),
            _ => Err(anyhow::anyhow!("Invalid pattern status: {}", s)),
        }
    }
}

/// Job definition as submitted through the API (create and update)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    /// Required for update, ignored on create
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    pub cron: String,
    pub url: String,
    pub pattern: String,
    pub email: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub status: RunStatus,
}

impl JobInput {
    /// Names of required fields that are blank
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("cron", &self.cron),
            ("url", &self.url),
            ("pattern", &self.pattern),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect()
    }
}

impl From<&Job> for JobInput {
    fn from(job: &Job) -> Self {
        Self {
            id: Some(job.id),
            name: job.name.clone(),
            cron: job.cron.clone(),
            url: job.url.clone(),
            pattern: job.pattern.clone(),
            email: job.email.clone(),
            content: job.content.clone(),
            status: job.run_status(),
        }
    }
}

impl Job {
    pub fn run_status(&self) -> RunStatus {
        self.status.parse().unwrap_or(RunStatus::Stopped)
    }

    pub fn pattern_status(&self) -> PatternStatus {
        self.pattern_status.parse().unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.run_status() == RunStatus::Running
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Apply an update request onto the stored row.
    ///
    /// The last observed value is never client-controlled. Changing what is
    /// fetched or how it is matched invalidates the previous probe result.
    pub fn apply(&mut self, input: &JobInput) {
        if self.pattern != input.pattern || self.url != input.url {
            self.pattern_status = PatternStatus::Untested.to_string();
        }
        self.name = input.name.clone();
        self.cron = input.cron.clone();
        self.url = input.url.clone();
        self.pattern = input.pattern.clone();
        self.email = input.email.clone();
        self.content = input.content.clone();
        self.status = input.status.to_string();
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Job {
    /// Insert a new job. The schedule entry is attached afterwards.
    pub async fn create(input: &JobInput, pool: &PgPool) -> Result<Self> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            INSERT INTO jobs (name, cron, url, pattern, email, content, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(&input.name)
        .bind(&input.cron)
        .bind(&input.url)
        .bind(&input.pattern)
        .bind(&input.email)
        .bind(&input.content)
        .bind(input.status.to_string())
        .fetch_one(pool)
        .await?;
        Ok(job)
    }

    /// Find a non-deleted job by ID
    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Find a non-deleted job by name
    pub async fn find_by_name(name: &str, pool: &PgPool) -> Result<Option<Self>> {
        let job = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE name = $1 AND deleted_at IS NULL",
        )
        .bind(name)
        .fetch_optional(pool)
        .await?;
        Ok(job)
    }

    /// Find all non-deleted jobs
    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Find jobs that should have a live schedule entry
    pub async fn find_running(pool: &PgPool) -> Result<Vec<Self>> {
        let jobs = sqlx::query_as::<_, Job>(
            "SELECT * FROM jobs WHERE status = 'running' AND deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(jobs)
    }

    /// Persist the definition, run status and schedule entry of a job.
    /// Leaves `last_value` untouched.
    pub async fn update(job: &Job, pool: &PgPool) -> Result<Self> {
        let updated = sqlx::query_as::<_, Job>(
            r#"
            UPDATE jobs
            SET name = $2,
                cron = $3,
                entry_id = $4,
                url = $5,
                pattern = $6,
                pattern_status = $7,
                email = $8,
                content = $9,
                status = $10,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(job.id)
        .bind(&job.name)
        .bind(&job.cron)
        .bind(job.entry_id)
        .bind(&job.url)
        .bind(&job.pattern)
        .bind(&job.pattern_status)
        .bind(&job.email)
        .bind(&job.content)
        .bind(&job.status)
        .fetch_one(pool)
        .await?;
        Ok(updated)
    }

    pub async fn set_entry_id(id: i64, entry_id: Option<Uuid>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE jobs SET entry_id = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(entry_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_last_value(id: i64, value: &str, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE jobs SET last_value = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(value)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn set_pattern_status(id: i64, status: PatternStatus, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE jobs SET pattern_status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Mark a job deleted: clears its schedule entry and stops it.
    /// The partial unique index frees the name for reuse.
    pub async fn soft_delete(id: i64, pool: &PgPool) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET deleted_at = NOW(),
                entry_id = NULL,
                status = 'stopped',
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            anyhow::bail!("Job {} not found", id);
        }
        Ok(())
    }

    /// Physically remove a row. Only used to undo a failed create.
    pub async fn hard_delete(id: i64, pool: &PgPool) -> Result<()> {
        sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(())
    }
}
