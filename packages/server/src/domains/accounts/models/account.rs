use anyhow::Result;
use chrono::{DateTime, Utc};
use mailer::{SmtpCredentials, SmtpTable, SmtpTarget};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Shown instead of the stored credential when accounts are listed
pub const PASSWORD_MASK: &str = "******";

/// Account - a mailbox used to send change notifications
///
/// Jobs reference accounts by email address only; the account is looked up
/// when a notification is sent, so it can change without touching jobs.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub email: String,
    /// Password or app authorization token
    pub password: String,
    #[serde(rename = "host")]
    pub smtp_host: Option<String>,
    #[serde(rename = "port")]
    pub smtp_port: Option<i32>,
    pub status: String, // 'unknown', 'valid', 'invalid'
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Connectivity status of an account
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    #[default]
    Unknown,
    Valid,
    Invalid,
}

impl std::fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountStatus::Unknown => write!(f, "unknown"),
            AccountStatus::Valid => write!(f, "valid"),
            AccountStatus::Invalid => write!(f, "invalid"),
        }
    }
}

impl std::str::FromStr for AccountStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "unknown" => Ok(AccountStatus::Unknown),
            "valid" => Ok(AccountStatus::Valid),
            "invalid" => Ok(AccountStatus::Invalid),
            _ => Err(anyhow::anyhow!("Invalid account status: {}", s)),
        }
    }
}

/// Account fields as submitted through the API
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountInput {
    #[serde(default)]
    pub id: Option<i64>,
    pub email: String,
    /// May be omitted by the connectivity probe to reuse the stored credential
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub port: Option<i32>,
}

impl AccountInput {
    fn port_u16(&self) -> Option<u16> {
        self.port.and_then(|p| u16::try_from(p).ok())
    }

    pub fn smtp_target(&self, table: &SmtpTable) -> std::result::Result<SmtpTarget, mailer::MailerError> {
        table.resolve(&self.email, self.host.as_deref(), self.port_u16())
    }

    pub fn credentials(&self) -> SmtpCredentials {
        SmtpCredentials {
            username: self.email.clone(),
            password: self.password.clone(),
        }
    }
}

impl Account {
    pub fn account_status(&self) -> AccountStatus {
        self.status.parse().unwrap_or_default()
    }

    /// Resolve where this account sends from: explicit host/port when both
    /// are set, otherwise the suffix table.
    pub fn smtp_target(&self, table: &SmtpTable) -> std::result::Result<SmtpTarget, mailer::MailerError> {
        let port = self.smtp_port.and_then(|p| u16::try_from(p).ok());
        table.resolve(&self.email, self.smtp_host.as_deref(), port)
    }

    pub fn credentials(&self) -> SmtpCredentials {
        SmtpCredentials {
            username: self.email.clone(),
            password: self.password.clone(),
        }
    }

    /// Copy safe to return from list endpoints
    pub fn masked(mut self) -> Self {
        self.password = PASSWORD_MASK.to_string();
        self
    }
}

// =============================================================================
// SQL Queries - ALL queries must be in models/
// =============================================================================

impl Account {
    pub async fn create(input: &AccountInput, pool: &PgPool) -> Result<Self> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password, smtp_host, smtp_port)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&input.email)
        .bind(&input.password)
        .bind(&input.host)
        .bind(input.port)
        .fetch_one(pool)
        .await?;
        Ok(account)
    }

    pub async fn find_by_id(id: i64, pool: &PgPool) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(account)
    }

    pub async fn find_by_email(email: &str, pool: &PgPool) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE email = $1 AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(account)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        let accounts = sqlx::query_as::<_, Account>(
            "SELECT * FROM accounts WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(pool)
        .await?;
        Ok(accounts)
    }

    /// Update address, credential and SMTP override. An empty password keeps
    /// the stored one.
    pub async fn update(id: i64, input: &AccountInput, pool: &PgPool) -> Result<Option<Self>> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            UPDATE accounts
            SET email = $2,
                password = CASE WHEN $3 = '' THEN password ELSE $3 END,
                smtp_host = $4,
                smtp_port = $5,
                status = 'unknown',
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&input.email)
        .bind(&input.password)
        .bind(&input.host)
        .bind(input.port)
        .fetch_optional(pool)
        .await?;
        Ok(account)
    }

    pub async fn set_status(id: i64, status: AccountStatus, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE accounts SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status.to_string())
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Returns false when no live account had this ID
    pub async fn soft_delete(id: i64, pool: &PgPool) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE accounts SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
