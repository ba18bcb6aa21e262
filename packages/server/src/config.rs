use anyhow::{Context, Result};
use dotenvy::dotenv;
use mailer::SmtpTable;
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8848;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_EMAIL_SUBJECT: &str = "[Update] {name} has changed!";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub watch: WatchSettings,
    /// Extra suffix entries layered over the built-in SMTP table
    pub smtp_table_path: Option<String>,
}

/// Settings the watch pipeline and notifier read at run time
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub request_timeout: Duration,
    pub user_agent: String,
    /// `{name}` is replaced by the job name
    pub email_subject: String,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            email_subject: DEFAULT_EMAIL_SUBJECT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let request_timeout_secs: u64 = env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| DEFAULT_REQUEST_TIMEOUT_SECS.to_string())
            .parse()
            .context("REQUEST_TIMEOUT_SECS must be a whole number of seconds")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .context("PORT must be a valid number")?,
            watch: WatchSettings {
                request_timeout: Duration::from_secs(request_timeout_secs),
                user_agent: env::var("USER_AGENT")
                    .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
                email_subject: env::var("EMAIL_SUBJECT")
                    .unwrap_or_else(|_| DEFAULT_EMAIL_SUBJECT.to_string()),
            },
            smtp_table_path: env::var("SMTP_TABLE_PATH").ok().filter(|p| !p.is_empty()),
        })
    }

    /// Built-in SMTP table, extended from `SMTP_TABLE_PATH` when set
    pub fn load_smtp_table(&self) -> Result<SmtpTable> {
        let mut table = SmtpTable::builtin();
        if let Some(path) = &self.smtp_table_path {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read SMTP table {}", path))?;
            let added = table
                .extend_from_json(&raw)
                .with_context(|| format!("Failed to parse SMTP table {}", path))?;
            tracing::info!(path = %path, entries = added, "Loaded extra SMTP entries");
        }
        Ok(table)
    }
}
