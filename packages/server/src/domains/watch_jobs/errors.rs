use mailer::MailerError;
use thiserror::Error;

use super::matcher::PatternError;
use crate::kernel::{FetchError, ScheduleError};

/// A pipeline run that stopped before comparing values
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Why a changed value could not be mailed
#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("No account found for `{0}`")]
    AccountNotFound(String),

    #[error(transparent)]
    Mailer(#[from] MailerError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

/// Errors from job lifecycle operations and probes
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Job `{0}` already exists")]
    DuplicateName(String),

    #[error("Job {0} not found")]
    JobNotFound(i64),

    #[error("No account found for `{0}`")]
    AccountNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("pattern type `{0}` is not found")]
    UnknownPatternType(String),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Mailer(#[from] MailerError),

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),

    /// The compensating step after `cause` failed too
    #[error("Rolling back job {job_id} failed after `{cause}`: {rollback}")]
    RollbackFailed {
        job_id: i64,
        cause: String,
        rollback: String,
    },
}

impl From<PatternError> for EngineError {
    fn from(e: PatternError) -> Self {
        EngineError::Pipeline(PipelineError::Pattern(e))
    }
}
