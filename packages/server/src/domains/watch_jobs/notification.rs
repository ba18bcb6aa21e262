//! Change notifications.
//!
//! The sending account is the one registered under the job's recipient
//! address; it is resolved at send time, so accounts can change freely.

use mailer::OutgoingEmail;
use tracing::info;

use super::errors::NotificationError;
use super::models::Job;
use crate::kernel::ServerDeps;

/// Replaced by the extracted value
pub const TARGET_PLACEHOLDER: &str = "%target%";
/// Replaced by the job name
pub const NAME_PLACEHOLDER: &str = "%name%";
/// Replaced by the job name in the subject format
pub const SUBJECT_NAME_PLACEHOLDER: &str = "{name}";

/// Substitute the value first, then the job name
pub fn render_body(template: &str, value: &str, job_name: &str) -> String {
    template
        .replace(TARGET_PLACEHOLDER, value)
        .replace(NAME_PLACEHOLDER, job_name)
}

pub fn render_subject(format: &str, job_name: &str) -> String {
    format.replace(SUBJECT_NAME_PLACEHOLDER, job_name)
}

/// Mail `value` to the job's recipient through the matching account
pub async fn notify_change(
    deps: &ServerDeps,
    job: &Job,
    value: &str,
) -> Result<(), NotificationError> {
    let account = deps
        .store
        .find_account_by_email(&job.email)
        .await?
        .ok_or_else(|| NotificationError::AccountNotFound(job.email.clone()))?;

    let target = account.smtp_target(&deps.smtp_table)?;
    let email = OutgoingEmail {
        to: vec![job.email.clone()],
        subject: render_subject(&deps.settings.email_subject, &job.name),
        html_body: render_body(&job.content, value, &job.name),
    };

    deps.mailer
        .send(&target, &account.credentials(), &email)
        .await?;

    info!(
        job_id = job.id,
        host = %target.host,
        port = target.port,
        "Change notification sent"
    );
    Ok(())
}
