//! User-triggered diagnostics. Neither probe touches the schedule.

use serde::Deserialize;
use tracing::info;

use super::errors::{EngineError, PipelineError};
use super::matcher::ExtractionPattern;
use super::models::PatternStatus;
use super::pipeline::fetch_content;
use crate::domains::accounts::models::{AccountInput, AccountStatus};
use crate::kernel::ServerDeps;

/// The only supported pattern type: regular expressions
pub const REGEX_PATTERN_TYPE: &str = "re";

#[derive(Debug, Clone, Deserialize)]
pub struct PatternProbe {
    /// When set, the job's pattern status is updated with the result
    #[serde(default)]
    pub id: Option<i64>,
    pub url: String,
    pub pattern: String,
    #[serde(rename = "type", default)]
    pub pattern_type: Option<String>,
}

/// Fetch `url` and apply `pattern`, returning the extracted value
pub async fn test_pattern(deps: &ServerDeps, probe: &PatternProbe) -> Result<String, EngineError> {
    let pattern_type = probe
        .pattern_type
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(REGEX_PATTERN_TYPE);
    if pattern_type != REGEX_PATTERN_TYPE {
        return Err(EngineError::UnknownPatternType(pattern_type.to_string()));
    }

    // Unknown ids are ignored, as if none was given
    let job_id = match probe.id {
        Some(id) => deps.store.find_job(id).await?.map(|job| job.id),
        None => None,
    };

    let content = fetch_content(deps, &probe.url).await?;
    let result = ExtractionPattern::compile(&probe.pattern).and_then(|p| p.extract(&content));

    match result {
        Ok(value) => {
            if let Some(id) = job_id {
                deps.store
                    .set_job_pattern_status(id, PatternStatus::Valid)
                    .await?;
            }
            info!(job_id = ?job_id, value = %value, "Pattern probe matched");
            Ok(value)
        }
        Err(e) => {
            if let Some(id) = job_id {
                deps.store
                    .set_job_pattern_status(id, PatternStatus::Invalid)
                    .await?;
            }
            info!(job_id = ?job_id, error = %e, "Pattern probe failed");
            Err(PipelineError::Pattern(e).into())
        }
    }
}

/// Authenticate against the account's SMTP server without sending mail.
///
/// An empty password falls back to the stored credential for that email.
/// With an account id, the connectivity status is recorded.
pub async fn test_account(deps: &ServerDeps, input: &AccountInput) -> Result<(), EngineError> {
    let mut input = input.clone();

    if input.password.is_empty() {
        let stored = deps
            .store
            .find_account_by_email(&input.email)
            .await?
            .ok_or_else(|| EngineError::AccountNotFound(input.email.clone()))?;
        input.password = stored.password;
    }

    let account_id = match input.id {
        Some(id) => deps.store.find_account(id).await?.map(|account| account.id),
        None => None,
    };

    let result = match input.smtp_target(&deps.smtp_table) {
        Ok(target) => deps.mailer.verify(&target, &input.credentials()).await,
        Err(e) => Err(e),
    };

    let status = if result.is_ok() {
        AccountStatus::Valid
    } else {
        AccountStatus::Invalid
    };
    if let Some(id) = account_id {
        deps.store.set_account_status(id, status).await?;
    }
    info!(email = %input.email, status = %status, "Account probe finished");

    result.map_err(EngineError::from)
}
