use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    Json,
};

use crate::common::ApiResponse;
use crate::domains::accounts::AccountInput;
use crate::domains::watch_jobs::{probes, EngineError, PatternProbe, PipelineError};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// GET /api/v1/testpattern?id=&url=&pattern=&type=
pub async fn test_pattern_handler(
    Extension(state): Extension<AppState>,
    query: Result<Query<PatternProbe>, QueryRejection>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let Query(probe) = query?;
    match probes::test_pattern(state.engine.deps(), &probe).await {
        Ok(value) => Ok(Json(ApiResponse::ok("Pattern matched", value))),
        Err(e @ EngineError::Pipeline(PipelineError::Fetch(_))) => {
            Err(ApiError::engine("Failed to fetch page", e))
        }
        Err(e) => Err(ApiError::engine("Pattern is not valid", e)),
    }
}

/// POST /api/v1/testemail
pub async fn test_email_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AccountInput>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(input) = payload?;
    match probes::test_account(state.engine.deps(), &input).await {
        Ok(()) => Ok(Json(ApiResponse::message(
            "Account authenticated, ready to send mail",
        ))),
        Err(e) => {
            let message = match &e {
                EngineError::AccountNotFound(_) => "Email not found in stored accounts",
                EngineError::Mailer(mailer::MailerError::CannotParseSuffix(_)) => {
                    "Can't determine the SMTP host and port for this address"
                }
                EngineError::Mailer(mailer::MailerError::NoSmtpEntry(_)) => {
                    "No known SMTP host for this address, enter host and port manually"
                }
                _ => "Account authentication failed",
            };
            Err(ApiError::engine(message, e))
        }
    }
}
