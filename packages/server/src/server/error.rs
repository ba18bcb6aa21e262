//! Failure responses for the HTTP boundary.
//!
//! Input errors map to 4xx, failures of a page or SMTP server to 502, and
//! store or consistency errors to 500. Every failure carries the envelope.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mailer::MailerError;

use crate::common::{ApiResponse, RecordError};
use crate::domains::watch_jobs::{EngineError, PatternError, PipelineError};
use crate::kernel::ScheduleError;

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub reason: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            status,
            message: message.into(),
            reason: reason.to_string(),
        }
    }

    pub fn engine(message: impl Into<String>, error: EngineError) -> Self {
        let status = engine_status(&error);
        if status.is_server_error() {
            tracing::error!(status = %status, error = %error, "Request failed");
        }
        Self::new(status, message, error)
    }

    pub fn record(message: impl Into<String>, error: RecordError) -> Self {
        let status = match &error {
            RecordError::Duplicate { .. } => StatusCode::CONFLICT,
            RecordError::NotFound { .. } => StatusCode::NOT_FOUND,
            RecordError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RecordError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(status = %status, error = %error, "Request failed");
        }
        Self::new(status, message, error)
    }
}

fn mailer_status(error: &MailerError) -> StatusCode {
    match error {
        MailerError::InvalidAddress { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::BAD_GATEWAY,
    }
}

pub fn engine_status(error: &EngineError) -> StatusCode {
    match error {
        EngineError::DuplicateName(_) => StatusCode::CONFLICT,
        EngineError::JobNotFound(_) | EngineError::AccountNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidInput(_) | EngineError::UnknownPatternType(_) => {
            StatusCode::BAD_REQUEST
        }
        EngineError::Schedule(ScheduleError::InvalidExpression { .. }) => StatusCode::BAD_REQUEST,
        EngineError::Schedule(ScheduleError::Scheduler(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Pipeline(PipelineError::Fetch(_)) => StatusCode::BAD_GATEWAY,
        EngineError::Pipeline(PipelineError::Pattern(PatternError::NoMatch(_))) => {
            StatusCode::BAD_GATEWAY
        }
        EngineError::Pipeline(PipelineError::Pattern(_)) => StatusCode::BAD_REQUEST,
        EngineError::Pipeline(PipelineError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        EngineError::Mailer(e) => mailer_status(e),
        EngineError::Store(_) | EngineError::RollbackFailed { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "Failed to parse JSON body", rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), "Invalid query parameters", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ApiResponse::failure(self.message, self.reason)),
        )
            .into_response()
    }
}
