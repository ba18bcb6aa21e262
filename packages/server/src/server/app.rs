//! Application setup and server configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{get, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::watch_jobs::WatchEngine;
use crate::server::routes::{
    create_account_handler, create_job_handler, create_template_handler, delete_account_handler,
    delete_job_handler, delete_template_handler, health_handler, list_accounts_handler,
    list_jobs_handler, list_schedule_handler, list_templates_handler, pause_job_handler,
    resume_job_handler, test_email_handler, test_pattern_handler, update_account_handler,
    update_job_handler, update_template_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub db_pool: PgPool,
    pub engine: Arc<WatchEngine>,
}

pub type AppState = AxumAppState;

fn api_routes() -> Router {
    Router::new()
        .route(
            "/job",
            get(list_jobs_handler)
                .post(create_job_handler)
                .put(update_job_handler)
                .delete(delete_job_handler),
        )
        .route("/job/:id/pause", put(pause_job_handler))
        .route("/job/:id/resume", put(resume_job_handler))
        .route(
            "/account",
            get(list_accounts_handler)
                .post(create_account_handler)
                .put(update_account_handler)
                .delete(delete_account_handler),
        )
        .route(
            "/template",
            get(list_templates_handler)
                .post(create_template_handler)
                .put(update_template_handler)
                .delete(delete_template_handler),
        )
        .route("/testpattern", get(test_pattern_handler))
        .route("/testemail", axum::routing::post(test_email_handler))
        .route("/schedule", get(list_schedule_handler))
}

/// Build the Axum application router
pub fn build_app(pool: PgPool, engine: Arc<WatchEngine>) -> Router {
    let app_state = AxumAppState {
        db_pool: pool,
        engine,
    };

    // CORS configuration - allow any origin (the UI is served separately)
    let cors = CorsLayer::permissive();

    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
