use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use std::time::Duration;

use crate::server::app::AppState;

const DB_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
    connection_pool: PoolHealth,
    /// Live schedule entries
    scheduled_jobs: usize,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    reachable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct PoolHealth {
    size: u32,
    idle: usize,
    max: u32,
}

/// GET /health - 200 when the database answers, 503 otherwise
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let probe = sqlx::query("SELECT 1").execute(&state.db_pool);
    let database = match tokio::time::timeout(DB_PROBE_TIMEOUT, probe).await {
        Ok(Ok(_)) => DatabaseHealth {
            reachable: true,
            error: None,
        },
        Ok(Err(e)) => DatabaseHealth {
            reachable: false,
            error: Some(format!("Query failed: {}", e)),
        },
        Err(_) => DatabaseHealth {
            reachable: false,
            error: Some(format!("Query timeout (>{}s)", DB_PROBE_TIMEOUT.as_secs())),
        },
    };

    let connection_pool = PoolHealth {
        size: state.db_pool.size(),
        idle: state.db_pool.num_idle(),
        max: state.db_pool.options().get_max_connections(),
    };

    let scheduled_jobs = state.engine.schedule_entries().await.len();

    let (code, status) = if database.reachable {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        code,
        Json(HealthResponse {
            status,
            database,
            connection_pool,
            scheduled_jobs,
        }),
    )
}
