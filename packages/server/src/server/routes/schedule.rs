use axum::{extract::Extension, Json};

use crate::common::ApiResponse;
use crate::kernel::ScheduleEntry;
use crate::server::app::AppState;

/// Live schedule entries ordered by next due time
pub async fn list_schedule_handler(
    Extension(state): Extension<AppState>,
) -> Json<ApiResponse<Vec<ScheduleEntry>>> {
    let entries = state.engine.schedule_entries().await;
    Json(ApiResponse::ok("Schedule listed", entries))
}
