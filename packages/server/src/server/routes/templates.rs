use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use super::jobs::IdBody;
use crate::common::ApiResponse;
use crate::domains::templates::actions;
use crate::domains::templates::{Template, TemplateInput};
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub async fn create_template_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TemplateInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    let Json(input) = payload?;
    let template = actions::create_template(&input, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to add template", e))?;
    Ok(Json(ApiResponse::ok("Template added", template)))
}

pub async fn update_template_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<TemplateInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Template>>, ApiError> {
    let Json(input) = payload?;
    let template = actions::update_template(&input, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to update template", e))?;
    Ok(Json(ApiResponse::ok("Template updated", template)))
}

pub async fn delete_template_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(body) = payload?;
    actions::delete_template(body.id, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to delete template", e))?;
    Ok(Json(ApiResponse::message("Template deleted")))
}

pub async fn list_templates_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<Vec<Template>>>, ApiError> {
    let templates = actions::list_templates(&state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to list templates", e))?;
    Ok(Json(ApiResponse::ok("Templates listed", templates)))
}
