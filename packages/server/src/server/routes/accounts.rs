use axum::{
    extract::{rejection::JsonRejection, Extension},
    Json,
};

use super::jobs::IdBody;
use crate::common::ApiResponse;
use crate::domains::accounts::actions;
use crate::domains::accounts::{Account, AccountInput};
use crate::server::app::AppState;
use crate::server::error::ApiError;

pub async fn create_account_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AccountInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let Json(input) = payload?;
    let account = actions::create_account(&input, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to add account", e))?;
    Ok(Json(ApiResponse::ok("Account added", account)))
}

pub async fn update_account_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<AccountInput>, JsonRejection>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let Json(input) = payload?;
    let account = actions::update_account(&input, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to update account", e))?;
    Ok(Json(ApiResponse::ok("Account updated", account)))
}

pub async fn delete_account_handler(
    Extension(state): Extension<AppState>,
    payload: Result<Json<IdBody>, JsonRejection>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let Json(body) = payload?;
    actions::delete_account(body.id, &state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to delete account", e))?;
    Ok(Json(ApiResponse::message("Account deleted")))
}

pub async fn list_accounts_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let accounts = actions::list_accounts(&state.db_pool)
        .await
        .map_err(|e| ApiError::record("Failed to list accounts", e))?;
    Ok(Json(ApiResponse::ok("Accounts listed", accounts)))
}
