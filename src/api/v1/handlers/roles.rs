/*
 * Responsibility
 * - /roles CRUD (admin only、access middleware で制限済み)
 * - role 名の変更は発行済み token には反映されない (token は role 名を持つ)
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    api::v1::dto::roles::RoleRequest, error::AppError, repos::models::Role, state::AppState,
};

pub async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.store.list_roles().await?))
}

pub async fn create_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Result<(StatusCode, Json<Role>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let role = state.store.create_role(req.name.trim()).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

pub async fn get_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<Role>, AppError> {
    let role = state
        .store
        .find_role(role_id)
        .await?
        .ok_or(AppError::NotFound("role"))?;

    Ok(Json(role))
}

pub async fn update_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<Role>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let role = state
        .store
        .update_role(role_id, req.name.trim())
        .await?
        .ok_or(AppError::NotFound("role"))?;

    tracing::info!(role_id, role = %role.name, "role renamed; issued tokens keep the old name");
    Ok(Json(role))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Path(role_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_role(role_id).await? {
        return Err(AppError::NotFound("role"));
    }
    Ok(Json(json!({"message": "role deleted successfully"})))
}
