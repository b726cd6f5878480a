/*
 * Responsibility
 * - /users 系 handler (一覧/取得は admin + reader、更新/削除は本人 or admin)
 * - 所有者チェックは ownership guard 済み。ここでは role_ids 変更の admin 制限だけ見る
 */
use axum::{
    Json,
    extract::{Path, State},
};
use serde_json::{Value, json};

use crate::{
    api::v1::{
        dto::{
            projects::UserProjectsResponse,
            users::{UpdateUserRequest, UserResponse},
        },
        extractors::AuthCtxExtractor,
    },
    error::AppError,
    repos::models::UserChanges,
    state::AppState,
};

pub async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<UserResponse>>, AppError> {
    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(user.into()))
}

pub async fn update_user(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Path(user_id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserResponse>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    if let Some(role_ids) = &req.role_ids {
        if !ctx.is_admin() {
            tracing::warn!(user_id = ctx.user_id, target = user_id, "role change by non-admin");
            return Err(AppError::InsufficientRole);
        }
        let mut wanted = role_ids.clone();
        wanted.sort_unstable();
        wanted.dedup();
        if state.store.find_roles_by_ids(&wanted).await?.len() != wanted.len() {
            return Err(AppError::NotFound("role"));
        }
    }

    let password_hash = match &req.password {
        Some(plain) => Some(state.passwords.hash(plain)?),
        None => None,
    };

    let changes = UserChanges {
        username: req.username.map(|s| s.trim().to_string()),
        email: req.email.map(|s| s.trim().to_string()),
        password_hash,
        role_ids: req.role_ids,
    };

    let user = state
        .store
        .update_user(user_id, changes)
        .await?
        .ok_or(AppError::NotFound("user"))?;

    Ok(Json(user.into()))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_user(user_id).await? {
        return Err(AppError::NotFound("user"));
    }
    Ok(Json(json!({"message": "user deleted successfully"})))
}

pub async fn list_user_projects(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserProjectsResponse>, AppError> {
    let projects = state.store.list_projects_by_owner(user_id).await?;
    Ok(Json(UserProjectsResponse { user_id, projects }))
}
