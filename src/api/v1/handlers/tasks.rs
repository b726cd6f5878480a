/*
 * Responsibility
 * - /tasks 系 handler
 * - 更新/削除は ownership guard (task) 通過後にのみ呼ばれる
 * - 作成時に project_id を指定する場合は、その project の owner (or admin) である必要がある
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    api::v1::{
        dto::tasks::{CreateTaskRequest, TaskEnvelope, TaskListResponse, UpdateTaskRequest},
        extractors::AuthCtxExtractor,
        handlers::projects::resolve_owner,
    },
    error::AppError,
    repos::models::{NewTask, TaskChanges},
    state::AppState,
};

pub async fn list_tasks(State(state): State<AppState>) -> Result<Json<TaskListResponse>, AppError> {
    let tasks = state.store.list_tasks().await?;
    Ok(Json(TaskListResponse { tasks }))
}

pub async fn create_task(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateTaskRequest>,
) -> Result<(StatusCode, Json<TaskEnvelope>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    if let Some(project_id) = req.project_id
        && !ctx.is_admin()
    {
        let owner_id = state
            .store
            .project_owner_id(project_id)
            .await?
            .ok_or(AppError::NotFound("project"))?;
        if owner_id != ctx.user_id {
            tracing::warn!(user_id = ctx.user_id, project_id, "task attach to foreign project");
            return Err(AppError::NotOwner);
        }
    }

    let task = state
        .store
        .create_task(NewTask {
            name: req.name.trim().to_string(),
            description: req.description,
            owner_id: resolve_owner(&ctx, req.owner_id),
            project_id: req.project_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TaskEnvelope { task })))
}

pub async fn get_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<TaskEnvelope>, AppError> {
    let task = state
        .store
        .find_task(task_id)
        .await?
        .ok_or(AppError::NotFound("task"))?;

    Ok(Json(TaskEnvelope { task }))
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<Json<TaskEnvelope>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let changes = TaskChanges {
        name: req.name.map(|s| s.trim().to_string()),
        description: req.description,
        owner_id: req.owner_id,
    };

    let task = state
        .store
        .update_task(task_id, changes)
        .await?
        .ok_or(AppError::NotFound("task"))?;

    Ok(Json(TaskEnvelope { task }))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_task(task_id).await? {
        return Err(AppError::NotFound("task"));
    }
    Ok(Json(json!({"message": "task deleted successfully"})))
}
