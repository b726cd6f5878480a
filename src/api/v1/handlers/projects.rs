/*
 * Responsibility
 * - /projects 系 handler
 * - 更新/削除/メンバー操作は ownership guard (project) 通過後にのみ呼ばれる
 * - 作成時の owner は呼び出し元。admin だけが owner_id で別ユーザーを指定できる
 * - task を project に付けられるのは task の owner だけ。別 project から外す場合はその project の owner でもあること
 */
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::{
    api::v1::{
        dto::projects::{
            CreateProjectRequest, ProjectEnvelope, ProjectListResponse, UpdateProjectRequest,
        },
        extractors::{AuthCtx, AuthCtxExtractor},
    },
    error::AppError,
    repos::models::{NewProject, ProjectChanges},
    state::AppState,
};

/// The caller, unless an administrator asked for someone else.
pub(crate) fn resolve_owner(ctx: &AuthCtx, requested: Option<i64>) -> i64 {
    match requested {
        Some(owner_id) if ctx.is_admin() => owner_id,
        _ => ctx.user_id,
    }
}

/// Non-admins may only attach their own tasks, and may not pull a task out of a
/// project they do not own (`tasks.project_id` holds a single project).
async fn authorize_task_attach(
    state: &AppState,
    ctx: &AuthCtx,
    project_id: Option<i64>,
    task_ids: &[i64],
) -> Result<(), AppError> {
    if ctx.is_admin() {
        return Ok(());
    }

    for &task_id in task_ids {
        let task = state
            .store
            .find_task(task_id)
            .await?
            .ok_or(AppError::NotFound("task"))?;

        if task.owner_id != ctx.user_id {
            tracing::warn!(user_id = ctx.user_id, task_id, "attach of a foreign task");
            return Err(AppError::NotOwner);
        }

        if let Some(current) = task.project_id
            && Some(current) != project_id
            && state.store.project_owner_id(current).await? != Some(ctx.user_id)
        {
            tracing::warn!(
                user_id = ctx.user_id,
                task_id,
                from_project = current,
                "task move out of a foreign project"
            );
            return Err(AppError::NotOwner);
        }
    }
    Ok(())
}

async fn load(state: &AppState, project_id: i64) -> Result<Json<ProjectEnvelope>, AppError> {
    let project = state
        .store
        .find_project(project_id)
        .await?
        .ok_or(AppError::NotFound("project"))?;

    Ok(Json(ProjectEnvelope { project }))
}

pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectListResponse>, AppError> {
    let projects = state.store.list_projects().await?;
    Ok(Json(ProjectListResponse { projects }))
}

pub async fn create_project(
    State(state): State<AppState>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectEnvelope>), AppError> {
    req.validate().map_err(AppError::bad_request)?;
    authorize_task_attach(&state, &ctx, None, &req.task_ids).await?;

    let project = state
        .store
        .create_project(NewProject {
            name: req.name.trim().to_string(),
            budget: req.budget,
            owner_id: resolve_owner(&ctx, req.owner_id),
            user_ids: req.user_ids,
            task_ids: req.task_ids,
        })
        .await?;

    tracing::info!(project_id = project.id, owner_id = project.owner_id, "created project");
    Ok((StatusCode::CREATED, Json(ProjectEnvelope { project })))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<ProjectEnvelope>, AppError> {
    load(&state, project_id).await
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
    Json(req): Json<UpdateProjectRequest>,
) -> Result<Json<ProjectEnvelope>, AppError> {
    req.validate().map_err(AppError::bad_request)?;
    if let Some(task_ids) = &req.task_ids {
        authorize_task_attach(&state, &ctx, Some(project_id), task_ids).await?;
    }

    let changes = ProjectChanges {
        name: req.name.map(|s| s.trim().to_string()),
        budget: req.budget,
        owner_id: req.owner_id,
        user_ids: req.user_ids,
        task_ids: req.task_ids,
    };

    let project = state
        .store
        .update_project(project_id, changes)
        .await?
        .ok_or(AppError::NotFound("project"))?;

    Ok(Json(ProjectEnvelope { project }))
}

pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Value>, AppError> {
    if !state.store.delete_project(project_id).await? {
        return Err(AppError::NotFound("project"));
    }
    Ok(Json(json!({"message": "project deleted successfully"})))
}

pub async fn add_project_user(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<ProjectEnvelope>, AppError> {
    state.store.add_project_user(project_id, user_id).await?;
    load(&state, project_id).await
}

pub async fn remove_project_user(
    State(state): State<AppState>,
    Path((project_id, user_id)): Path<(i64, i64)>,
) -> Result<Json<ProjectEnvelope>, AppError> {
    state.store.remove_project_user(project_id, user_id).await?;
    load(&state, project_id).await
}

pub async fn add_project_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
    AuthCtxExtractor(ctx): AuthCtxExtractor,
) -> Result<Json<ProjectEnvelope>, AppError> {
    authorize_task_attach(&state, &ctx, Some(project_id), &[task_id]).await?;
    state.store.add_project_task(project_id, task_id).await?;
    load(&state, project_id).await
}

pub async fn remove_project_task(
    State(state): State<AppState>,
    Path((project_id, task_id)): Path<(i64, i64)>,
) -> Result<Json<ProjectEnvelope>, AppError> {
    state.store.remove_project_task(project_id, task_id).await?;
    load(&state, project_id).await
}
