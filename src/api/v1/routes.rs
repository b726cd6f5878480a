/*
 * Responsibility
 * - v1 の URL 構造と認可メタデータ (必要 role + ownership tag) を定義
 * - 同じ policy のルートを 1 つの Router にまとめ、middleware を掛けてから merge する
 *   - ownership guard を先に (内側)、access を後に (外側) 掛ける
 * - /auth 配下と /health は認証なし
 */
use axum::{
    Router,
    routing::{get, post, put},
};

use crate::api::v1::handlers::{
    auth::{login, refresh, register},
    health::health,
    projects::{
        add_project_task, add_project_user, create_project, delete_project, get_project,
        list_projects, remove_project_task, remove_project_user, update_project,
    },
    roles::{create_role, delete_role, get_role, list_roles, update_role},
    tasks::{create_task, delete_task, get_task, list_tasks, update_task},
    users::{delete_user, get_user, list_user_projects, list_users, update_user},
};
use crate::middleware::auth::{access, owner};
use crate::services::auth::roles::{ADMIN, READER};
use crate::state::AppState;

/// Any authenticated identity.
const ANY_ROLE: &[&str] = &[];

/// Public account endpoints, nested at `/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/refresh", post(refresh))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Protected business endpoints, nested at `/api/v1`.
pub fn routes(state: AppState) -> Router<AppState> {
    let admin_only = access::apply(
        Router::new()
            .route("/roles", get(list_roles).post(create_role))
            .route(
                "/roles/{role_id}",
                get(get_role).put(update_role).delete(delete_role),
            ),
        state.clone(),
        &[ADMIN],
    );

    let user_directory = access::apply(
        Router::new()
            .route("/users", get(list_users))
            .route("/users/{user_id}", get(get_user)),
        state.clone(),
        &[ADMIN, READER],
    );

    let self_service = guarded(
        Router::new()
            .route("/users/{user_id}", put(update_user).delete(delete_user))
            .route("/users/{user_id}/projects", get(list_user_projects)),
        &state,
        "user",
    );

    let open = access::apply(
        Router::new()
            .route("/projects", get(list_projects).post(create_project))
            .route("/projects/{project_id}", get(get_project))
            .route("/tasks", get(list_tasks).post(create_task))
            .route("/tasks/{task_id}", get(get_task)),
        state.clone(),
        ANY_ROLE,
    );

    let project_owner = guarded(
        Router::new()
            .route(
                "/projects/{project_id}",
                put(update_project).delete(delete_project),
            )
            .route(
                "/projects/{project_id}/users/{user_id}",
                post(add_project_user).delete(remove_project_user),
            )
            .route(
                "/projects/{project_id}/tasks/{task_id}",
                post(add_project_task).delete(remove_project_task),
            ),
        &state,
        "project",
    );

    let task_owner = guarded(
        Router::new().route(
            "/tasks/{task_id}",
            put(update_task).delete(delete_task),
        ),
        &state,
        "task",
    );

    Router::new()
        .merge(admin_only)
        .merge(user_directory)
        .merge(self_service)
        .merge(open)
        .merge(project_owner)
        .merge(task_owner)
}

/// Any authenticated identity, then the ownership rule `tag`.
fn guarded(router: Router<AppState>, state: &AppState, tag: &'static str) -> Router<AppState> {
    let router = owner::apply(router, state.clone(), tag);
    access::apply(router, state.clone(), ANY_ROLE)
}
