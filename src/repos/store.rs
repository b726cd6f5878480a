//! Credential Store interface.
//!
//! Handlers and the ownership guard only see these traits; `PgStore` is the production
//! implementation. Implementations must be cheap to share (`Arc<dyn CredentialStore>`).
use async_trait::async_trait;

use crate::repos::error::RepoResult;
use crate::repos::models::{
    NewProject, NewTask, NewUser, Project, ProjectChanges, Role, Task, TaskChanges, User,
    UserChanges, UserCredentials,
};

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list_users(&self) -> RepoResult<Vec<User>>;

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>>;

    // Fails with `Conflict("user")` on a duplicate email or username.
    async fn create_user(&self, new: NewUser) -> RepoResult<User>;

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>>;

    async fn delete_user(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn list_roles(&self) -> RepoResult<Vec<Role>>;

    async fn find_role(&self, id: i64) -> RepoResult<Option<Role>>;

    // Missing ids are simply absent from the result.
    async fn find_roles_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Role>>;

    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>>;

    async fn create_role(&self, name: &str) -> RepoResult<Role>;

    async fn update_role(&self, id: i64, name: &str) -> RepoResult<Option<Role>>;

    async fn delete_role(&self, id: i64) -> RepoResult<bool>;
}

#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list_projects(&self) -> RepoResult<Vec<Project>>;

    async fn list_projects_by_owner(&self, owner_id: i64) -> RepoResult<Vec<Project>>;

    async fn find_project(&self, id: i64) -> RepoResult<Option<Project>>;

    /// Single-row read used by the ownership guard.
    async fn project_owner_id(&self, id: i64) -> RepoResult<Option<i64>>;

    async fn create_project(&self, new: NewProject) -> RepoResult<Project>;

    async fn update_project(&self, id: i64, changes: ProjectChanges)
    -> RepoResult<Option<Project>>;

    async fn delete_project(&self, id: i64) -> RepoResult<bool>;

    // Association append/delete.
    // - append: `Conflict` when already attached, `NotFound` when either side is missing
    // - delete: `NotFound` when not attached
    async fn add_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()>;

    async fn remove_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()>;

    async fn add_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()>;

    async fn remove_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>>;

    async fn find_task(&self, id: i64) -> RepoResult<Option<Task>>;

    /// Single-row read used by the ownership guard.
    async fn task_owner_id(&self, id: i64) -> RepoResult<Option<i64>>;

    async fn create_task(&self, new: NewTask) -> RepoResult<Task>;

    async fn update_task(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>>;

    async fn delete_task(&self, id: i64) -> RepoResult<bool>;
}

/// Everything the HTTP layer needs from persistence.
pub trait CredentialStore: UserStore + RoleStore + ProjectStore + TaskStore {}

impl<T> CredentialStore for T where T: UserStore + RoleStore + ProjectStore + TaskStore {}
