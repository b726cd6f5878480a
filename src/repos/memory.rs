//! In-process Credential Store for router-level tests.
//!
//! Same contract as `PgStore` (conflict / not-found semantics included), but ids can be
//! pinned so tests can talk about "task 42 owned by user 9".
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::models::{
    NewProject, NewTask, NewUser, Project, ProjectChanges, Role, Task, TaskChanges, User,
    UserChanges, UserCredentials,
};
use crate::repos::store::{ProjectStore, RoleStore, TaskStore, UserStore};

struct UserRecord {
    username: String,
    email: String,
    password_hash: String,
    role_ids: BTreeSet<i64>,
    created_at: chrono::DateTime<Utc>,
}

struct ProjectRecord {
    name: String,
    budget: f64,
    owner_id: i64,
    user_ids: BTreeSet<i64>,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    users: BTreeMap<i64, UserRecord>,
    roles: BTreeMap<i64, String>,
    projects: BTreeMap<i64, ProjectRecord>,
    tasks: BTreeMap<i64, Task>,
}

impl Inner {
    fn alloc(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn pin(&mut self, id: i64) {
        self.next_id = self.next_id.max(id);
    }

    fn user(&self, id: i64) -> Option<User> {
        let rec = self.users.get(&id)?;
        let roles = rec
            .role_ids
            .iter()
            .filter_map(|rid| {
                self.roles.get(rid).map(|name| Role {
                    id: *rid,
                    name: name.clone(),
                })
            })
            .collect();

        Some(User {
            id,
            username: rec.username.clone(),
            email: rec.email.clone(),
            roles,
            created_at: rec.created_at,
        })
    }

    fn project(&self, id: i64) -> Option<Project> {
        let rec = self.projects.get(&id)?;
        let task_ids = self
            .tasks
            .values()
            .filter(|t| t.project_id == Some(id))
            .map(|t| t.id)
            .collect();

        Some(Project {
            id,
            name: rec.name.clone(),
            budget: rec.budget,
            owner_id: rec.owner_id,
            user_ids: rec.user_ids.iter().copied().collect(),
            task_ids,
            created_at: rec.created_at,
        })
    }

    fn taken(&self, id: Option<i64>, username: &str, email: &str) -> bool {
        self.users
            .iter()
            .any(|(uid, u)| Some(*uid) != id && (u.username == username || u.email == email))
    }

    fn role_ids_exist(&self, ids: &[i64]) -> RepoResult<()> {
        if ids.iter().all(|id| self.roles.contains_key(id)) {
            Ok(())
        } else {
            Err(RepoError::NotFound("role"))
        }
    }

    fn users_exist(&self, ids: &[i64]) -> RepoResult<()> {
        if ids.iter().all(|id| self.users.contains_key(id)) {
            Ok(())
        } else {
            Err(RepoError::NotFound("user"))
        }
    }

    fn attach_tasks(&mut self, project_id: i64, task_ids: &[i64]) -> RepoResult<()> {
        if !task_ids.iter().all(|id| self.tasks.contains_key(id)) {
            return Err(RepoError::NotFound("task"));
        }
        for task in self.tasks.values_mut() {
            if task.project_id == Some(project_id) {
                task.project_id = None;
            }
            if task_ids.contains(&task.id) {
                task.project_id = Some(project_id);
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user with a fixed id, creating any role names that do not exist yet.
    pub fn seed_user(&self, id: i64, email: &str, password_hash: &str, roles: &[&str]) {
        let mut inner = self.inner.lock().unwrap();
        inner.pin(id);

        let mut role_ids = BTreeSet::new();
        for name in roles {
            let existing = inner
                .roles
                .iter()
                .find(|(_, n)| n.as_str() == *name)
                .map(|(rid, _)| *rid);
            let rid = match existing {
                Some(rid) => rid,
                None => {
                    let rid = inner.alloc();
                    inner.roles.insert(rid, name.to_string());
                    rid
                }
            };
            role_ids.insert(rid);
        }

        inner.users.insert(
            id,
            UserRecord {
                username: format!("user{id}"),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role_ids,
                created_at: Utc::now(),
            },
        );
    }

    pub fn seed_project(&self, id: i64, owner_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.pin(id);
        inner.projects.insert(
            id,
            ProjectRecord {
                name: format!("project{id}"),
                budget: 0.0,
                owner_id,
                user_ids: BTreeSet::new(),
                created_at: Utc::now(),
            },
        );
    }

    pub fn seed_task(&self, id: i64, owner_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        inner.pin(id);
        inner.tasks.insert(
            id,
            Task {
                id,
                name: format!("task{id}"),
                description: String::new(),
                owner_id,
                project_id: None,
                created_at: Utc::now(),
            },
        );
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.keys().filter_map(|id| inner.user(*id)).collect())
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        Ok(self.inner.lock().unwrap().user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let inner = self.inner.lock().unwrap();
        let found = inner.users.iter().find(|(_, u)| u.email == email);

        Ok(found.and_then(|(id, rec)| {
            inner.user(*id).map(|user| UserCredentials {
                user,
                password_hash: rec.password_hash.clone(),
            })
        }))
    }

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.taken(None, &new.username, &new.email) {
            return Err(RepoError::Conflict("user"));
        }
        inner.role_ids_exist(&new.role_ids)?;

        let id = inner.alloc();
        inner.users.insert(
            id,
            UserRecord {
                username: new.username,
                email: new.email,
                password_hash: new.password_hash,
                role_ids: new.role_ids.into_iter().collect(),
                created_at: Utc::now(),
            },
        );

        inner.user(id).ok_or(RepoError::NotFound("user"))
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(current) = inner.users.get(&id) else {
            return Ok(None);
        };

        let username = changes.username.unwrap_or_else(|| current.username.clone());
        let email = changes.email.unwrap_or_else(|| current.email.clone());
        if inner.taken(Some(id), &username, &email) {
            return Err(RepoError::Conflict("user"));
        }
        if let Some(role_ids) = &changes.role_ids {
            inner.role_ids_exist(role_ids)?;
        }

        if let Some(rec) = inner.users.get_mut(&id) {
            rec.username = username;
            rec.email = email;
            if let Some(hash) = changes.password_hash {
                rec.password_hash = hash;
            }
            if let Some(role_ids) = changes.role_ids {
                rec.role_ids = role_ids.into_iter().collect();
            }
        }

        Ok(inner.user(id))
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.users.remove(&id).is_some();
        if removed {
            inner.projects.retain(|_, p| p.owner_id != id);
            inner.tasks.retain(|_, t| t.owner_id != id);
            for project in inner.projects.values_mut() {
                project.user_ids.remove(&id);
            }
        }
        Ok(removed)
    }
}

#[async_trait]
impl RoleStore for MemoryStore {
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .iter()
            .map(|(id, name)| Role {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn find_role(&self, id: i64) -> RepoResult<Option<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.roles.get(&id).map(|name| Role {
            id,
            name: name.clone(),
        }))
    }

    async fn find_roles_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .iter()
            .filter(|(id, _)| ids.contains(id))
            .map(|(id, name)| Role {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .roles
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(id, n)| Role {
                id: *id,
                name: n.clone(),
            }))
    }

    async fn create_role(&self, name: &str) -> RepoResult<Role> {
        let mut inner = self.inner.lock().unwrap();
        if inner.roles.values().any(|n| n == name) {
            return Err(RepoError::Conflict("role"));
        }
        let id = inner.alloc();
        inner.roles.insert(id, name.to_string());
        Ok(Role {
            id,
            name: name.to_string(),
        })
    }

    async fn update_role(&self, id: i64, name: &str) -> RepoResult<Option<Role>> {
        let mut inner = self.inner.lock().unwrap();
        if inner.roles.iter().any(|(rid, n)| *rid != id && n == name) {
            return Err(RepoError::Conflict("role"));
        }
        Ok(inner.roles.get_mut(&id).map(|current| {
            *current = name.to_string();
            Role {
                id,
                name: name.to_string(),
            }
        }))
    }

    async fn delete_role(&self, id: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.roles.remove(&id).is_some();
        for user in inner.users.values_mut() {
            user.role_ids.remove(&id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .projects
            .keys()
            .filter_map(|id| inner.project(*id))
            .collect())
    }

    async fn list_projects_by_owner(&self, owner_id: i64) -> RepoResult<Vec<Project>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .projects
            .iter()
            .filter(|(_, p)| p.owner_id == owner_id)
            .filter_map(|(id, _)| inner.project(*id))
            .collect())
    }

    async fn find_project(&self, id: i64) -> RepoResult<Option<Project>> {
        Ok(self.inner.lock().unwrap().project(id))
    }

    async fn project_owner_id(&self, id: i64) -> RepoResult<Option<i64>> {
        Ok(self.inner.lock().unwrap().projects.get(&id).map(|p| p.owner_id))
    }

    async fn create_project(&self, new: NewProject) -> RepoResult<Project> {
        let mut inner = self.inner.lock().unwrap();
        if inner.projects.values().any(|p| p.name == new.name) {
            return Err(RepoError::Conflict("project"));
        }
        inner.users_exist(&[new.owner_id])?;
        inner.users_exist(&new.user_ids)?;

        let id = inner.alloc();
        inner.projects.insert(
            id,
            ProjectRecord {
                name: new.name,
                budget: new.budget,
                owner_id: new.owner_id,
                user_ids: new.user_ids.into_iter().collect(),
                created_at: Utc::now(),
            },
        );
        inner.attach_tasks(id, &new.task_ids)?;

        inner.project(id).ok_or(RepoError::NotFound("project"))
    }

    async fn update_project(
        &self,
        id: i64,
        changes: ProjectChanges,
    ) -> RepoResult<Option<Project>> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.projects.contains_key(&id) {
            return Ok(None);
        }
        if let Some(name) = &changes.name
            && inner
                .projects
                .iter()
                .any(|(pid, p)| *pid != id && &p.name == name)
        {
            return Err(RepoError::Conflict("project"));
        }
        if let Some(owner_id) = changes.owner_id {
            inner.users_exist(&[owner_id])?;
        }
        if let Some(user_ids) = &changes.user_ids {
            inner.users_exist(user_ids)?;
        }
        if let Some(task_ids) = &changes.task_ids {
            inner.attach_tasks(id, task_ids)?;
        }

        if let Some(rec) = inner.projects.get_mut(&id) {
            if let Some(name) = changes.name {
                rec.name = name;
            }
            if let Some(budget) = changes.budget {
                rec.budget = budget;
            }
            if let Some(owner_id) = changes.owner_id {
                rec.owner_id = owner_id;
            }
            if let Some(user_ids) = changes.user_ids {
                rec.user_ids = user_ids.into_iter().collect();
            }
        }

        Ok(inner.project(id))
    }

    async fn delete_project(&self, id: i64) -> RepoResult<bool> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner.projects.remove(&id).is_some();
        for task in inner.tasks.values_mut() {
            if task.project_id == Some(id) {
                task.project_id = None;
            }
        }
        Ok(removed)
    }

    async fn add_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.users_exist(&[user_id])?;
        let project = inner
            .projects
            .get_mut(&project_id)
            .ok_or(RepoError::NotFound("project"))?;

        if !project.user_ids.insert(user_id) {
            return Err(RepoError::Conflict("project member"));
        }
        Ok(())
    }

    async fn remove_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let removed = inner
            .projects
            .get_mut(&project_id)
            .is_some_and(|p| p.user_ids.remove(&user_id));

        if removed {
            Ok(())
        } else {
            Err(RepoError::NotFound("project member"))
        }
    }

    async fn add_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if !inner.projects.contains_key(&project_id) {
            return Err(RepoError::NotFound("project"));
        }
        let task = inner
            .tasks
            .get_mut(&task_id)
            .ok_or(RepoError::NotFound("task"))?;

        if task.project_id == Some(project_id) {
            return Err(RepoError::Conflict("project task"));
        }
        task.project_id = Some(project_id);
        Ok(())
    }

    async fn remove_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()> {
        let mut inner = self.inner.lock().unwrap();
        match inner.tasks.get_mut(&task_id) {
            Some(task) if task.project_id == Some(project_id) => {
                task.project_id = None;
                Ok(())
            }
            _ => Err(RepoError::NotFound("project task")),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        Ok(self.inner.lock().unwrap().tasks.values().cloned().collect())
    }

    async fn find_task(&self, id: i64) -> RepoResult<Option<Task>> {
        Ok(self.inner.lock().unwrap().tasks.get(&id).cloned())
    }

    async fn task_owner_id(&self, id: i64) -> RepoResult<Option<i64>> {
        Ok(self.inner.lock().unwrap().tasks.get(&id).map(|t| t.owner_id))
    }

    async fn create_task(&self, new: NewTask) -> RepoResult<Task> {
        let mut inner = self.inner.lock().unwrap();
        inner.users_exist(&[new.owner_id])?;
        if let Some(pid) = new.project_id
            && !inner.projects.contains_key(&pid)
        {
            return Err(RepoError::NotFound("project"));
        }

        let id = inner.alloc();
        let task = Task {
            id,
            name: new.name,
            description: new.description,
            owner_id: new.owner_id,
            project_id: new.project_id,
            created_at: Utc::now(),
        };
        inner.tasks.insert(id, task.clone());
        Ok(task)
    }

    async fn update_task(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(owner_id) = changes.owner_id {
            inner.users_exist(&[owner_id])?;
        }

        Ok(inner.tasks.get_mut(&id).map(|task| {
            if let Some(name) = changes.name {
                task.name = name;
            }
            if let Some(description) = changes.description {
                task.description = description;
            }
            if let Some(owner_id) = changes.owner_id {
                task.owner_id = owner_id;
            }
            task.clone()
        }))
    }

    async fn delete_task(&self, id: i64) -> RepoResult<bool> {
        Ok(self.inner.lock().unwrap().tasks.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_user(1, "owner@example.com", "x", &["Usuario"]);
        store.seed_user(2, "member@example.com", "x", &["Usuario"]);
        store.seed_project(5, 1);
        store.seed_task(42, 1);
        store
    }

    #[tokio::test]
    async fn duplicate_collaborator_is_a_conflict() {
        let store = store();

        store.add_project_user(5, 2).await.unwrap();
        assert!(matches!(
            store.add_project_user(5, 2).await,
            Err(RepoError::Conflict(_))
        ));
        assert_eq!(store.find_project(5).await.unwrap().unwrap().user_ids, [2]);
    }

    #[tokio::test]
    async fn removing_a_non_member_is_not_found() {
        let store = store();

        assert!(matches!(
            store.remove_project_user(5, 2).await,
            Err(RepoError::NotFound(_))
        ));
        assert!(matches!(
            store.remove_project_task(5, 42).await,
            Err(RepoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn task_moves_between_projects() {
        let store = store();
        store.seed_project(6, 1);

        store.add_project_task(5, 42).await.unwrap();
        store.add_project_task(6, 42).await.unwrap();

        assert!(store.find_project(5).await.unwrap().unwrap().task_ids.is_empty());
        assert_eq!(store.find_project(6).await.unwrap().unwrap().task_ids, [42]);
        assert_eq!(store.find_task(42).await.unwrap().unwrap().project_id, Some(6));
    }

    #[tokio::test]
    async fn allocated_ids_do_not_collide_with_pinned_ones() {
        let store = store();

        let role = store.create_role("Auditor").await.unwrap();
        assert!(role.id > 42);
    }
}
