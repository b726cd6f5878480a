/*
 * Responsibility
 * - Credential Store が扱うドメイン型 (User / Role / Project / Task)
 * - 書き込み用の入力型 (New* / *Changes)
 */
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.name.as_str())
    }
}

/// A user together with its stored password hash. Only login reads this.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_ids: Vec<i64>,
}

/// `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub role_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub budget: f64,
    pub owner_id: i64,
    // collaborators, not owners
    pub user_ids: Vec<i64>,
    pub task_ids: Vec<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub name: String,
    pub budget: f64,
    pub owner_id: i64,
    pub user_ids: Vec<i64>,
    pub task_ids: Vec<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub budget: Option<f64>,
    pub owner_id: Option<i64>,
    pub user_ids: Option<Vec<i64>>,
    pub task_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Task {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub owner_id: i64,
    pub project_id: Option<i64>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub owner_id: Option<i64>,
}
