/*
 * Responsibility
 * - Projects の request/response DTO
 * - owner_id は admin が指定した場合のみ採用 (それ以外は呼び出し元が owner)
 */
use serde::{Deserialize, Serialize};

use crate::repos::models::Project;

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
    #[serde(default)]
    pub budget: f64,
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub user_ids: Vec<i64>,
    #[serde(default)]
    pub task_ids: Vec<i64>,
}

impl CreateProjectRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.name.trim().is_empty() {
            return Err("name is required");
        }
        validate_budget(self.budget)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub budget: Option<f64>,
    pub owner_id: Option<i64>,
    pub user_ids: Option<Vec<i64>>,
    pub task_ids: Option<Vec<i64>>,
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if let Some(name) = &self.name
            && name.trim().is_empty()
        {
            return Err("name cannot be empty");
        }
        if let Some(budget) = self.budget {
            validate_budget(budget)?;
        }
        Ok(())
    }
}

fn validate_budget(budget: f64) -> Result<(), &'static str> {
    if !budget.is_finite() || budget < 0.0 {
        return Err("budget must be a non-negative number");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ProjectEnvelope {
    pub project: Project,
}

#[derive(Debug, Serialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
}

#[derive(Debug, Serialize)]
pub struct UserProjectsResponse {
    pub user_id: i64,
    pub projects: Vec<Project>,
}
