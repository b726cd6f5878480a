/*
 * Responsibility
 * - projects / project_users 向け SQLx 操作
 * - task との関連は tasks.project_id で表現する (task は最大 1 project)
 * - owner_id は必須 (NULL にならない)
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::models::{NewProject, Project, ProjectChanges};
use crate::repos::pg::PgStore;
use crate::repos::store::ProjectStore;

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: i64,
    name: String,
    budget: f64,
    owner_id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct MemberRow {
    project_id: i64,
    member_id: i64,
}

async fn members(
    db: &PgPool,
    project_ids: &[i64],
) -> RepoResult<(HashMap<i64, Vec<i64>>, HashMap<i64, Vec<i64>>)> {
    let users = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT project_id, user_id AS member_id
        FROM project_users
        WHERE project_id = ANY($1)
        ORDER BY user_id
        "#,
    )
    .bind(project_ids)
    .fetch_all(db)
    .await?;

    let tasks = sqlx::query_as::<_, MemberRow>(
        r#"
        SELECT project_id, id AS member_id
        FROM tasks
        WHERE project_id = ANY($1)
        ORDER BY id
        "#,
    )
    .bind(project_ids)
    .fetch_all(db)
    .await?;

    fn group(rows: Vec<MemberRow>) -> HashMap<i64, Vec<i64>> {
        let mut out: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in rows {
            out.entry(row.project_id).or_default().push(row.member_id);
        }
        out
    }

    Ok((group(users), group(tasks)))
}

async fn assemble(db: &PgPool, rows: Vec<ProjectRow>) -> RepoResult<Vec<Project>> {
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let (mut users, mut tasks) = members(db, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| Project {
            id: row.id,
            name: row.name,
            budget: row.budget,
            owner_id: row.owner_id,
            user_ids: users.remove(&row.id).unwrap_or_default(),
            task_ids: tasks.remove(&row.id).unwrap_or_default(),
            created_at: row.created_at,
        })
        .collect())
}

async fn ensure_users_exist(
    tx: &mut Transaction<'_, Postgres>,
    user_ids: &[i64],
) -> RepoResult<()> {
    let found: i64 = sqlx::query_scalar(r#"SELECT COUNT(*) FROM users WHERE id = ANY($1)"#)
        .bind(user_ids)
        .fetch_one(&mut **tx)
        .await?;

    let mut distinct = user_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if found != distinct.len() as i64 {
        return Err(RepoError::NotFound("user"));
    }
    Ok(())
}

async fn replace_users(
    tx: &mut Transaction<'_, Postgres>,
    project_id: i64,
    user_ids: &[i64],
) -> RepoResult<()> {
    ensure_users_exist(tx, user_ids).await?;

    sqlx::query(r#"DELETE FROM project_users WHERE project_id = $1"#)
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO project_users (project_id, user_id)
        SELECT $1, user_id FROM UNNEST($2::bigint[]) AS t(user_id)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(user_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| RepoError::from_sqlx(e, "project member"))?;

    Ok(())
}

async fn replace_tasks(
    tx: &mut Transaction<'_, Postgres>,
    project_id: i64,
    task_ids: &[i64],
) -> RepoResult<()> {
    sqlx::query(r#"UPDATE tasks SET project_id = NULL WHERE project_id = $1"#)
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

    let attached = sqlx::query(r#"UPDATE tasks SET project_id = $1 WHERE id = ANY($2)"#)
        .bind(project_id)
        .bind(task_ids)
        .execute(&mut **tx)
        .await?;

    let mut distinct = task_ids.to_vec();
    distinct.sort_unstable();
    distinct.dedup();
    if attached.rows_affected() != distinct.len() as u64 {
        return Err(RepoError::NotFound("task"));
    }
    Ok(())
}

const PROJECT_COLUMNS: &str = "id, name, budget, owner_id, created_at";

#[async_trait]
impl ProjectStore for PgStore {
    async fn list_projects(&self) -> RepoResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        assemble(&self.pool, rows).await
    }

    async fn list_projects_by_owner(&self, owner_id: i64) -> RepoResult<Vec<Project>> {
        let rows = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE owner_id = $1 ORDER BY id"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        assemble(&self.pool, rows).await
    }

    async fn find_project(&self, id: i64) -> RepoResult<Option<Project>> {
        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(assemble(&self.pool, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn project_owner_id(&self, id: i64) -> RepoResult<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>(r#"SELECT owner_id FROM projects WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    async fn create_project(&self, new: NewProject) -> RepoResult<Project> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "INSERT INTO projects (name, budget, owner_id) VALUES ($1, $2, $3) \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(&new.name)
        .bind(new.budget)
        .bind(new.owner_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "project"))?;

        replace_users(&mut tx, row.id, &new.user_ids).await?;
        replace_tasks(&mut tx, row.id, &new.task_ids).await?;
        tx.commit().await?;

        Ok(assemble(&self.pool, vec![row]).await?.remove(0))
    }

    async fn update_project(
        &self,
        id: i64,
        changes: ProjectChanges,
    ) -> RepoResult<Option<Project>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, ProjectRow>(&format!(
            "UPDATE projects SET \
                name = COALESCE($2, name), \
                budget = COALESCE($3, budget), \
                owner_id = COALESCE($4, owner_id) \
             WHERE id = $1 \
             RETURNING {PROJECT_COLUMNS}"
        ))
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.budget)
        .bind(changes.owner_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "project"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(user_ids) = &changes.user_ids {
            replace_users(&mut tx, id, user_ids).await?;
        }
        if let Some(task_ids) = &changes.task_ids {
            replace_tasks(&mut tx, id, task_ids).await?;
        }
        tx.commit().await?;

        Ok(assemble(&self.pool, vec![row]).await?.pop())
    }

    async fn delete_project(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(r#"DELETE FROM projects WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()> {
        if self.project_owner_id(project_id).await?.is_none() {
            return Err(RepoError::NotFound("project"));
        }

        let user_exists: bool =
            sqlx::query_scalar(r#"SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)"#)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        if !user_exists {
            return Err(RepoError::NotFound("user"));
        }

        sqlx::query(r#"INSERT INTO project_users (project_id, user_id) VALUES ($1, $2)"#)
            .bind(project_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepoError::from_sqlx(e, "project member"))?;

        Ok(())
    }

    async fn remove_project_user(&self, project_id: i64, user_id: i64) -> RepoResult<()> {
        let result =
            sqlx::query(r#"DELETE FROM project_users WHERE project_id = $1 AND user_id = $2"#)
                .bind(project_id)
                .bind(user_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("project member"));
        }
        Ok(())
    }

    async fn add_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()> {
        if self.project_owner_id(project_id).await?.is_none() {
            return Err(RepoError::NotFound("project"));
        }

        let current = sqlx::query_scalar::<_, Option<i64>>(
            r#"SELECT project_id FROM tasks WHERE id = $1"#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await?;

        match current {
            None => Err(RepoError::NotFound("task")),
            Some(Some(pid)) if pid == project_id => Err(RepoError::Conflict("project task")),
            Some(_) => {
                sqlx::query(r#"UPDATE tasks SET project_id = $1 WHERE id = $2"#)
                    .bind(project_id)
                    .bind(task_id)
                    .execute(&self.pool)
                    .await?;
                Ok(())
            }
        }
    }

    async fn remove_project_task(&self, project_id: i64, task_id: i64) -> RepoResult<()> {
        let result = sqlx::query(
            r#"UPDATE tasks SET project_id = NULL WHERE id = $2 AND project_id = $1"#,
        )
        .bind(project_id)
        .bind(task_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound("project task"));
        }
        Ok(())
    }
}
