/*
 * Responsibility
 * - tasks CRUD
 * - owner_id は必須、project_id は任意
 */
use async_trait::async_trait;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::models::{NewTask, Task, TaskChanges};
use crate::repos::pg::PgStore;
use crate::repos::store::TaskStore;

#[async_trait]
impl TaskStore for PgStore {
    async fn list_tasks(&self) -> RepoResult<Vec<Task>> {
        let rows = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, owner_id, project_id, created_at
            FROM tasks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_task(&self, id: i64) -> RepoResult<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, name, description, owner_id, project_id, created_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    async fn task_owner_id(&self, id: i64) -> RepoResult<Option<i64>> {
        let owner = sqlx::query_scalar::<_, i64>(r#"SELECT owner_id FROM tasks WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(owner)
    }

    async fn create_task(&self, new: NewTask) -> RepoResult<Task> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (name, description, owner_id, project_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, owner_id, project_id, created_at
            "#,
        )
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.owner_id)
        .bind(new.project_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "task"))?;

        Ok(row)
    }

    async fn update_task(&self, id: i64, changes: TaskChanges) -> RepoResult<Option<Task>> {
        let row = sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                owner_id = COALESCE($4, owner_id)
            WHERE id = $1
            RETURNING id, name, description, owner_id, project_id, created_at
            "#,
        )
        .bind(id)
        .bind(changes.name.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "task"))?;

        Ok(row)
    }

    async fn delete_task(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
