/*
 * Responsibility
 * - roles テーブル向け SQLx 操作 (admin 向け CRUD + 起動時 seed)
 */
use async_trait::async_trait;

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::models::Role;
use crate::repos::pg::PgStore;
use crate::repos::store::RoleStore;

#[async_trait]
impl RoleStore for PgStore {
    async fn list_roles(&self) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles ORDER BY id"#)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn find_role(&self, id: i64) -> RepoResult<Option<Role>> {
        let row = sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles WHERE id = $1"#)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn find_roles_by_ids(&self, ids: &[i64]) -> RepoResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, Role>(
            r#"
            SELECT id, name
            FROM roles
            WHERE id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn find_role_by_name(&self, name: &str) -> RepoResult<Option<Role>> {
        let row = sqlx::query_as::<_, Role>(r#"SELECT id, name FROM roles WHERE name = $1"#)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    async fn create_role(&self, name: &str) -> RepoResult<Role> {
        let row = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (name)
            VALUES ($1)
            RETURNING id, name
            "#,
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "role"))?;

        Ok(row)
    }

    async fn update_role(&self, id: i64, name: &str) -> RepoResult<Option<Role>> {
        // Renaming does not touch tokens already issued with the old name.
        let row = sqlx::query_as::<_, Role>(
            r#"
            UPDATE roles
            SET name = $2
            WHERE id = $1
            RETURNING id, name
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "role"))?;

        Ok(row)
    }

    async fn delete_role(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(r#"DELETE FROM roles WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
