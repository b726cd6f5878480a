/*
 * Responsibility
 * - users / user_roles テーブル向け SQLx 操作
 * - role は名前ごと User に載せて返す (token 発行でそのまま使う)
 */
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};

use crate::repos::error::{RepoError, RepoResult};
use crate::repos::models::{NewUser, Role, User, UserChanges, UserCredentials};
use crate::repos::pg::PgStore;
use crate::repos::store::UserStore;

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self, roles: Vec<Role>) -> User {
        User {
            id: self.id,
            username: self.username,
            email: self.email,
            roles,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRoleRow {
    user_id: i64,
    id: i64,
    name: String,
}

async fn roles_by_user(db: &PgPool, user_ids: &[i64]) -> RepoResult<HashMap<i64, Vec<Role>>> {
    let rows = sqlx::query_as::<_, UserRoleRow>(
        r#"
        SELECT ur.user_id, r.id, r.name
        FROM user_roles ur
        JOIN roles r ON r.id = ur.role_id
        WHERE ur.user_id = ANY($1)
        ORDER BY r.name
        "#,
    )
    .bind(user_ids)
    .fetch_all(db)
    .await?;

    let mut out: HashMap<i64, Vec<Role>> = HashMap::new();
    for row in rows {
        out.entry(row.user_id).or_default().push(Role {
            id: row.id,
            name: row.name,
        });
    }
    Ok(out)
}

async fn replace_roles(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    role_ids: &[i64],
) -> RepoResult<()> {
    sqlx::query(r#"DELETE FROM user_roles WHERE user_id = $1"#)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO user_roles (user_id, role_id)
        SELECT $1, role_id FROM UNNEST($2::bigint[]) AS t(role_id)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(role_ids)
    .execute(&mut **tx)
    .await
    .map_err(|e| RepoError::from_sqlx(e, "role"))?;

    Ok(())
}

impl PgStore {
    async fn load_user(&self, row: UserRow) -> RepoResult<User> {
        let mut roles = roles_by_user(&self.pool, &[row.id]).await?;
        let user_roles = roles.remove(&row.id).unwrap_or_default();
        Ok(row.into_user(user_roles))
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn list_users(&self) -> RepoResult<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        let mut roles = roles_by_user(&self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let user_roles = roles.remove(&row.id).unwrap_or_default();
                row.into_user(user_roles)
            })
            .collect())
    }

    async fn find_user(&self, id: i64) -> RepoResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.load_user(row).await?)),
            None => Ok(None),
        }
    }

    async fn find_user_by_email(&self, email: &str) -> RepoResult<Option<UserCredentials>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let password_hash = row.password_hash.clone();
        let user = self.load_user(row).await?;
        Ok(Some(UserCredentials {
            user,
            password_hash,
        }))
    }

    async fn create_user(&self, new: NewUser) -> RepoResult<User> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "user"))?;

        replace_roles(&mut tx, row.id, &new.role_ids).await?;
        tx.commit().await?;

        self.load_user(row).await
    }

    async fn update_user(&self, id: i64, changes: UserChanges) -> RepoResult<Option<User>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash)
            WHERE id = $1
            RETURNING id, username, email, password_hash, created_at
            "#,
        )
        .bind(id)
        .bind(changes.username.as_deref())
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| RepoError::from_sqlx(e, "user"))?;

        let Some(row) = row else {
            return Ok(None);
        };

        if let Some(role_ids) = &changes.role_ids {
            replace_roles(&mut tx, id, role_ids).await?;
        }
        tx.commit().await?;

        Ok(Some(self.load_user(row).await?))
    }

    async fn delete_user(&self, id: i64) -> RepoResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
