//! Postgres-backed Credential Store.
//!
//! Expected schema (migrations are managed outside this service):
//!
//! - users (id bigserial pk, username text unique, email text unique, password_hash text,
//!   created_at timestamptz default now())
//! - roles (id bigserial pk, name text unique)
//! - user_roles (user_id -> users on delete cascade, role_id -> roles on delete cascade,
//!   pk (user_id, role_id))
//! - projects (id bigserial pk, name text unique, budget double precision,
//!   owner_id bigint not null -> users on delete cascade, created_at timestamptz)
//! - project_users (project_id -> projects on delete cascade, user_id -> users on delete
//!   cascade, pk (project_id, user_id))
//! - tasks (id bigserial pk, name text, description text default '', owner_id bigint not null
//!   -> users on delete cascade, project_id bigint null -> projects on delete set null,
//!   created_at timestamptz)
use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::repos::error::{RepoError, RepoResult};

#[derive(Clone, Debug)]
pub struct PgStore {
    pub(crate) pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect eagerly so an unreachable database fails startup.
    pub async fn connect(database_url: &str, max_connections: u32) -> RepoResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await
            .map_err(RepoError::Db)?;

        Ok(Self::new(pool))
    }
}
