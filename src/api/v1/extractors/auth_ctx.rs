/*
 * Responsibility
 * - Handler / ownership guard から見える「認証済みコンテキスト」
 * - access middleware が token を検証して request extensions に格納する
 * - AuthCtxExtractor はそれを handler 引数として取り出す
 */
use std::collections::BTreeSet;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::auth::{Claims, roles};
use crate::state::AppState;

/// 認証済みのリクエストに付与されるコンテキスト
///
/// - `user_id` は users.id
/// - `roles` は token 発行時点の role 名 (リクエストごとに store を読み直さない)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCtx {
    pub user_id: i64,
    pub roles: BTreeSet<String>,
}

impl AuthCtx {
    pub fn new(user_id: i64, roles: BTreeSet<String>) -> Self {
        Self { user_id, roles }
    }

    pub fn is_admin(&self) -> bool {
        roles::is_admin(&self.roles)
    }
}

impl From<Claims> for AuthCtx {
    fn from(claims: Claims) -> Self {
        Self::new(claims.user_id, claims.roles)
    }
}

/// access middleware を通ったルートでのみ使う。無ければ 401
pub struct AuthCtxExtractor(pub AuthCtx);

impl FromRequestParts<AppState> for AuthCtxExtractor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthCtx>() {
            Some(ctx) => Ok(Self(ctx.clone())),
            None => Err(AppError::Unauthorized("user not found in context")),
        }
    }
}
