//! access token 検証 + role check → AuthCtx を extensions に入れる
//!
//! リクエストごとの流れ:
//! 1. `Authorization` ヘッダが無い/空 → 401 `token not provided`
//! 2. `Bearer ` を外して検証。期限切れは `TOKEN_EXPIRED` 付きの 401、それ以外は汎用 401
//! 3. token_type が access でなければ 401 (refresh token を業務 API に使わせない)
//! 4. ルートの必要 role のどれか 1 つを持っていなければ 403
//! 5. `AuthCtx { user_id, roles }` を extensions に格納して次へ

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header},
    middleware::{self, Next},
    response::Response,
};

use crate::api::v1::extractors::AuthCtx;
use crate::error::AppError;
use crate::services::auth::{AuthError, TokenService, TokenType, roles};
use crate::state::AppState;

#[derive(Clone)]
struct AccessPolicy {
    app: AppState,
    required_roles: Arc<[String]>,
}

/// `router` の全ルートに認証 + role check を掛ける。
///
/// `required_roles` が空なら認証済みであれば誰でも通す。
///
/// 例：
/// ```ignore
/// let admin_only = Router::new().route("/roles", get(list_roles));
/// let admin_only = middleware::auth::access::apply(admin_only, state.clone(), &[roles::ADMIN]);
/// ```
pub fn apply(
    router: Router<AppState>,
    state: AppState,
    required_roles: &[&str],
) -> Router<AppState> {
    let policy = AccessPolicy {
        app: state,
        required_roles: required_roles.iter().map(|r| r.to_string()).collect(),
    };

    // route_layer: マッチしたルートにだけ掛ける (404/405 は認証前に返る)
    router.route_layer(middleware::from_fn_with_state(policy, access_middleware))
}

async fn access_middleware(
    State(policy): State<AccessPolicy>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let auth_ctx = match authenticate(&policy.app.tokens, req.headers(), &policy.required_roles)
    {
        Ok(ctx) => ctx,
        Err(err) => {
            tracing::warn!(
                error = %err,
                required_roles = ?policy.required_roles,
                path = %req.uri().path(),
                "request rejected by access middleware"
            );
            return Err(err.into());
        }
    };

    // middleware → extractor / ownership guard への受け渡し
    req.extensions_mut().insert(auth_ctx);

    Ok(next.run(req).await)
}

/// Header extraction, token validation, type check and role check, in that order.
pub fn authenticate(
    tokens: &TokenService,
    headers: &HeaderMap,
    required_roles: &[String],
) -> Result<AuthCtx, AuthError> {
    let token = bearer_token(headers)?;
    let claims = tokens.validate(token)?;

    if claims.token_type != TokenType::Access {
        return Err(AuthError::WrongTokenType);
    }

    if let Err(err) = roles::check_roles(&claims.roles, required_roles) {
        tracing::warn!(
            user_id = claims.user_id,
            roles = ?claims.roles,
            "identity holds none of the required roles"
        );
        return Err(err);
    }

    Ok(AuthCtx::from(claims))
}

/// The `Bearer ` prefix is optional; a bare token is accepted as is.
fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let raw = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .trim();

    // "Bearer" alone (the header value arrives trimmed) means no token
    let token = match raw.strip_prefix("Bearer") {
        Some(rest) if rest.is_empty() || rest.starts_with(' ') => rest.trim_start(),
        _ => raw,
    };
    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}
