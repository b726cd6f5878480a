/*
 * Responsibility
 * - POST /auth/register, /auth/login, /auth/refresh (access middleware の外側)
 * - register は常に Usuario role のみ付与 (role の自己申告はさせない)
 * - refresh は `Refresh-Token` ヘッダの token の claims だけから新しい pair を作る
 */
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use tracing::{info, warn};

use crate::{
    api::v1::dto::{
        auth::{LoginRequest, RegisterRequest, TokenPairResponse},
        users::UserResponse,
    },
    error::AppError,
    middleware::cors::REFRESH_TOKEN_HEADER,
    repos::models::NewUser,
    services::auth::{TokenSubject, roles},
    state::AppState,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AppError> {
    req.validate().map_err(AppError::bad_request)?;

    let default_role = state
        .store
        .find_role_by_name(roles::USER)
        .await?
        .ok_or_else(|| {
            tracing::error!(role = roles::USER, "default role missing; was the store seeded?");
            AppError::Internal
        })?;

    let user = state
        .store
        .create_user(NewUser {
            username: req.username.trim().to_string(),
            email: req.email.trim().to_string(),
            password_hash: state.passwords.hash(&req.password)?,
            role_ids: vec![default_role.id],
        })
        .await?;

    info!(user_id = user.id, "registered user");
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AppError> {
    req.validate().map_err(AppError::bad_request)?;

    // unknown email and wrong password are indistinguishable to the client
    let Some(creds) = state.store.find_user_by_email(req.email.trim()).await? else {
        warn!("login failed: unknown email");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    };
    if !state.passwords.verify(&req.password, &creds.password_hash) {
        warn!(user_id = creds.user.id, "login failed: wrong password");
        return Err(AppError::Unauthorized(INVALID_CREDENTIALS));
    }

    let pair = state
        .tokens
        .issue_token_pair(&TokenSubject::from(&creds.user))?;

    info!(user_id = creds.user.id, "login succeeded");
    Ok(Json(TokenPairResponse::new(
        pair,
        state.tokens.access_ttl_seconds(),
    )))
}

pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenPairResponse>, AppError> {
    let token = headers
        .get(REFRESH_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AppError::Unauthorized("refresh token required"))?;

    let pair = state.tokens.refresh(token).map_err(|err| {
        warn!(error = %err, "refresh rejected");
        AppError::from(err)
    })?;

    Ok(Json(TokenPairResponse::new(
        pair,
        state.tokens.access_ttl_seconds(),
    )))
}
