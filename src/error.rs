/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / AuthError を統一的に変換
 */
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;
use crate::services::auth::AuthError;

/// `{"error": <message>, "code"?: <machine code>}`
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),

    #[error("token not provided")]
    MissingToken,

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token")]
    InvalidToken,

    #[error("invalid token type")]
    WrongTokenType,

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("insufficient permissions")]
    InsufficientRole,

    #[error("you don't have permission to modify this resource")]
    NotOwner,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Conflict(String),

    #[error("internal server error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::MissingToken
            | AppError::TokenExpired
            | AppError::InvalidToken
            | AppError::WrongTokenType
            | AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::InsufficientRole | AppError::NotOwner => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Only expiry carries a machine code: it is the one failure a client recovers from.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            AppError::TokenExpired => Some("TOKEN_EXPIRED"),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
            code: self.code(),
        };

        (self.status(), Json(body)).into_response()
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict(what) => AppError::Conflict(format!("{what} already exists")),
            RepoError::NotFound(what) => AppError::NotFound(what),
            RepoError::Db(err) => {
                tracing::error!(error = %err, "database error");
                AppError::Internal
            }
        }
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingToken => AppError::MissingToken,
            AuthError::Expired => AppError::TokenExpired,
            // Signature vs structure is never disclosed to the client
            AuthError::Malformed | AuthError::InvalidSignature => AppError::InvalidToken,
            AuthError::WrongTokenType => AppError::WrongTokenType,
            AuthError::Unauthenticated => AppError::Unauthorized("user not found in context"),
            AuthError::InsufficientRole => AppError::InsufficientRole,
            AuthError::NotOwner => AppError::NotOwner,
            AuthError::ResourceNotFound(resource) => AppError::NotFound(resource),
            AuthError::InvalidResourceId => AppError::bad_request("invalid resource ID"),
            AuthError::BadGuardConfig(_) => AppError::bad_request("invalid resource type"),
            AuthError::Store(err) => AppError::from(err),
            AuthError::Internal => AppError::Internal,
        }
    }
}
