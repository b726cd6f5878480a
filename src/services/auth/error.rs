use thiserror::Error;

use crate::repos::error::RepoError;

/// Authentication / authorization failures. All are terminal for the request.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token not provided")]
    MissingToken,

    #[error("malformed token")]
    Malformed,

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    Expired,

    #[error("wrong token type")]
    WrongTokenType,

    #[error("no authenticated identity in request context")]
    Unauthenticated,

    #[error("insufficient role")]
    InsufficientRole,

    #[error("not the resource owner")]
    NotOwner,

    #[error("{0} not found")]
    ResourceNotFound(&'static str),

    #[error("invalid resource id")]
    InvalidResourceId,

    #[error("unknown ownership resource type: {0}")]
    BadGuardConfig(String),

    #[error(transparent)]
    Store(#[from] RepoError),

    #[error("internal error")]
    Internal,
}
