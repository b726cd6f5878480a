use chrono::Utc;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::services::auth::{
    AuthError,
    claims::{Claims, TokenSubject, TokenType},
    codec::{CodecError, TokenCodec},
};

/// Access + refresh tokens minted from the same subject snapshot.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issuance and validation over the codec. Stateless: there is no session table,
/// so an issued token stays valid until it expires.
#[derive(Clone, Debug)]
pub struct TokenService {
    codec: TokenCodec,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(codec: TokenCodec, access_ttl_seconds: u64, refresh_ttl_seconds: u64) -> Self {
        Self {
            codec,
            access_ttl_seconds: i64::try_from(access_ttl_seconds).unwrap_or(i64::MAX),
            refresh_ttl_seconds: i64::try_from(refresh_ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    pub fn issue_token_pair(&self, subject: &TokenSubject) -> Result<TokenPair, AuthError> {
        self.issue_token_pair_at(subject, Utc::now().timestamp())
    }

    pub fn issue_token_pair_at(
        &self,
        subject: &TokenSubject,
        now: i64,
    ) -> Result<TokenPair, AuthError> {
        let access_token = self.issue(subject, TokenType::Access, now)?;
        let refresh_token = self.issue(subject, TokenType::Refresh, now)?;

        debug!(
            user_id = subject.user_id,
            roles = ?subject.roles,
            "issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    fn issue(
        &self,
        subject: &TokenSubject,
        token_type: TokenType,
        now: i64,
    ) -> Result<String, AuthError> {
        let ttl = match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
        };

        let claims = Claims {
            user_id: subject.user_id,
            roles: subject.roles.clone(),
            token_type,
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        };

        self.codec.encode(&claims).map_err(|e| {
            error!(error = %e, %token_type, "failed to sign token");
            AuthError::Internal
        })
    }

    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        self.validate_at(token, Utc::now().timestamp())
    }

    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        self.codec.decode_at(token, now).map_err(AuthError::from)
    }

    /// Mint a brand-new pair from a refresh token.
    ///
    /// The new pair is built from the refresh token's own claims (user id + roles),
    /// the store is not consulted.
    pub fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AuthError> {
        self.refresh_at(refresh_token, Utc::now().timestamp())
    }

    pub fn refresh_at(&self, refresh_token: &str, now: i64) -> Result<TokenPair, AuthError> {
        let claims = self.validate_at(refresh_token, now)?;
        if claims.token_type != TokenType::Refresh {
            return Err(AuthError::WrongTokenType);
        }

        self.issue_token_pair_at(&claims.subject(), now)
    }
}

impl From<CodecError> for AuthError {
    fn from(e: CodecError) -> Self {
        match e {
            CodecError::Expired => AuthError::Expired,
            CodecError::InvalidSignature => AuthError::InvalidSignature,
            CodecError::Malformed => AuthError::Malformed,
            CodecError::EmptySecret | CodecError::Encoding(_) => AuthError::Internal,
        }
    }
}
