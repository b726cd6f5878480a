//! HS256 token codec.
//!
//! Verification order is fixed by `jsonwebtoken`: header/structure, then signature, then
//! payload. Expiry is checked here afterwards against a caller supplied `now`, so a garbage
//! token can never be reported as "expired".
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
use thiserror::Error;

use crate::services::auth::claims::Claims;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("failed to encode token: {0}")]
    Encoding(String),
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
}

/// Encodes and verifies claim sets with a symmetric secret.
///
/// - Key material is intentionally not printable via Debug.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    leeway_seconds: i64,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("leeway_seconds", &self.leeway_seconds)
            .finish()
    }
}

impl TokenCodec {
    pub fn new(secret: &[u8], leeway_seconds: u64) -> Result<Self, CodecError> {
        if secret.is_empty() {
            return Err(CodecError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        // exp is compared in `decode_at` with our own clock
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            leeway_seconds: leeway_seconds.min(i64::MAX as u64) as i64,
        })
    }

    pub fn encode(&self, claims: &Claims) -> Result<String, CodecError> {
        let mut header = Header::new(Algorithm::HS256);
        header.typ = Some("JWT".to_string());
        jsonwebtoken::encode(&header, claims, &self.encoding_key)
            .map_err(|e| CodecError::Encoding(e.to_string()))
    }

    /// Verify `token` and reject it when `now` (unix seconds) is past `exp`.
    pub fn decode_at(&self, token: &str, now: i64) -> Result<Claims, CodecError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| classify(e.kind()))?;

        let claims = data.claims;
        if now > claims.exp.saturating_add(self.leeway_seconds) {
            return Err(CodecError::Expired);
        }

        Ok(claims)
    }
}

fn classify(kind: &ErrorKind) -> CodecError {
    match kind {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => CodecError::InvalidSignature,
        ErrorKind::ExpiredSignature => CodecError::Expired,
        _ => CodecError::Malformed,
    }
}
