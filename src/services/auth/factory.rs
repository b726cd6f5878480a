/// Factory: build `TokenService` from application `Config`.
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::config::Config;
use crate::services::auth::{TokenService, codec::TokenCodec};

pub fn build_token_service(config: &Config) -> Result<Arc<TokenService>> {
    let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_leeway_seconds)
        .context("invalid token signing configuration")?;

    Ok(Arc::new(TokenService::new(
        codec,
        config.access_token_ttl_seconds,
        config.refresh_token_ttl_seconds,
    )))
}
