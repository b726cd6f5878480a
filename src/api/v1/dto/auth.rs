/*
 * Responsibility
 * - register / login / refresh の request/response DTO
 */
use serde::{Deserialize, Serialize};

use crate::services::auth::TokenPair;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

pub const MIN_PASSWORD_LEN: usize = 6;

/// Shared by register and user update.
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err("email is invalid"),
    }
}

pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("password must be at least 6 characters");
    }
    Ok(())
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.username.trim().is_empty() {
            return Err("username is required");
        }
        if self.email.trim().is_empty() {
            return Err("email is required");
        }
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err("email and password are required");
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Usually "Bearer"
    pub token_type: &'static str,
    /// Seconds until the access token expires.
    pub expires_in: i64,
}

impl TokenPairResponse {
    pub fn new(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer",
            expires_in,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn register_validation() {
        assert!(register("ana", "ana@example.com", "secret").validate().is_ok());
        assert_eq!(
            register(" ", "ana@example.com", "secret").validate(),
            Err("username is required")
        );
        assert_eq!(
            register("ana", "ana.example.com", "secret").validate(),
            Err("email is invalid")
        );
        assert_eq!(
            register("ana", "ana@example.com", "12345").validate(),
            Err("password must be at least 6 characters")
        );
    }
}
