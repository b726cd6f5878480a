//! One-way password hashing (argon2id, PHC string format).
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tracing::{error, warn};

use crate::services::auth::AuthError;

#[derive(Clone, Debug, Default)]
pub struct PasswordService;

impl PasswordService {
    pub fn new() -> Self {
        Self
    }

    pub fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plain.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| {
                error!(error = %e, "failed to hash password");
                AuthError::Internal
            })
    }

    /// A stored hash that cannot be parsed counts as a mismatch.
    pub fn verify(&self, plain: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "stored password hash is not a valid PHC string");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let svc = PasswordService::new();
        let hash = svc.hash("correct horse").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(svc.verify("correct horse", &hash));
        assert!(!svc.verify("battery staple", &hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let svc = PasswordService::new();
        assert_ne!(svc.hash("pw").unwrap(), svc.hash("pw").unwrap());
    }

    #[test]
    fn unparsable_hash_never_verifies() {
        assert!(!PasswordService::new().verify("pw", "plaintext-from-legacy-row"));
    }
}
