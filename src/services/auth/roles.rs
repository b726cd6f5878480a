use std::collections::BTreeSet;

use crate::services::auth::AuthError;

pub const ADMIN: &str = "Administrador";
pub const READER: &str = "Lector";
pub const USER: &str = "Usuario";

/// Seeded at startup; `USER` is what self-registration grants.
pub const DEFAULT_ROLES: [&str; 3] = [ADMIN, READER, USER];

pub fn is_admin(roles: &BTreeSet<String>) -> bool {
    roles.contains(ADMIN)
}

/// Any one of `required` is enough. An empty requirement admits every authenticated identity.
pub fn check_roles(roles: &BTreeSet<String>, required: &[String]) -> Result<(), AuthError> {
    if required.is_empty() || required.iter().any(|r| roles.contains(r)) {
        Ok(())
    } else {
        Err(AuthError::InsufficientRole)
    }
}
