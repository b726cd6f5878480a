use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::repos::models::User;

/// Discriminant carried by every token. Refresh tokens are accepted only by `/auth/refresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenType::Access => f.write_str("access"),
            TokenType::Refresh => f.write_str("refresh"),
        }
    }
}

/// Signed claim set. One shape for both token types; `token_type` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub roles: BTreeSet<String>,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            user_id: self.user_id,
            roles: self.roles.clone(),
        }
    }
}

/// The part of a user that gets snapshotted into a token.
///
/// Roles are copied by name at issuance time and not re-read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub user_id: i64,
    pub roles: BTreeSet<String>,
}

impl TokenSubject {
    pub fn new<I, S>(user_id: i64, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_id,
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<&User> for TokenSubject {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            roles: user.roles.iter().map(|r| r.name.clone()).collect(),
        }
    }
}
