pub mod claims;
pub mod codec;
pub mod error;
pub mod factory;
pub mod password;
pub mod roles;
pub mod token_service;

pub use claims::{Claims, TokenSubject, TokenType};
pub use error::AuthError;
pub use factory::build_token_service;
pub use password::PasswordService;
pub use token_service::{TokenPair, TokenService};
