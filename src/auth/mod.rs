pub mod password;
pub mod tokens;

pub use password::{hash_password, verify_password};
pub use tokens::{SessionToken, TokenSigner};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
    #[error("Invalid signing key: {0}")]
    Key(String),
    #[error("Malformed token")]
    MalformedToken,
    #[error("Token signature mismatch")]
    BadSignature,
    #[error("Token expired")]
    Expired,
}
