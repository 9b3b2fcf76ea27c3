//! Authentication module
//!
//! Issues bearer tokens for the ingestion endpoint. Only the SHA-256 hash
//! of a token is ever stored.

pub mod tokens;

pub use tokens::{IssuedToken, TokenService};

use rand::{distr::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Length of issued token secrets
pub const TOKEN_LENGTH: usize = 40;

/// Generate a random alphanumeric token secret
pub fn generate_token() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a token secret for storage and lookup
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
