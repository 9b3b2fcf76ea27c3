//! Token management service
//!
//! Tokens bind a chat user id to HTTP requests. Each token carries an
//! expiry; lookups ignore expired rows and refresh `updated_at` on use.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use sqlx::sqlite::SqlitePool;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::{generate_token, hash_token};

/// A freshly issued token; the secret is only available here
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub secret: String,
    pub user_id: i64,
    pub expires_at: DateTime<Utc>,
}

/// Token errors
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Token service for the ingestion endpoint
#[derive(Clone)]
pub struct TokenService {
    pool: SqlitePool,
    default_expire: i64,
}

impl TokenService {
    /// Create a token service; `default_expire` is in seconds
    pub fn new(pool: SqlitePool, default_expire: i64) -> Self {
        Self {
            pool,
            default_expire,
        }
    }

    /// Issue a token for `user_id` that lives `expire` seconds (default when None or 0)
    pub async fn add_token(&self, user_id: i64, expire: Option<i64>) -> Result<IssuedToken, TokenError> {
        let expire = match expire {
            Some(secs) if secs > 0 => secs,
            _ => self.default_expire,
        };

        let secret = generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(expire);

        sqlx::query(
            "INSERT INTO md_tokens (user_id, token_hash, created_at, updated_at, expires_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(hash_token(&secret))
        .bind(timestamp(now))
        .bind(timestamp(now))
        .bind(timestamp(expires_at))
        .execute(&self.pool)
        .await?;

        info!("Issued token for user {} expiring {}", user_id, expires_at);
        Ok(IssuedToken {
            secret,
            user_id,
            expires_at,
        })
    }

    /// Owner of an unexpired token; marks the token as used
    pub async fn user_id_for_token(&self, secret: &str) -> Result<Option<i64>, TokenError> {
        let now = timestamp(Utc::now());
        let row: Option<(i64, i64)> = sqlx::query_as(
            "SELECT id, user_id FROM md_tokens WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(hash_token(secret))
        .bind(&now)
        .fetch_optional(&self.pool)
        .await?;

        let Some((id, user_id)) = row else {
            warn!("Token not found or expired: {}...", prefix(secret));
            return Ok(None);
        };

        sqlx::query("UPDATE md_tokens SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(id)
            .execute(&self.pool)
            .await?;
        debug!("Token {}... used by user {}", prefix(secret), user_id);

        Ok(Some(user_id))
    }

    /// Revoke a single token
    pub async fn delete_token(&self, secret: &str) -> Result<bool, TokenError> {
        let result = sqlx::query("DELETE FROM md_tokens WHERE token_hash = ?")
            .bind(hash_token(secret))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            warn!("Token not found for deletion: {}...", prefix(secret));
        }
        Ok(result.rows_affected() > 0)
    }

    /// Revoke every token of a user; false if there were none
    pub async fn clear_tokens(&self, user_id: i64) -> Result<bool, TokenError> {
        let result = sqlx::query("DELETE FROM md_tokens WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        info!("Cleared {} tokens of user {}", result.rows_affected(), user_id);
        Ok(result.rows_affected() > 0)
    }
}

/// Loggable head of a secret
fn prefix(secret: &str) -> &str {
    secret.get(..8).unwrap_or(secret)
}
