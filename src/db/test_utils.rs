//! Shared test fixtures for the stores and services

use sqlx::SqlitePool;

use super::Database;

/// In-memory pool with the full plugin schema applied
pub async fn test_pool() -> SqlitePool {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    db.pool().clone()
}

/// Insert a group row directly, bypassing name validation
pub async fn insert_group(pool: &SqlitePool, name: &str, user_id: i64, is_public: bool) -> i64 {
    sqlx::query("INSERT INTO md_groups (name, user_id, is_public) VALUES (?, ?, ?)")
        .bind(name)
        .bind(user_id)
        .bind(is_public)
        .execute(pool)
        .await
        .expect("Failed to insert group")
        .last_insert_rowid()
}
