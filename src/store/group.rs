//! Group persistence

use anyhow::Result;
use sqlx::SqlitePool;

use super::{Access, Group};

const GROUP_COLUMNS: &str = "g.id, g.name, g.user_id, g.is_public, g.deleted";

/// Group storage with database backing
#[derive(Clone)]
pub struct GroupStore {
    pool: SqlitePool,
}

impl GroupStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new group and return it with its assigned id
    pub async fn create(&self, name: &str, user_id: i64, is_public: bool) -> Result<Group> {
        let result = sqlx::query("INSERT INTO md_groups (name, user_id, is_public) VALUES (?, ?, ?)")
            .bind(name)
            .bind(user_id)
            .bind(is_public)
            .execute(&self.pool)
            .await?;

        Ok(Group {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            user_id,
            is_public,
            deleted: false,
        })
    }

    /// Get a live group by id, if `user_id` may access it
    pub async fn get_by_id(&self, id: i64, user_id: i64, access: Access) -> Result<Option<Group>> {
        let sql = format!(
            "SELECT {} FROM md_groups g WHERE g.id = ? AND g.deleted = 0 AND {}",
            GROUP_COLUMNS,
            access.group_filter()
        );
        let group = sqlx::query_as::<_, Group>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(group)
    }

    /// All live groups with this name that `user_id` may access
    pub async fn get_by_name(&self, name: &str, user_id: i64, access: Access) -> Result<Vec<Group>> {
        let sql = format!(
            "SELECT {} FROM md_groups g WHERE g.name = ? AND g.deleted = 0 AND {} ORDER BY g.id",
            GROUP_COLUMNS,
            access.group_filter()
        );
        let groups = sqlx::query_as::<_, Group>(&sql)
            .bind(name)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(groups)
    }

    /// Write name, owner and visibility; returns matched rows
    pub async fn update(&self, group: &Group) -> Result<u64> {
        let result = sqlx::query(
            "UPDATE md_groups SET name = ?, user_id = ?, is_public = ? WHERE id = ? AND deleted = 0",
        )
        .bind(&group.name)
        .bind(group.user_id)
        .bind(group.is_public)
        .bind(group.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark a group deleted; returns matched rows (0 if already deleted)
    pub async fn soft_delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE md_groups SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
