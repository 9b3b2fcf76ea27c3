//! Dice persistence
//!
//! Dice lookups join `md_groups` so the owning group's visibility and
//! deletion state apply to its dice.

use anyhow::Result;
use sqlx::SqlitePool;

use super::{Access, Dice};
use crate::dice::Face;

const DICE_COLUMNS: &str = "d.id, d.name, d.group_id, d.faces, d.deleted";

/// Dice storage with database backing
#[derive(Clone)]
pub struct DiceStore {
    pool: SqlitePool,
}

impl DiceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new die and return it with its assigned id
    pub async fn create(&self, name: &str, group_id: i64, faces: &[Face]) -> Result<Dice> {
        let faces_json = serde_json::to_string(faces)?;
        let result = sqlx::query("INSERT INTO md_dices (name, group_id, faces) VALUES (?, ?, ?)")
            .bind(name)
            .bind(group_id)
            .bind(&faces_json)
            .execute(&self.pool)
            .await?;

        Ok(Dice {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            group_id,
            faces: faces.to_vec(),
            deleted: false,
        })
    }

    /// Get a live die by id, if `user_id` may access its group.
    /// `group_id` narrows the lookup to one group.
    pub async fn get_by_id(
        &self,
        id: i64,
        user_id: i64,
        access: Access,
        group_id: Option<i64>,
    ) -> Result<Option<Dice>> {
        let sql = format!(
            "SELECT {} FROM md_dices d JOIN md_groups g ON d.group_id = g.id \
             WHERE d.id = ? AND d.deleted = 0 AND g.deleted = 0 AND {} \
             AND (? IS NULL OR g.id = ?)",
            DICE_COLUMNS,
            access.group_filter()
        );
        let row = sqlx::query_as::<_, DiceRow>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(group_id)
            .bind(group_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DiceRow::into_dice).transpose()
    }

    /// Get a die by id in one of `user_id`'s live groups, even if the die is deleted
    pub async fn get_owned_by_id_with_deleted(&self, id: i64, user_id: i64) -> Result<Option<Dice>> {
        let sql = format!(
            "SELECT {} FROM md_dices d JOIN md_groups g ON d.group_id = g.id \
             WHERE d.id = ? AND g.deleted = 0 AND {}",
            DICE_COLUMNS,
            Access::Owned.group_filter()
        );
        let row = sqlx::query_as::<_, DiceRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(DiceRow::into_dice).transpose()
    }

    /// All live dice with this name in groups `user_id` may access
    pub async fn get_by_name(
        &self,
        name: &str,
        user_id: i64,
        access: Access,
        group_id: Option<i64>,
    ) -> Result<Vec<Dice>> {
        let sql = format!(
            "SELECT {} FROM md_dices d JOIN md_groups g ON d.group_id = g.id \
             WHERE d.name = ? AND d.deleted = 0 AND g.deleted = 0 AND {} \
             AND (? IS NULL OR g.id = ?) ORDER BY d.id",
            DICE_COLUMNS,
            access.group_filter()
        );
        let rows: Vec<DiceRow> = sqlx::query_as(&sql)
            .bind(name)
            .bind(user_id)
            .bind(group_id)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DiceRow::into_dice).collect()
    }

    /// All live dice of a group
    pub async fn get_by_group(&self, group_id: i64, user_id: i64, access: Access) -> Result<Vec<Dice>> {
        let sql = format!(
            "SELECT {} FROM md_dices d JOIN md_groups g ON d.group_id = g.id \
             WHERE d.group_id = ? AND d.deleted = 0 AND g.deleted = 0 AND {} ORDER BY d.id",
            DICE_COLUMNS,
            access.group_filter()
        );
        let rows: Vec<DiceRow> = sqlx::query_as(&sql)
            .bind(group_id)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(DiceRow::into_dice).collect()
    }

    /// Write name, group and faces; returns matched rows
    pub async fn update(&self, dice: &Dice) -> Result<u64> {
        let faces_json = serde_json::to_string(&dice.faces)?;
        let result = sqlx::query(
            "UPDATE md_dices SET name = ?, group_id = ?, faces = ? WHERE id = ? AND deleted = 0",
        )
        .bind(&dice.name)
        .bind(dice.group_id)
        .bind(&faces_json)
        .bind(dice.id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    /// Mark a die deleted; returns matched rows (0 if already deleted)
    pub async fn soft_delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE md_dices SET deleted = 1 WHERE id = ? AND deleted = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Insert many dice in one transaction; ids on the input are ignored
    pub async fn insert_batch(&self, dices: &[Dice]) -> Result<u64> {
        if dices.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        let mut inserted = 0;
        for dice in dices {
            let faces_json = serde_json::to_string(&dice.faces)?;
            let result = sqlx::query(
                "INSERT INTO md_dices (name, group_id, faces, deleted) VALUES (?, ?, ?, ?)",
            )
            .bind(&dice.name)
            .bind(dice.group_id)
            .bind(&faces_json)
            .bind(dice.deleted)
            .execute(&mut *tx)
            .await?;
            inserted += result.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }
}

/// Row type for SQLite queries
#[derive(sqlx::FromRow)]
struct DiceRow {
    id: i64,
    name: String,
    group_id: i64,
    faces: String,
    deleted: bool,
}

impl DiceRow {
    fn into_dice(self) -> Result<Dice> {
        let faces: Vec<Face> = serde_json::from_str(&self.faces)?;
        Ok(Dice {
            id: self.id,
            name: self.name,
            group_id: self.group_id,
            faces,
            deleted: self.deleted,
        })
    }
}
