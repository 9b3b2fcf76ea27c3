//! Persistence for groups and dice
//!
//! All reads skip soft-deleted rows. Reads take an [`Access`] mode that
//! decides whether other users' public groups are included.

mod dice;
mod group;

pub use dice::DiceStore;
pub use group::GroupStore;

use serde::Serialize;

use crate::dice::Face;

/// Which groups a lookup may see
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Only groups owned by the caller (mutations)
    Owned,
    /// Owned groups plus every public group (reads and rolls)
    Visible,
}

impl Access {
    /// SQL predicate over the `md_groups` alias `g`; binds the user id once
    pub(crate) fn group_filter(self) -> &'static str {
        match self {
            Access::Owned => "g.user_id = ?",
            Access::Visible => "(g.user_id = ? OR g.is_public = 1)",
        }
    }
}

/// Ownership and visibility boundary for dice
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct Group {
    pub id: i64,
    pub name: String,
    /// Owner
    pub user_id: i64,
    pub is_public: bool,
    pub deleted: bool,
}

/// A named die owned by a group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dice {
    pub id: i64,
    pub name: String,
    pub group_id: i64,
    pub faces: Vec<Face>,
    pub deleted: bool,
}
