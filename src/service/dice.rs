//! Dice operations
//!
//! Dice are addressed as `[group:]dice`, where each part is a numeric id or
//! a name. Without a group qualifier the name is searched across every
//! group the caller can access and must match exactly one die.

use anyhow::Context;
use tracing::{debug, info};

use super::group::GroupService;
use crate::dice::{roll_many, roll_many_without_replacement, Face, FaceOptions, FaceParser};
use crate::error::{DiceError, DiceResult};
use crate::naming::{default_group_name, parse_id, NameRule};
use crate::store::{Access, Dice, DiceStore, Group};

/// Dice management and rolling service
#[derive(Clone)]
pub struct DiceService {
    dices: DiceStore,
    groups: GroupService,
    parser: FaceParser,
    name_rule: NameRule,
    separator: String,
}

impl DiceService {
    pub fn new(
        dices: DiceStore,
        groups: GroupService,
        parser: FaceParser,
        name_rule: NameRule,
        separator: impl Into<String>,
    ) -> Self {
        Self {
            dices,
            groups,
            parser,
            name_rule,
            separator: separator.into(),
        }
    }

    fn validate_name(&self, name: &str) -> DiceResult<()> {
        if self.name_rule.is_valid(name) {
            Ok(())
        } else {
            Err(DiceError::DiceNameInvalid {
                name: name.to_string(),
                tip: self.name_rule.tip().to_string(),
            })
        }
    }

    /// Resolve `[group:]dice` to a single live die the caller may access
    pub async fn resolve_dice(&self, input: &str, user_id: i64, access: Access) -> DiceResult<Dice> {
        let (group_input, dice_input) = match input.split_once(':') {
            None => (None, input),
            Some((_, rest)) if rest.contains(':') => {
                return Err(DiceError::DiceNameNotFound(input.to_string()))
            }
            Some((group, dice)) => (Some(group), dice),
        };

        let group_id = match group_input {
            Some(group) => Some(self.groups.get_group(group, user_id, access).await?.id),
            None => None,
        };

        if let Some(id) = parse_id(dice_input) {
            return self
                .dices
                .get_by_id(id, user_id, access, group_id)
                .await
                .with_context(|| format!("failed to get dice by id {}", id))?
                .ok_or(DiceError::DiceIdNotFound(id));
        }

        let mut dices = self
            .dices
            .get_by_name(dice_input, user_id, access, group_id)
            .await
            .with_context(|| format!("failed to get dices by name {}", dice_input))?;
        match dices.len() {
            0 => Err(DiceError::DiceNameNotFound(dice_input.to_string())),
            1 => Ok(dices.remove(0)),
            _ => Err(DiceError::DiceNameNotUnique(dice_input.to_string())),
        }
    }

    /// Target group for a new die: the `group` option or the caller's default group
    async fn target_group(&self, user_id: i64, options: &FaceOptions) -> DiceResult<Group> {
        let default_name = default_group_name(user_id);
        let name = options.group.as_deref().unwrap_or(&default_name);
        match self.groups.get_my_group(name, user_id).await {
            Err(DiceError::GroupNameNotFound(missing)) if missing == default_name => {
                Err(DiceError::GroupUninitialized(user_id))
            }
            other => other,
        }
    }

    /// Parse faces without touching storage
    pub async fn parse_faces(&self, raw: &str, options: &FaceOptions) -> DiceResult<Vec<Face>> {
        self.parser.parse(raw, options).await
    }

    /// Create a die in the target group
    pub async fn add_dice(
        &self,
        name: &str,
        user_id: i64,
        faces_raw: &str,
        options: &FaceOptions,
    ) -> DiceResult<Dice> {
        self.validate_name(name)?;
        let group = self.target_group(user_id, options).await?;

        let existing = self
            .dices
            .get_by_name(name, user_id, Access::Owned, Some(group.id))
            .await
            .with_context(|| format!("failed to check dice name {}", name))?;
        if !existing.is_empty() {
            return Err(DiceError::DiceNameExists(name.to_string()));
        }

        let faces = self.parse_faces(faces_raw, options).await?;
        let dice = self
            .dices
            .create(name, group.id, &faces)
            .await
            .with_context(|| format!("failed to add dice {}", name))?;
        info!(
            "User {} added dice {} ({}) to group {}",
            user_id, name, dice.id, group.id
        );
        Ok(dice)
    }

    /// Qualify a bare dice identifier with the `group` option, if one is set
    fn qualified(input: &str, options: &FaceOptions) -> String {
        match &options.group {
            Some(group) if !input.contains(':') => format!("{}:{}", group, input),
            _ => input.to_string(),
        }
    }

    /// Replace all faces of one of the caller's dice; returns matched rows
    pub async fn set_dice_faces(
        &self,
        input: &str,
        user_id: i64,
        faces_raw: &str,
        options: &FaceOptions,
    ) -> DiceResult<u64> {
        let input = Self::qualified(input, options);
        let mut dice = self.resolve_dice(&input, user_id, Access::Owned).await?;
        dice.faces = self.parse_faces(faces_raw, options).await?;
        let matched = self
            .dices
            .update(&dice)
            .await
            .with_context(|| format!("failed to update dice {}", dice.id))?;
        debug!("User {} set {} faces on dice {}", user_id, dice.faces.len(), dice.id);
        Ok(matched)
    }

    /// Soft-delete one of the caller's dice; returns matched rows.
    ///
    /// Deleting an already deleted die by id matches 0 rows instead of failing.
    pub async fn delete_dice(&self, input: &str, user_id: i64) -> DiceResult<u64> {
        let dice = match self.resolve_dice(input, user_id, Access::Owned).await {
            Ok(dice) => dice,
            Err(DiceError::DiceIdNotFound(id)) => {
                let deleted = self
                    .dices
                    .get_owned_by_id_with_deleted(id, user_id)
                    .await
                    .with_context(|| format!("failed to get dice by id {}", id))?;
                return match deleted {
                    Some(dice) if dice.deleted => {
                        debug!("User {} deleted dice {} again", user_id, id);
                        Ok(0)
                    }
                    _ => Err(DiceError::DiceIdNotFound(id)),
                };
            }
            Err(e) => return Err(e),
        };
        let matched = self
            .dices
            .soft_delete(dice.id)
            .await
            .with_context(|| format!("failed to delete dice {}", dice.id))?;
        debug!("User {} deleted dice {}", user_id, dice.id);
        Ok(matched)
    }

    /// Rename one of the caller's dice within its group; returns matched rows
    pub async fn rename_dice(&self, input: &str, user_id: i64, new_name: &str) -> DiceResult<u64> {
        let mut dice = self.resolve_dice(input, user_id, Access::Owned).await?;
        self.validate_name(new_name)?;
        if dice.name == new_name {
            return Ok(0);
        }

        let existing = self
            .dices
            .get_by_name(new_name, user_id, Access::Owned, Some(dice.group_id))
            .await
            .with_context(|| format!("failed to check dice name {}", new_name))?;
        if !existing.is_empty() {
            return Err(DiceError::DiceNameExists(new_name.to_string()));
        }

        dice.name = new_name.to_string();
        let matched = self
            .dices
            .update(&dice)
            .await
            .with_context(|| format!("failed to rename dice {}", dice.id))?;
        Ok(matched)
    }

    /// Roll a visible die `times` times
    pub async fn roll_dice(
        &self,
        input: &str,
        user_id: i64,
        times: i64,
        without_replacement: bool,
    ) -> DiceResult<Vec<String>> {
        let dice = self.resolve_dice(input, user_id, Access::Visible).await?;
        let results = if without_replacement {
            roll_many_without_replacement(&dice.faces, times, &self.separator)?
        } else {
            roll_many(&dice.faces, times, &self.separator)?
        };
        debug!("User {} rolled dice {} x{}", user_id, dice.id, times);
        Ok(results)
    }
}
