//! Group operations
//!
//! Groups are resolved from user input that is either a numeric id or a
//! name. Names are unique per owner; mutations only ever see the caller's
//! own groups, reads also see public groups.

use anyhow::Context;
use tracing::{debug, error, info};

use crate::error::{DiceError, DiceResult};
use crate::naming::{default_group_name, parse_id, NameRule};
use crate::store::{Access, Dice, DiceStore, Group, GroupStore};

/// Group management service
#[derive(Clone)]
pub struct GroupService {
    groups: GroupStore,
    dices: DiceStore,
    name_rule: NameRule,
}

impl GroupService {
    pub fn new(groups: GroupStore, dices: DiceStore, name_rule: NameRule) -> Self {
        Self {
            groups,
            dices,
            name_rule,
        }
    }

    fn validate_name(&self, name: &str) -> DiceResult<()> {
        if self.name_rule.is_valid(name) {
            Ok(())
        } else {
            Err(DiceError::GroupNameInvalid {
                name: name.to_string(),
                tip: self.name_rule.tip().to_string(),
            })
        }
    }

    /// Resolve a group id or name under the given access mode
    pub async fn get_group(&self, input: &str, user_id: i64, access: Access) -> DiceResult<Group> {
        if let Some(id) = parse_id(input) {
            return self
                .groups
                .get_by_id(id, user_id, access)
                .await
                .with_context(|| format!("failed to get group by id {}", id))?
                .ok_or(DiceError::GroupIdNotFound(id));
        }

        let mut groups = self
            .groups
            .get_by_name(input, user_id, access)
            .await
            .with_context(|| format!("failed to get groups by name {}", input))?;
        match groups.len() {
            0 => Err(DiceError::GroupNameNotFound(input.to_string())),
            1 => Ok(groups.remove(0)),
            _ => Err(DiceError::GroupNameNotUnique(input.to_string())),
        }
    }

    /// Resolve one of the caller's own groups
    pub async fn get_my_group(&self, input: &str, user_id: i64) -> DiceResult<Group> {
        self.get_group(input, user_id, Access::Owned).await
    }

    async fn name_taken(&self, name: &str, user_id: i64) -> DiceResult<bool> {
        let existing = self
            .groups
            .get_by_name(name, user_id, Access::Owned)
            .await
            .with_context(|| format!("failed to check group name {}", name))?;
        Ok(!existing.is_empty())
    }

    /// Create the caller's default group; only allowed once
    pub async fn init_group(&self, user_id: i64) -> DiceResult<Group> {
        let name = default_group_name(user_id);
        if self.name_taken(&name, user_id).await? {
            return Err(DiceError::GroupAlreadyInitialized(user_id));
        }

        let group = self
            .groups
            .create(&name, user_id, false)
            .await
            .with_context(|| format!("failed to add group {}", name))?;
        info!("Initialized default group {} for user {}", group.id, user_id);
        Ok(group)
    }

    /// Create a private group owned by the caller
    pub async fn add_group(&self, name: &str, user_id: i64) -> DiceResult<Group> {
        self.validate_name(name)?;
        if self.name_taken(name, user_id).await? {
            return Err(DiceError::GroupNameExists(name.to_string()));
        }

        let group = self
            .groups
            .create(name, user_id, false)
            .await
            .with_context(|| format!("failed to add group {}", name))?;
        debug!("User {} added group {} ({})", user_id, name, group.id);
        Ok(group)
    }

    /// Rename one of the caller's groups; returns matched rows
    pub async fn rename_group(&self, input: &str, user_id: i64, new_name: &str) -> DiceResult<u64> {
        self.validate_name(new_name)?;
        let mut group = self.get_my_group(input, user_id).await?;
        if group.name == new_name {
            return Ok(0);
        }
        if self.name_taken(new_name, user_id).await? {
            return Err(DiceError::GroupNameExists(new_name.to_string()));
        }

        group.name = new_name.to_string();
        let matched = self
            .groups
            .update(&group)
            .await
            .with_context(|| format!("failed to rename group {}", group.id))?;
        Ok(matched)
    }

    /// Soft-delete one of the caller's groups; returns matched rows
    pub async fn delete_group(&self, input: &str, user_id: i64) -> DiceResult<u64> {
        let group = self.get_my_group(input, user_id).await?;
        let matched = self
            .groups
            .soft_delete(group.id)
            .await
            .with_context(|| format!("failed to delete group {}", group.id))?;
        debug!("User {} deleted group {}", user_id, group.id);
        Ok(matched)
    }

    /// Publish or unpublish one of the caller's groups; returns matched rows
    pub async fn set_group_public(&self, input: &str, user_id: i64, is_public: bool) -> DiceResult<u64> {
        let mut group = self.get_my_group(input, user_id).await?;
        group.is_public = is_public;
        let matched = self
            .groups
            .update(&group)
            .await
            .with_context(|| format!("failed to update group {}", group.id))?;
        Ok(matched)
    }

    /// Copy a visible group and its live dice into a new group owned by the caller.
    ///
    /// The new group is committed before the dice are copied; if the copy
    /// fails the empty group stays behind and `GroupCloneFailed` is returned.
    pub async fn clone_group(
        &self,
        input: &str,
        user_id: i64,
        new_name: Option<&str>,
    ) -> DiceResult<Group> {
        let source = self.get_group(input, user_id, Access::Visible).await?;
        let target = self
            .add_group(new_name.unwrap_or(&source.name), user_id)
            .await?;

        let dices = self
            .dices
            .get_by_group(source.id, user_id, Access::Visible)
            .await
            .with_context(|| format!("failed to get dices of group {}", source.id))?;

        let copies: Vec<Dice> = dices
            .into_iter()
            .map(|dice| Dice {
                id: 0,
                group_id: target.id,
                deleted: false,
                ..dice
            })
            .collect();

        match self.dices.insert_batch(&copies).await {
            Ok(inserted) => {
                info!(
                    "User {} cloned group {} into {} ({} dice)",
                    user_id, source.id, target.id, inserted
                );
                Ok(target)
            }
            Err(e) => {
                error!("Failed to clone group {}: {:#}", source.id, e);
                Err(DiceError::GroupCloneFailed(source.name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_utils::test_pool;
    use crate::dice::Face;

    async fn service() -> GroupService {
        let pool = test_pool().await;
        GroupService::new(
            GroupStore::new(pool.clone()),
            DiceStore::new(pool),
            NameRule::default_with_tip("tip"),
        )
    }

    #[tokio::test]
    async fn test_init_once() {
        let svc = service().await;
        let group = svc.init_group(7).await.unwrap();
        assert_eq!(group.name, "group7");
        assert!(!group.is_public);

        assert!(matches!(
            svc.init_group(7).await,
            Err(DiceError::GroupAlreadyInitialized(7))
        ));
    }

    #[tokio::test]
    async fn test_add_group_validation_and_uniqueness() {
        let svc = service().await;
        assert!(matches!(
            svc.add_group("1abc", 1).await,
            Err(DiceError::GroupNameInvalid { ref name, ref tip }) if name == "1abc" && tip == "tip"
        ));

        svc.add_group("Abc123", 1).await.unwrap();
        assert!(matches!(
            svc.add_group("Abc123", 1).await,
            Err(DiceError::GroupNameExists(_))
        ));
        // Scoped per owner
        svc.add_group("Abc123", 2).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_group_by_id_and_name() {
        let svc = service().await;
        let group = svc.add_group("tavern", 1).await.unwrap();

        let by_id = svc.get_my_group(&group.id.to_string(), 1).await.unwrap();
        assert_eq!(by_id.name, "tavern");
        let by_name = svc.get_my_group("tavern", 1).await.unwrap();
        assert_eq!(by_name.id, group.id);

        assert!(matches!(
            svc.get_my_group("999", 1).await,
            Err(DiceError::GroupIdNotFound(999))
        ));
        assert!(matches!(
            svc.get_my_group("nope", 1).await,
            Err(DiceError::GroupNameNotFound(_))
        ));
        assert!(matches!(
            svc.get_my_group("tavern", 2).await,
            Err(DiceError::GroupNameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_name_not_unique_across_public_groups() {
        let svc = service().await;
        svc.add_group("shared", 1).await.unwrap();
        svc.add_group("shared", 2).await.unwrap();
        svc.set_group_public("shared", 1, true).await.unwrap();

        // User 2 sees its own group and user 1's public one
        assert!(matches!(
            svc.get_group("shared", 2, Access::Visible).await,
            Err(DiceError::GroupNameNotUnique(_))
        ));
        assert!(svc.get_group("shared", 2, Access::Owned).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename() {
        let svc = service().await;
        svc.add_group("old", 1).await.unwrap();
        svc.add_group("taken", 1).await.unwrap();

        assert_eq!(svc.rename_group("old", 1, "old").await.unwrap(), 0);
        assert!(matches!(
            svc.rename_group("old", 1, "taken").await,
            Err(DiceError::GroupNameExists(_))
        ));
        assert_eq!(svc.rename_group("old", 1, "fresh").await.unwrap(), 1);
        assert!(svc.get_my_group("fresh", 1).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_visibility() {
        let svc = service().await;
        svc.add_group("mine", 1).await.unwrap();

        assert!(matches!(
            svc.delete_group("mine", 2).await,
            Err(DiceError::GroupNameNotFound(_))
        ));
        assert_eq!(svc.delete_group("mine", 1).await.unwrap(), 1);
        assert!(svc.get_my_group("mine", 1).await.is_err());
    }

    #[tokio::test]
    async fn test_public_group_not_mutable_by_others() {
        let svc = service().await;
        svc.add_group("pub", 1).await.unwrap();
        svc.set_group_public("pub", 1, true).await.unwrap();

        assert!(svc.get_group("pub", 2, Access::Visible).await.is_ok());
        assert!(matches!(
            svc.set_group_public("pub", 2, false).await,
            Err(DiceError::GroupNameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clone_copies_live_dice() {
        let svc = service().await;
        let source = svc.add_group("source", 1).await.unwrap();
        svc.set_group_public("source", 1, true).await.unwrap();

        let faces = vec![Face::leaf("x")
            .with_weight(2.5)
            .with_subfaces(vec![Face::leaf("y").hidden()])];
        let kept = svc.dices.create("kept", source.id, &faces).await.unwrap();
        let dropped = svc.dices.create("dropped", source.id, &faces).await.unwrap();
        svc.dices.soft_delete(dropped.id).await.unwrap();

        let clone = svc.clone_group("source", 2, None).await.unwrap();
        assert_eq!(clone.name, "source");
        assert_eq!(clone.user_id, 2);

        let copied = svc
            .dices
            .get_by_group(clone.id, 2, Access::Owned)
            .await
            .unwrap();
        assert_eq!(copied.len(), 1);
        assert_eq!(copied[0].name, "kept");
        assert_ne!(copied[0].id, kept.id);
        assert_eq!(copied[0].group_id, clone.id);
        assert_eq!(
            serde_json::to_string(&copied[0].faces).unwrap(),
            serde_json::to_string(&kept.faces).unwrap()
        );
    }

    #[tokio::test]
    async fn test_clone_failure_leaves_empty_group() {
        let pool = test_pool().await;
        let svc = GroupService::new(
            GroupStore::new(pool.clone()),
            DiceStore::new(pool.clone()),
            NameRule::default_with_tip("tip"),
        );
        let source = svc.add_group("source", 1).await.unwrap();
        svc.set_group_public("source", 1, true).await.unwrap();
        svc.dices
            .create("coin", source.id, &[Face::leaf("heads")])
            .await
            .unwrap();

        sqlx::query(
            "CREATE TRIGGER block_dice_insert BEFORE INSERT ON md_dices \
             BEGIN SELECT RAISE(ABORT, 'dice insert blocked'); END",
        )
        .execute(&pool)
        .await
        .unwrap();

        assert!(matches!(
            svc.clone_group("source", 2, None).await,
            Err(DiceError::GroupCloneFailed(ref name)) if name == "source"
        ));

        // The new group was committed before the copy and stays empty
        let orphan = svc.get_my_group("source", 2).await.unwrap();
        let copied = svc
            .dices
            .get_by_group(orphan.id, 2, Access::Owned)
            .await
            .unwrap();
        assert!(copied.is_empty());
    }

    #[tokio::test]
    async fn test_clone_private_group_of_other_user_fails() {
        let svc = service().await;
        svc.add_group("private", 1).await.unwrap();
        assert!(matches!(
            svc.clone_group("private", 2, None).await,
            Err(DiceError::GroupNameNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clone_own_group_needs_new_name() {
        let svc = service().await;
        svc.add_group("mine", 1).await.unwrap();
        assert!(matches!(
            svc.clone_group("mine", 1, None).await,
            Err(DiceError::GroupNameExists(_))
        ));
        let copy = svc.clone_group("mine", 1, Some("copy")).await.unwrap();
        assert_eq!(copy.name, "copy");
    }
}
