//! Domain services
//!
//! Services validate input, resolve identifiers and enforce ownership on
//! top of the stores. [`Services`] wires them together from a pool and
//! the loaded [`Config`].

mod dice;
mod group;

pub use dice::DiceService;
pub use group::GroupService;

use anyhow::{Context, Result};
use sqlx::SqlitePool;

use crate::auth::TokenService;
use crate::config::Config;
use crate::dice::{FaceParser, JsonFetcher};
use crate::naming::NameRule;
use crate::store::{DiceStore, GroupStore};

/// Every service the command and HTTP surfaces need
#[derive(Clone)]
pub struct Services {
    pub groups: GroupService,
    pub dices: DiceService,
    pub tokens: TokenService,
}

impl Services {
    /// Build all services over one pool
    pub fn new(pool: SqlitePool, config: &Config) -> Result<Self> {
        let dice_rule = NameRule::new(&config.dice_name_format, config.dice_name_tip.clone())
            .context("invalid dice_name_format")?;
        let group_rule = NameRule::new(&config.group_name_format, config.group_name_tip.clone())
            .context("invalid group_name_format")?;

        let dice_store = DiceStore::new(pool.clone());
        let groups = GroupService::new(GroupStore::new(pool.clone()), dice_store.clone(), group_rule);

        let fetcher = JsonFetcher::new(config.fetch_timeout())?;
        let parser = FaceParser::new(fetcher, config.max_face_depth);
        let dices = DiceService::new(
            dice_store,
            groups.clone(),
            parser,
            dice_rule,
            config.roll_result_separator.clone(),
        );

        let tokens = TokenService::new(pool, config.server.token_expire);

        Ok(Self {
            groups,
            dices,
            tokens,
        })
    }
}
