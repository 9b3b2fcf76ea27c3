//! Dice and group name validation
//!
//! Names are checked against a configurable pattern. The default pattern
//! requires a leading letter followed by at most 19 letters or digits.

use regex::Regex;
use std::sync::LazyLock;

use crate::config::DEFAULT_NAME_FORMAT;

static DEFAULT_NAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(DEFAULT_NAME_FORMAT).expect("default name pattern compiles"));

/// A compiled name pattern plus the tip shown when a name is rejected
#[derive(Debug, Clone)]
pub struct NameRule {
    pattern: Regex,
    tip: String,
}

impl NameRule {
    /// Compile a rule; fails if `format` is not a valid regex
    pub fn new(format: &str, tip: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(format)?,
            tip: tip.into(),
        })
    }

    /// Rule using the default pattern
    pub fn default_with_tip(tip: impl Into<String>) -> Self {
        Self {
            pattern: DEFAULT_NAME_REGEX.clone(),
            tip: tip.into(),
        }
    }

    pub fn is_valid(&self, name: &str) -> bool {
        self.pattern.is_match(name)
    }

    pub fn tip(&self) -> &str {
        &self.tip
    }
}

/// Name of a user's default group
pub fn default_group_name(user_id: i64) -> String {
    format!("group{}", user_id)
}

/// Interpret an identifier as a non-negative integer id, if it is one
pub fn parse_id(input: &str) -> Option<i64> {
    if input.is_empty() || !input.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    input.parse().ok()
}
