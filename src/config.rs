//! Plugin configuration
//!
//! Layered with figment: built-in defaults, then an optional TOML file,
//! then `MOREDICE_*` environment variables (`__` separates nested keys,
//! e.g. `MOREDICE_SERVER__ENABLED=true`).

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Default name pattern: starts with a letter, at most 20 alphanumerics
pub const DEFAULT_NAME_FORMAT: &str = "^[a-zA-Z][a-zA-Z0-9]{0,19}$";

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "moredice.toml";

/// Ingestion endpoint settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Mount the token-authenticated ingestion endpoint
    pub enabled: bool,
    /// Route path of the ingestion endpoint
    pub path: String,
    /// Default token lifetime in seconds
    pub token_expire: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: "/dice".to_string(),
            token_expire: 3600,
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// SQLite file; None = in-memory
    pub db_path: Option<String>,
    pub dice_name_format: String,
    pub dice_name_tip: String,
    pub group_name_format: String,
    pub group_name_tip: String,
    /// Joins the visible labels of one roll
    pub roll_result_separator: String,
    /// Deepest subface nesting accepted by the parser
    pub max_face_depth: usize,
    /// Timeout for remote face sources
    pub fetch_timeout_secs: u64,
    pub server: ServerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            db_path: None,
            dice_name_format: DEFAULT_NAME_FORMAT.to_string(),
            dice_name_tip: "Dice names must start with a letter and contain at most 20 letters or digits."
                .to_string(),
            group_name_format: DEFAULT_NAME_FORMAT.to_string(),
            group_name_tip: "Group names must start with a letter and contain at most 20 letters or digits."
                .to_string(),
            roll_result_separator: "-".to_string(),
            max_face_depth: 32,
            fetch_timeout_secs: 10,
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load from defaults, the TOML file at `path` (if it exists) and the environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let config: Config = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("MOREDICE_").split("__"))
            .extract()
            .context("invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject name patterns that do not compile
    pub fn validate(&self) -> Result<()> {
        Regex::new(&self.dice_name_format).context("invalid dice_name_format")?;
        Regex::new(&self.group_name_format).context("invalid group_name_format")?;
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.roll_result_separator, "-");
        assert_eq!(config.dice_name_format, DEFAULT_NAME_FORMAT);
        assert!(!config.server.enabled);
        assert_eq!(config.server.path, "/dice");
        assert_eq!(config.server.token_expire, 3600);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_toml_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
roll_result_separator = " / "
max_face_depth = 4

[server]
path = "/api/dice"
"#
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.roll_result_separator, " / ");
        assert_eq!(config.max_face_depth, 4);
        assert_eq!(config.server.path, "/api/dice");
        // Untouched keys keep their defaults
        assert_eq!(config.server.token_expire, 3600);
        assert_eq!(config.group_name_format, DEFAULT_NAME_FORMAT);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/moredice.toml"))).unwrap();
        assert_eq!(config.fetch_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let config = Config {
            dice_name_format: "([".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
