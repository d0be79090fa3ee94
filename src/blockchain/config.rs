use serde::Deserialize;
use thiserror::Error;

use std::env;

pub const DEFAULT_DIFFICULTY: usize = 2;
pub const DEFAULT_MINING_REWARD: u64 = 100;

const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const MINING_REWARD_KEY: &str = "LEDGER_MINING_REWARD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Invalid config document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Ledger parameters
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Leading zero hex digits required of a mined block hash
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,

    /// Amount credited to the miner of each block
    #[serde(default = "default_mining_reward")]
    pub mining_reward: u64,
}

fn default_difficulty() -> usize {
    DEFAULT_DIFFICULTY
}

fn default_mining_reward() -> u64 {
    DEFAULT_MINING_REWARD
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
        }
    }
}

impl LedgerConfig {
    /// Defaults overridden by `LEDGER_DIFFICULTY` and `LEDGER_MINING_REWARD`
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Parses a JSON document; missing fields take their defaults
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(DIFFICULTY_KEY) {
            config.difficulty = parse_value(DIFFICULTY_KEY, value)?;
        }
        if let Some(value) = lookup(MINING_REWARD_KEY) {
            config.mining_reward = parse_value(MINING_REWARD_KEY, value)?;
        }

        Ok(config)
    }
}

fn parse_value<T: std::str::FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { key, value })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.difficulty, 2);
        assert_eq!(config.mining_reward, 100);
    }

    #[test]
    fn test_lookup_overrides() {
        let config = LedgerConfig::from_lookup(|key| match key {
            DIFFICULTY_KEY => Some("3".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.difficulty, 3);
        assert_eq!(config.mining_reward, DEFAULT_MINING_REWARD);
    }

    #[test]
    fn test_bad_lookup_value() {
        let result = LedgerConfig::from_lookup(|key| match key {
            MINING_REWARD_KEY => Some("-5".to_string()),
            _ => None,
        });

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: MINING_REWARD_KEY, .. })
        ));
    }

    #[test]
    fn test_json_document() {
        let config = LedgerConfig::from_json_str(r#"{ "mining_reward": 25 }"#).unwrap();
        assert_eq!(config.difficulty, DEFAULT_DIFFICULTY);
        assert_eq!(config.mining_reward, 25);

        assert!(LedgerConfig::from_json_str("not json").is_err());
    }
}
