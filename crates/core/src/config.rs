//! Runtime configuration
//!
//! Loaded from `config.toml`. Every field has a default, so a missing file
//! or a partial file is fine.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Size of the fixed share pool
pub const SHARE_POOL_SIZE: u32 = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub shares: ShareConfig,
    pub voting: VotingConfig,
    pub coins: CoinConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShareConfig {
    /// Highest share number that can ever be issued
    pub pool_size: u32,
    pub unit_price: Decimal,
    /// Largest quantity accepted in one purchase
    pub max_per_purchase: u32,
    /// Fresh-snapshot attempts after a share number conflict
    pub allocation_attempts: u32,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            pool_size: SHARE_POOL_SIZE,
            unit_price: dec!(100),
            max_per_purchase: 100,
            allocation_attempts: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VotingConfig {
    pub active_proposal_limit: u32,
    pub recipe_voting_days: i64,
}

impl Default for VotingConfig {
    fn default() -> Self {
        Self {
            active_proposal_limit: 5,
            recipe_voting_days: 7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoinConfig {
    /// Credited to every new profile
    pub welcome_bonus: Decimal,
}

impl Default for CoinConfig {
    fn default() -> Self {
        Self {
            welcome_bonus: dec!(50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to `<data dir>/baasbeer.db`
    pub database_path: Option<PathBuf>,
}

impl Config {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Config = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an explicit file (must exist)
    pub fn load_from(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "Loading configuration");
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Load from the explicit path, else the default location, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }

        match Self::default_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path),
            _ => {
                info!("No configuration file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.shares.pool_size == 0 {
            return Err(Error::Config("shares.pool_size must be positive".into()));
        }
        if self.shares.unit_price <= Decimal::ZERO {
            return Err(Error::Config("shares.unit_price must be positive".into()));
        }
        if self.shares.max_per_purchase == 0 {
            return Err(Error::Config("shares.max_per_purchase must be positive".into()));
        }
        if self.shares.allocation_attempts == 0 {
            return Err(Error::Config("shares.allocation_attempts must be positive".into()));
        }
        if self.voting.recipe_voting_days <= 0 {
            return Err(Error::Config("voting.recipe_voting_days must be positive".into()));
        }
        if self.coins.welcome_bonus < Decimal::ZERO {
            return Err(Error::Config("coins.welcome_bonus cannot be negative".into()));
        }
        Ok(())
    }

    /// Database path from config, falling back to the data directory
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(project_dirs()?.data_dir().join("baasbeer.db")),
        }
    }

    pub fn default_config_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "baasbeer", "baasbeer").ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Could not determine data directory",
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.shares.pool_size, 10_000);
        assert_eq!(config.shares.unit_price, dec!(100));
        assert_eq!(config.shares.max_per_purchase, 100);
        assert_eq!(config.voting.active_proposal_limit, 5);
        assert_eq!(config.coins.welcome_bonus, dec!(50));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [shares]
            unit_price = "125.50"

            [voting]
            active_proposal_limit = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.shares.unit_price, dec!(125.50));
        assert_eq!(config.shares.pool_size, 10_000);
        assert_eq!(config.voting.active_proposal_limit, 10);
        assert_eq!(config.voting.recipe_voting_days, 7);
    }

    #[test]
    fn test_rejects_zero_pool() {
        let err = Config::from_toml_str("[shares]\npool_size = 0\n").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\ndatabase_path = \"/tmp/brew.db\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.database_path().unwrap(), PathBuf::from("/tmp/brew.db"));
    }

    #[test]
    fn test_malformed_file() {
        let err = Config::from_toml_str("[shares\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }
}
