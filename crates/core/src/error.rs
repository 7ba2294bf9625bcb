//! Error types for BaasBeer Core

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Insufficient shares: requested {requested}, only {available} available")]
    InsufficientShares { requested: u32, available: u32 },

    /// Another purchase claimed one of the share numbers first
    #[error("Share number already issued")]
    ShareConflict,

    #[error("Insufficient Beer Coins: {required:.2} required, balance is {balance:.2}")]
    InsufficientCoins { required: Decimal, balance: Decimal },

    #[error("Invalid option {index}: proposal has {options} options")]
    InvalidOption { index: u32, options: u32 },

    #[error("Voting is closed for proposal {0}")]
    VotingClosed(String),

    #[error("Profile {voter} already voted on proposal {proposal}")]
    AlreadyVoted { voter: String, proposal: String },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl Error {
    /// True only for UNIQUE / PRIMARY KEY violations
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Error::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
