//! BaasBeer Core Library
//!
//! Core models, share allocation, voting, the Beer Coin ledger and storage
//! for the BaasBeer brewery platform.

pub mod allocation;
pub mod coins;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod funding;
pub mod invariants;
pub mod members;
pub mod models;
pub mod permissions;
pub mod recipes;
pub mod seed;
pub mod storage;
pub mod voting;

pub use allocation::ShareAllocator;
pub use coins::CoinLedger;
pub use config::{Config, SHARE_POOL_SIZE};
pub use error::{Error, Result};
pub use models::*;
pub use permissions::{can_perform, has_role, require, Capability, Permissions};
pub use recipes::RecipeSubmission;
pub use seed::SeedReport;
pub use storage::{
    Database, ProfileRepository, ProposalRepository, ShareRepository, Storage, VoteRepository,
};
