//! Storage repository traits
//!
//! These traits define the storage interface the allocation and voting
//! logic runs against, allowing for different implementations (SQLite,
//! test doubles, a future hosted backend).

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Profile, ProposalTally, Role, Share, Vote, VotingProposal};

/// Profile repository operations
pub trait ProfileRepository {
    /// Create a new profile
    fn create_profile(&self, profile: &Profile) -> Result<()>;

    /// Find profile by ID
    fn find_profile_by_id(&self, id: Uuid) -> Result<Option<Profile>>;

    /// Find profile by email
    fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>>;

    /// List all profiles, oldest first
    fn list_profiles(&self) -> Result<Vec<Profile>>;

    /// Change a profile's role
    fn update_profile_role(&self, id: Uuid, role: Role) -> Result<()>;

    /// Enable or disable a profile
    fn set_profile_active(&self, id: Uuid, active: bool) -> Result<()>;
}

/// Share repository operations
pub trait ShareRepository {
    /// Every share number issued so far
    fn list_issued_share_numbers(&self) -> Result<BTreeSet<u32>>;

    /// Create a batch of shares, all or nothing.
    ///
    /// Fails with `Error::ShareConflict` if any number is already issued.
    fn insert_shares(&self, shares: &[Share]) -> Result<()>;

    /// Count shares held by an owner
    fn count_shares_by_owner(&self, owner_id: Uuid) -> Result<u32>;

    /// Shares held by an owner
    fn list_shares_by_owner(&self, owner_id: Uuid) -> Result<Vec<Share>>;

    /// Count shares issued in total
    fn count_issued_shares(&self) -> Result<u32>;
}

/// Proposal repository operations
pub trait ProposalRepository {
    /// Create a new proposal
    fn create_proposal(&self, proposal: &VotingProposal) -> Result<()>;

    /// Find proposal by ID
    fn find_proposal_by_id(&self, id: Uuid) -> Result<Option<VotingProposal>>;

    /// Active proposals, most recent first, at most `limit`
    fn list_active_proposals(&self, limit: u32) -> Result<Vec<VotingProposal>>;

    /// Active proposals whose window has ended
    fn list_expired_proposals(&self, now: DateTime<Utc>) -> Result<Vec<VotingProposal>>;

    /// Close a proposal and store its final tally
    fn close_proposal(&self, id: Uuid, results: &ProposalTally) -> Result<()>;
}

/// Vote repository operations
pub trait VoteRepository {
    /// Record a ballot; fails with `Error::AlreadyVoted` on a repeat ballot
    fn insert_vote(&self, vote: &Vote) -> Result<()>;

    /// The ballot a voter cast on a proposal
    fn find_vote(&self, proposal_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>>;

    /// All ballots on a proposal
    fn list_votes_for_proposal(&self, proposal_id: Uuid) -> Result<Vec<Vote>>;
}

/// Combined storage interface
///
/// Provides access to all repository operations.
/// Implementations may be backed by SQLite, test doubles, or network.
pub trait Storage: ProfileRepository + ShareRepository + ProposalRepository + VoteRepository {}

// Blanket implementation: any type implementing all traits implements Storage
impl<T> Storage for T where
    T: ProfileRepository + ShareRepository + ProposalRepository + VoteRepository
{
}
