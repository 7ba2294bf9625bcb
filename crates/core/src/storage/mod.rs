//! SQLite storage layer for BaasBeer

mod ledger;
mod migrations;
mod parse;
mod productions;
mod profiles;
mod proposals;
mod recipes;
mod shares;
mod traits;
mod votes;

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use tracing::instrument;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Profile, ProposalTally, Role, Share, Vote, VotingProposal};

pub use ledger::LedgerStore;
pub use productions::ProductionStore;
pub use profiles::ProfileStore;
pub use proposals::ProposalStore;
pub use recipes::RecipeStore;
pub use shares::ShareStore;
pub use traits::{ProfileRepository, ProposalRepository, ShareRepository, Storage, VoteRepository};
pub use votes::VoteStore;

/// Main database handle
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create database at the given path
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    /// Open in-memory database (for testing)
    #[instrument]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON")?;
        migrations::run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Get current schema version
    pub fn schema_version(&self) -> Result<u32> {
        migrations::current_version(&self.conn)
    }

    /// Run `f` inside one transaction; any error rolls everything back
    pub fn atomically<T>(&self, f: impl FnOnce(&Connection) -> Result<T>) -> Result<T> {
        let tx = self.conn.unchecked_transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }

    pub fn profiles(&self) -> ProfileStore<'_> {
        ProfileStore::new(&self.conn)
    }

    pub fn shares(&self) -> ShareStore<'_> {
        ShareStore::new(&self.conn)
    }

    pub fn proposals(&self) -> ProposalStore<'_> {
        ProposalStore::new(&self.conn)
    }

    pub fn votes(&self) -> VoteStore<'_> {
        VoteStore::new(&self.conn)
    }

    /// Get Beer Coin ledger store
    pub fn ledger(&self) -> LedgerStore<'_> {
        LedgerStore::new(&self.conn)
    }

    pub fn productions(&self) -> ProductionStore<'_> {
        ProductionStore::new(&self.conn)
    }

    pub fn recipes(&self) -> RecipeStore<'_> {
        RecipeStore::new(&self.conn)
    }
}

// Implement repository traits for Database
// This enables using Database through the trait interface

impl ProfileRepository for Database {
    fn create_profile(&self, profile: &Profile) -> Result<()> {
        self.profiles().create(profile)
    }

    fn find_profile_by_id(&self, id: Uuid) -> Result<Option<Profile>> {
        self.profiles().find_by_id(id)
    }

    fn find_profile_by_email(&self, email: &str) -> Result<Option<Profile>> {
        self.profiles().find_by_email(email)
    }

    fn list_profiles(&self) -> Result<Vec<Profile>> {
        self.profiles().list()
    }

    fn update_profile_role(&self, id: Uuid, role: Role) -> Result<()> {
        self.profiles().update_role(id, role)
    }

    fn set_profile_active(&self, id: Uuid, active: bool) -> Result<()> {
        self.profiles().set_active(id, active)
    }
}

impl ShareRepository for Database {
    fn list_issued_share_numbers(&self) -> Result<BTreeSet<u32>> {
        self.shares().issued_numbers()
    }

    fn insert_shares(&self, shares: &[Share]) -> Result<()> {
        self.shares().insert_batch(shares)
    }

    fn count_shares_by_owner(&self, owner_id: Uuid) -> Result<u32> {
        self.shares().count_by_owner(owner_id)
    }

    fn list_shares_by_owner(&self, owner_id: Uuid) -> Result<Vec<Share>> {
        self.shares().list_by_owner(owner_id)
    }

    fn count_issued_shares(&self) -> Result<u32> {
        self.shares().count_issued()
    }
}

impl ProposalRepository for Database {
    fn create_proposal(&self, proposal: &VotingProposal) -> Result<()> {
        self.proposals().create(proposal)
    }

    fn find_proposal_by_id(&self, id: Uuid) -> Result<Option<VotingProposal>> {
        self.proposals().find_by_id(id)
    }

    fn list_active_proposals(&self, limit: u32) -> Result<Vec<VotingProposal>> {
        self.proposals().list_active(limit)
    }

    fn list_expired_proposals(&self, now: DateTime<Utc>) -> Result<Vec<VotingProposal>> {
        self.proposals().list_expired(now)
    }

    fn close_proposal(&self, id: Uuid, results: &ProposalTally) -> Result<()> {
        self.proposals().close(id, results)
    }
}

impl VoteRepository for Database {
    fn insert_vote(&self, vote: &Vote) -> Result<()> {
        self.votes().create(vote)
    }

    fn find_vote(&self, proposal_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>> {
        self.votes().find(proposal_id, voter_id)
    }

    fn list_votes_for_proposal(&self, proposal_id: Uuid) -> Result<Vec<Vote>> {
        self.votes().list_for_proposal(proposal_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_open_file_database() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("baasbeer.db");

        let db = Database::open(&path).unwrap();
        assert!(db.schema_version().unwrap() >= 1);
        drop(db);

        // Reopening must not re-apply migrations
        let db = Database::open(&path).unwrap();
        assert!(db.schema_version().unwrap() >= 1);
    }

    #[test]
    fn test_atomically_rolls_back() {
        let db = Database::open_in_memory().unwrap();
        let profile = Profile::new("a@baas.beer", Role::Investor);

        let result: Result<()> = db.atomically(|conn| {
            ProfileStore::new(conn).create(&profile)?;
            Err(crate::error::Error::InvalidOperation("abort".into()))
        });
        assert!(result.is_err());
        assert!(db.profiles().find_by_id(profile.id).unwrap().is_none());
    }
}
