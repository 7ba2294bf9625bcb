//! Ballot storage operations

use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::Vote;

pub struct VoteStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Vote> {
    Ok(Vote {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        proposal_id: parse_uuid(&row.get::<_, String>(1)?)?,
        voter_id: parse_uuid(&row.get::<_, String>(2)?)?,
        selected_option: row.get(3)?,
        voting_power: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> VoteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Record a ballot; a second ballot by the same voter fails with `AlreadyVoted`
    #[instrument(skip(self, vote), fields(proposal_id = %vote.proposal_id, voter_id = %vote.voter_id))]
    pub fn create(&self, vote: &Vote) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO votes (id, proposal_id, voter_id, selected_option, voting_power, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                vote.id.to_string(),
                vote.proposal_id.to_string(),
                vote.voter_id.to_string(),
                vote.selected_option,
                vote.voting_power,
                vote.created_at.to_rfc3339(),
            ],
        );

        let err = match result {
            Ok(_) => return Ok(()),
            Err(e) => Error::from(e),
        };

        if err.is_unique_violation() && self.exists(vote.proposal_id, vote.voter_id)? {
            return Err(Error::AlreadyVoted {
                voter: vote.voter_id.to_string(),
                proposal: vote.proposal_id.to_string(),
            });
        }
        Err(err)
    }

    fn exists(&self, proposal_id: Uuid, voter_id: Uuid) -> Result<bool> {
        Ok(self.find(proposal_id, voter_id)?.is_some())
    }

    /// The ballot a voter cast on a proposal, if any
    pub fn find(&self, proposal_id: Uuid, voter_id: Uuid) -> Result<Option<Vote>> {
        let vote = self
            .conn
            .query_row(
                "SELECT id, proposal_id, voter_id, selected_option, voting_power, created_at
                 FROM votes WHERE proposal_id = ?1 AND voter_id = ?2",
                params![proposal_id.to_string(), voter_id.to_string()],
                from_row,
            )
            .optional()?;
        Ok(vote)
    }

    /// All ballots on a proposal, oldest first
    #[instrument(skip(self))]
    pub fn list_for_proposal(&self, proposal_id: Uuid) -> Result<Vec<Vote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, proposal_id, voter_id, selected_option, voting_power, created_at
             FROM votes WHERE proposal_id = ?1 ORDER BY created_at",
        )?;
        let votes = stmt
            .query_map(params![proposal_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(votes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, ProposalOption, ProposalType, Role, VotingProposal};
    use crate::storage::Database;

    fn setup(db: &Database) -> (Uuid, Uuid) {
        let voter = Profile::new("voter@baas.beer", Role::Investor);
        db.profiles().create(&voter).unwrap();
        let proposal = VotingProposal::open_for_days(
            "Hours",
            "",
            ProposalType::Strategic,
            vec![ProposalOption::new("Early"), ProposalOption::new("Late")],
            voter.id,
            3,
        );
        db.proposals().create(&proposal).unwrap();
        (proposal.id, voter.id)
    }

    #[test]
    fn test_repeat_ballot_is_already_voted() {
        let db = Database::open_in_memory().unwrap();
        let (proposal_id, voter_id) = setup(&db);

        db.votes().create(&Vote::new(proposal_id, voter_id, 0, 12)).unwrap();
        let err = db
            .votes()
            .create(&Vote::new(proposal_id, voter_id, 1, 12))
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyVoted { .. }));

        let stored = db.votes().find(proposal_id, voter_id).unwrap().unwrap();
        assert_eq!(stored.selected_option, 0);
        assert_eq!(stored.voting_power, 12);
    }

    #[test]
    fn test_unknown_voter_is_not_already_voted() {
        let db = Database::open_in_memory().unwrap();
        let (proposal_id, _) = setup(&db);

        let err = db
            .votes()
            .create(&Vote::new(proposal_id, Uuid::new_v4(), 0, 1))
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));
        assert!(db.votes().list_for_proposal(proposal_id).unwrap().is_empty());
    }
}
