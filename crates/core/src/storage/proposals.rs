//! Voting proposal storage operations

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_datetime_opt, parse_enum, parse_json, parse_uuid, OptionalExt};
use crate::error::{Error, Result};
use crate::models::{ProposalStatus, ProposalTally, ProposalType, VotingProposal};

const COLUMNS: &str = "id, title, description, proposal_type, options, status, created_by, created_at, voting_starts_at, voting_ends_at, results";

pub struct ProposalStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<VotingProposal> {
    let results: Option<String> = row.get(10)?;
    Ok(VotingProposal {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        title: row.get(1)?,
        description: row.get(2)?,
        proposal_type: ProposalType::parse(&row.get::<_, String>(3)?),
        options: parse_json(&row.get::<_, String>(4)?)?,
        status: parse_enum(&row.get::<_, String>(5)?)?,
        created_by: parse_uuid(&row.get::<_, String>(6)?)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?)?,
        voting_starts_at: parse_datetime_opt(row.get::<_, Option<String>>(8)?)?,
        voting_ends_at: parse_datetime(&row.get::<_, String>(9)?)?,
        results: results.map(|r| parse_json(&r)).transpose()?,
    })
}

impl<'a> ProposalStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Create a new proposal
    #[instrument(skip(self, proposal), fields(title = %proposal.title))]
    pub fn create(&self, proposal: &VotingProposal) -> Result<()> {
        let results = proposal
            .results
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        self.conn.execute(
            "INSERT INTO voting_proposals
             (id, title, description, proposal_type, options, status, created_by, created_at, voting_starts_at, voting_ends_at, results)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                proposal.id.to_string(),
                proposal.title,
                proposal.description,
                proposal.proposal_type.as_str(),
                serde_json::to_string(&proposal.options)?,
                proposal.status.as_str(),
                proposal.created_by.to_string(),
                proposal.created_at.to_rfc3339(),
                proposal.voting_starts_at.map(|t| t.to_rfc3339()),
                proposal.voting_ends_at.to_rfc3339(),
                results,
            ],
        )?;
        Ok(())
    }

    /// Find proposal by ID
    #[instrument(skip(self))]
    pub fn find_by_id(&self, id: Uuid) -> Result<Option<VotingProposal>> {
        let sql = format!("SELECT {} FROM voting_proposals WHERE id = ?1", COLUMNS);
        let proposal = self
            .conn
            .query_row(&sql, params![id.to_string()], from_row)
            .optional()?;
        Ok(proposal)
    }

    /// Active proposals, most recent first
    #[instrument(skip(self))]
    pub fn list_active(&self, limit: u32) -> Result<Vec<VotingProposal>> {
        let sql = format!(
            "SELECT {} FROM voting_proposals WHERE status = 'active'
             ORDER BY created_at DESC LIMIT ?1",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let proposals = stmt
            .query_map(params![limit], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(proposals)
    }

    /// Active proposals whose window ended at or before `now`
    pub fn list_expired(&self, now: DateTime<Utc>) -> Result<Vec<VotingProposal>> {
        let sql = format!(
            "SELECT {} FROM voting_proposals WHERE status = 'active' AND voting_ends_at <= ?1
             ORDER BY voting_ends_at",
            COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let proposals = stmt
            .query_map(params![now.to_rfc3339()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(proposals)
    }

    /// Mark a proposal closed and freeze its results
    #[instrument(skip(self, results))]
    pub fn close(&self, id: Uuid, results: &ProposalTally) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE voting_proposals SET status = ?1, results = ?2 WHERE id = ?3",
            params![
                ProposalStatus::Closed.as_str(),
                serde_json::to_string(results)?,
                id.to_string(),
            ],
        )?;
        if changed == 0 {
            return Err(Error::NotFound(format!("proposal {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, ProposalOption, Role};
    use crate::storage::Database;
    use chrono::Duration;

    fn create_creator(db: &Database) -> Uuid {
        let profile = Profile::new("admin@baas.beer", Role::Admin);
        db.profiles().create(&profile).unwrap();
        profile.id
    }

    fn proposal(creator: Uuid, title: &str) -> VotingProposal {
        VotingProposal::open_for_days(
            title,
            "desc",
            ProposalType::Strategic,
            vec![
                ProposalOption::new("Yes").valued("yes"),
                ProposalOption::new("No").described("Keep as is"),
            ],
            creator,
            3,
        )
    }

    #[test]
    fn test_create_and_find() {
        let db = Database::open_in_memory().unwrap();
        let creator = create_creator(&db);
        let p = proposal(creator, "Hours");
        db.proposals().create(&p).unwrap();

        let found = db.proposals().find_by_id(p.id).unwrap().unwrap();
        assert_eq!(found.title, "Hours");
        assert_eq!(found.options, p.options);
        assert_eq!(found.status, ProposalStatus::Active);
        assert!(found.results.is_none());
    }

    #[test]
    fn test_list_active_most_recent_first_capped() {
        let db = Database::open_in_memory().unwrap();
        let creator = create_creator(&db);
        for i in 0..7 {
            let mut p = proposal(creator, &format!("P{}", i));
            p.created_at = Utc::now() + Duration::seconds(i);
            db.proposals().create(&p).unwrap();
        }

        let listed = db.proposals().list_active(5).unwrap();
        assert_eq!(listed.len(), 5);
        assert_eq!(listed[0].title, "P6");
        assert_eq!(listed[4].title, "P2");
    }

    #[test]
    fn test_list_expired() {
        let db = Database::open_in_memory().unwrap();
        let creator = create_creator(&db);
        let mut old = proposal(creator, "Old");
        old.voting_ends_at = Utc::now() - Duration::hours(1);
        db.proposals().create(&old).unwrap();
        db.proposals().create(&proposal(creator, "Fresh")).unwrap();

        let expired = db.proposals().list_expired(Utc::now()).unwrap();
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].id, old.id);
    }
}
