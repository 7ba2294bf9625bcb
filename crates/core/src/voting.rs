//! Share-weighted voting
//!
//! A ballot carries the voter's share count as its weight, with a floor of
//! one so members without shares still have a voice.

use chrono::{DateTime, Utc};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::assert_tally_invariants;
use crate::models::{OptionTally, Profile, ProposalTally, Vote, VotingProposal};
use crate::permissions::{self, Capability};
use crate::storage::{ProposalRepository, ShareRepository, Storage, VoteRepository};

/// Ballot weight for a holder of `shares` shares
pub fn voting_power(shares: u32) -> u32 {
    shares.max(1)
}

/// Share of the full pool held, as a percentage
pub fn voting_power_percentage(shares: u32, pool_size: u32) -> f64 {
    if pool_size == 0 {
        return 0.0;
    }
    f64::from(shares) / f64::from(pool_size) * 100.0
}

/// Two-decimal rendering used on the dashboard (`2.50`)
pub fn format_percentage(percentage: f64) -> String {
    format!("{:.2}", percentage)
}

/// Record a ballot for `voter` on `proposal_id`
#[instrument(skip(store, voter), fields(voter_id = %voter.id))]
pub fn cast_vote<S>(
    store: &S,
    voter: &Profile,
    proposal_id: Uuid,
    option_index: u32,
    now: DateTime<Utc>,
) -> Result<Vote>
where
    S: Storage + ?Sized,
{
    let proposal = store
        .find_proposal_by_id(proposal_id)?
        .ok_or_else(|| Error::NotFound(format!("proposal {}", proposal_id)))?;

    if !proposal.is_open_at(now) {
        return Err(Error::VotingClosed(proposal.title));
    }

    if option_index >= proposal.option_count() {
        return Err(Error::InvalidOption {
            index: option_index,
            options: proposal.option_count(),
        });
    }

    permissions::require(voter.role, Capability::Vote)?;

    let shares = store.count_shares_by_owner(voter.id)?;
    let vote = Vote::new(proposal_id, voter.id, option_index, voting_power(shares));
    store.insert_vote(&vote)?;

    info!(
        option = option_index,
        power = vote.voting_power,
        "Vote recorded"
    );
    Ok(vote)
}

/// Weighted totals for a proposal's ballots
pub fn tally_votes(proposal: &VotingProposal, votes: &[Vote]) -> ProposalTally {
    let mut options: Vec<OptionTally> = proposal
        .options
        .iter()
        .enumerate()
        .map(|(index, option)| OptionTally {
            index: index as u32,
            text: option.text.clone(),
            ballots: 0,
            weight: 0,
            percentage: 0.0,
        })
        .collect();

    for vote in votes {
        if let Some(slot) = options.get_mut(vote.selected_option as usize) {
            slot.ballots += 1;
            slot.weight += u64::from(vote.voting_power);
        }
    }

    let total_weight: u64 = options.iter().map(|o| o.weight).sum();
    let total_ballots: u32 = options.iter().map(|o| o.ballots).sum();

    if total_weight > 0 {
        for option in &mut options {
            option.percentage = option.weight as f64 / total_weight as f64 * 100.0;
        }
    }

    let tally = ProposalTally {
        proposal_id: proposal.id,
        total_ballots,
        total_weight,
        options,
    };
    assert_tally_invariants(&tally);
    tally
}

/// Load a proposal and tally its ballots
pub fn tally<S>(store: &S, proposal_id: Uuid) -> Result<ProposalTally>
where
    S: ProposalRepository + VoteRepository + ?Sized,
{
    let proposal = store
        .find_proposal_by_id(proposal_id)?
        .ok_or_else(|| Error::NotFound(format!("proposal {}", proposal_id)))?;
    let votes = store.list_votes_for_proposal(proposal_id)?;
    Ok(tally_votes(&proposal, &votes))
}

/// Active proposals, most recent first
pub fn list_active<S>(store: &S, limit: u32) -> Result<Vec<VotingProposal>>
where
    S: ProposalRepository + ?Sized,
{
    store.list_active_proposals(limit)
}

/// Close every proposal whose window has ended, storing its final tally
#[instrument(skip(store))]
pub fn close_expired<S>(store: &S, now: DateTime<Utc>) -> Result<Vec<ProposalTally>>
where
    S: ProposalRepository + VoteRepository + ?Sized,
{
    let expired = store.list_expired_proposals(now)?;
    let mut closed = Vec::with_capacity(expired.len());

    for proposal in expired {
        let votes = store.list_votes_for_proposal(proposal.id)?;
        let tally = tally_votes(&proposal, &votes);
        store.close_proposal(proposal.id, &tally)?;
        info!(
            proposal_id = %proposal.id,
            ballots = tally.total_ballots,
            "Proposal closed"
        );
        closed.push(tally);
    }

    Ok(closed)
}

/// Voting power a member would cast right now
pub fn current_power<S>(store: &S, profile_id: Uuid) -> Result<u32>
where
    S: ShareRepository + ?Sized,
{
    Ok(voting_power(store.count_shares_by_owner(profile_id)?))
}
