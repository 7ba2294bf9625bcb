//! Ballot and tally models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ballot cast by one member on one proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub id: Uuid,
    pub proposal_id: Uuid,
    pub voter_id: Uuid,
    pub selected_option: u32,
    pub voting_power: u32,
    pub created_at: DateTime<Utc>,
}

impl Vote {
    pub fn new(proposal_id: Uuid, voter_id: Uuid, selected_option: u32, voting_power: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            proposal_id,
            voter_id,
            selected_option,
            voting_power,
            created_at: Utc::now(),
        }
    }
}

/// Weighted result for a single option
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTally {
    pub index: u32,
    pub text: String,
    pub ballots: u32,
    pub weight: u64,
    pub percentage: f64,
}

/// Weighted results for a whole proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalTally {
    pub proposal_id: Uuid,
    pub total_ballots: u32,
    pub total_weight: u64,
    pub options: Vec<OptionTally>,
}

impl ProposalTally {
    /// Option with the highest weight; ties go to the lower index
    pub fn leader(&self) -> Option<&OptionTally> {
        if self.total_weight == 0 {
            return None;
        }
        self.options
            .iter()
            .fold(None, |best: Option<&OptionTally>, o| match best {
                Some(b) if b.weight >= o.weight => Some(b),
                _ => Some(o),
            })
    }
}
