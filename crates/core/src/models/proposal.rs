//! Voting proposal model

use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProposalTally;
use crate::error::Error;

/// What a proposal decides on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalType {
    BeerRecipe,
    LabelDesign,
    Strategic,
    Other(String),
}

impl ProposalType {
    pub fn as_str(&self) -> &str {
        match self {
            ProposalType::BeerRecipe => "beer_recipe",
            ProposalType::LabelDesign => "label_design",
            ProposalType::Strategic => "strategic",
            ProposalType::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "beer_recipe" => ProposalType::BeerRecipe,
            "label_design" => ProposalType::LabelDesign,
            "strategic" => ProposalType::Strategic,
            other => ProposalType::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Active,
    Closed,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Active => "active",
            ProposalStatus::Closed => "closed",
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ProposalStatus::Active),
            "closed" => Ok(ProposalStatus::Closed),
            other => Err(Error::Validation(format!("unknown proposal status '{}'", other))),
        }
    }
}

/// One selectable answer on a proposal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalOption {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl ProposalOption {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            description: None,
            value: None,
        }
    }

    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn valued(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }
}

/// A decision put to the shareholders
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingProposal {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub proposal_type: ProposalType,
    pub options: Vec<ProposalOption>,
    pub status: ProposalStatus,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub voting_starts_at: Option<DateTime<Utc>>,
    pub voting_ends_at: DateTime<Utc>,
    /// Tally frozen when the proposal closed
    pub results: Option<ProposalTally>,
}

impl VotingProposal {
    /// An active proposal open from now for `days`
    pub fn open_for_days(
        title: impl Into<String>,
        description: impl Into<String>,
        proposal_type: ProposalType,
        options: Vec<ProposalOption>,
        created_by: Uuid,
        days: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            description: description.into(),
            proposal_type,
            options,
            status: ProposalStatus::Active,
            created_by,
            created_at: now,
            voting_starts_at: Some(now),
            voting_ends_at: now + Duration::days(days),
            results: None,
        }
    }

    /// Accepts ballots at `now`
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        if self.status != ProposalStatus::Active {
            return false;
        }

        if let Some(starts) = self.voting_starts_at {
            if now < starts {
                return false;
            }
        }

        now < self.voting_ends_at
    }

    pub fn option_count(&self) -> u32 {
        self.options.len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proposal() -> VotingProposal {
        VotingProposal::open_for_days(
            "Label",
            "Pick a label",
            ProposalType::LabelDesign,
            vec![ProposalOption::new("A"), ProposalOption::new("B")],
            Uuid::new_v4(),
            5,
        )
    }

    #[test]
    fn test_open_window() {
        let p = proposal();
        assert!(p.is_open_at(Utc::now()));
        assert!(!p.is_open_at(p.voting_ends_at));
        assert!(!p.is_open_at(p.created_at - Duration::minutes(1)));
    }

    #[test]
    fn test_closed_status_rejects() {
        let mut p = proposal();
        p.status = ProposalStatus::Closed;
        assert!(!p.is_open_at(Utc::now()));
    }

    #[test]
    fn test_proposal_type_round_trip_names() {
        assert_eq!(ProposalType::parse("strategic"), ProposalType::Strategic);
        assert_eq!(
            ProposalType::parse("brewpub_hours"),
            ProposalType::Other("brewpub_hours".to_string())
        );
        assert_eq!(ProposalType::BeerRecipe.as_str(), "beer_recipe");
    }
}
