//! Production batch and investment models

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductionStatus {
    Planning,
    /// Accepting investments
    Funding,
    Brewing,
    Completed,
    Cancelled,
}

impl ProductionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductionStatus::Planning => "planning",
            ProductionStatus::Funding => "funding",
            ProductionStatus::Brewing => "brewing",
            ProductionStatus::Completed => "completed",
            ProductionStatus::Cancelled => "cancelled",
        }
    }
}

impl FromStr for ProductionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planning" => Ok(ProductionStatus::Planning),
            "funding" => Ok(ProductionStatus::Funding),
            "brewing" => Ok(ProductionStatus::Brewing),
            "completed" => Ok(ProductionStatus::Completed),
            "cancelled" => Ok(ProductionStatus::Cancelled),
            other => Err(Error::Validation(format!("unknown production status '{}'", other))),
        }
    }
}

/// A batch of beer open for funding
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Production {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub recipe_id: Option<Uuid>,
    pub brewer_id: Option<Uuid>,
    pub status: ProductionStatus,
    pub price_per_liter: Decimal,
    pub max_liters: u32,
    pub liters_committed: u32,
    pub funding_deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Production {
    pub fn new(name: impl Into<String>, price_per_liter: Decimal, max_liters: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            recipe_id: None,
            brewer_id: None,
            status: ProductionStatus::Funding,
            price_per_liter,
            max_liters,
            liters_committed: 0,
            funding_deadline: None,
            created_at: Utc::now(),
        }
    }

    /// Liters still open for investment
    pub fn remaining_liters(&self) -> u32 {
        self.max_liters.saturating_sub(self.liters_committed)
    }

    pub fn cost_of(&self, liters: u32) -> Decimal {
        self.price_per_liter * Decimal::from(liters)
    }
}

/// Beer Coins committed to a production
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Investment {
    pub id: Uuid,
    pub investor_id: Uuid,
    pub production_id: Uuid,
    pub liters: u32,
    pub amount_paid: Decimal,
    pub created_at: DateTime<Utc>,
}

impl Investment {
    pub fn new(investor_id: Uuid, production_id: Uuid, liters: u32, amount_paid: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            investor_id,
            production_id,
            liters,
            amount_paid,
            created_at: Utc::now(),
        }
    }
}
