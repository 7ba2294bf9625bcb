//! Share models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One numbered unit of brewery ownership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Share {
    pub id: Uuid,
    pub share_number: u32,
    pub owner_id: Uuid,
    pub purchase_price: Decimal,
    pub current_value: Decimal,
    pub sale_price: Option<Decimal>,
    pub is_for_sale: bool,
    pub purchased_at: DateTime<Utc>,
}

impl Share {
    /// A freshly issued share, valued at its purchase price
    pub fn issue(owner_id: Uuid, share_number: u32, price: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            share_number,
            owner_id,
            purchase_price: price,
            current_value: price,
            sale_price: None,
            is_for_sale: false,
            purchased_at: Utc::now(),
        }
    }
}

/// Outcome of a completed share purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePurchase {
    pub owner_id: Uuid,
    /// Allocated numbers in ascending order
    pub share_numbers: Vec<u32>,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

/// Dashboard summary of a member's holdings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharesOverview {
    pub user_shares: u32,
    pub total_issued: u32,
    pub available: u32,
    pub share_value: Decimal,
    pub invested_value: Decimal,
    /// Percentage of the full pool held by this member
    pub voting_power_pct: f64,
}
