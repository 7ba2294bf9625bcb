//! Beer Coin ledger entries

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "CREDIT",
            TransactionType::Debit => "DEBIT",
        }
    }

    pub fn sign(&self) -> &'static str {
        match self {
            TransactionType::Credit => "+",
            TransactionType::Debit => "-",
        }
    }
}

impl FromStr for TransactionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREDIT" => Ok(TransactionType::Credit),
            "DEBIT" => Ok(TransactionType::Debit),
            other => Err(Error::Validation(format!("unknown transaction type '{}'", other))),
        }
    }
}

/// A single movement of Beer Coins.
///
/// `amount` is signed: credits are positive and debits negative, so a
/// balance is the plain sum of a profile's entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoinTransaction {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl CoinTransaction {
    pub fn credit(profile_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self::entry(profile_id, amount.abs(), TransactionType::Credit, description)
    }

    pub fn debit(profile_id: Uuid, amount: Decimal, description: impl Into<String>) -> Self {
        Self::entry(profile_id, -amount.abs(), TransactionType::Debit, description)
    }

    fn entry(
        profile_id: Uuid,
        amount: Decimal,
        transaction_type: TransactionType,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            profile_id,
            amount,
            transaction_type,
            description: description.into(),
            created_at: Utc::now(),
        }
    }
}
