//! Beer Coin ledger
//!
//! Balances are never stored; they are the sum of the ledger entries.
//! A debit is only appended when the balance covers it.

use rust_decimal::Decimal;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::invariants::{assert_balance_invariant, assert_transaction_invariants};
use crate::models::CoinTransaction;
use crate::storage::{Database, LedgerStore};

/// Description attached to the signup credit
pub const WELCOME_BONUS_DESCRIPTION: &str = "Welcome bonus";

/// Render an amount the way balances are shown (`12.50`)
pub fn format_coins(amount: Decimal) -> String {
    format!("{:.2}", amount.round_dp(2))
}

/// Ledger operations over one connection
pub struct CoinLedger<'a> {
    store: LedgerStore<'a>,
}

impl<'a> CoinLedger<'a> {
    pub fn new(store: LedgerStore<'a>) -> Self {
        Self { store }
    }

    pub fn balance(&self, profile_id: Uuid) -> Result<Decimal> {
        let balance = self.store.balance(profile_id)?;
        assert_balance_invariant(balance);
        Ok(balance)
    }

    /// Add coins to a profile
    #[instrument(skip(self, description), fields(profile_id = %profile_id, amount = %amount))]
    pub fn credit(
        &self,
        profile_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<CoinTransaction> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("credit amount must be positive".into()));
        }

        let entry = CoinTransaction::credit(profile_id, amount, description);
        assert_transaction_invariants(&entry);
        self.store.append(&entry)?;
        info!("Coins credited");
        Ok(entry)
    }

    /// Remove coins from a profile; nothing is written if the balance is short
    #[instrument(skip(self, description), fields(profile_id = %profile_id, amount = %amount))]
    pub fn debit(
        &self,
        profile_id: Uuid,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<CoinTransaction> {
        if amount <= Decimal::ZERO {
            return Err(Error::Validation("debit amount must be positive".into()));
        }

        let balance = self.balance(profile_id)?;
        if balance < amount {
            warn!(%balance, "Debit exceeds balance");
            return Err(Error::InsufficientCoins {
                required: amount,
                balance,
            });
        }

        let entry = CoinTransaction::debit(profile_id, amount, description);
        assert_transaction_invariants(&entry);
        self.store.append(&entry)?;
        info!("Coins debited");
        Ok(entry)
    }

    /// Ledger entries, newest first
    pub fn transactions(&self, profile_id: Uuid) -> Result<Vec<CoinTransaction>> {
        self.store.list_for_profile(profile_id)
    }
}

/// Balance read straight from the database
pub fn balance(db: &Database, profile_id: Uuid) -> Result<Decimal> {
    CoinLedger::new(db.ledger()).balance(profile_id)
}

/// Credit inside its own transaction
pub fn credit(
    db: &Database,
    profile_id: Uuid,
    amount: Decimal,
    description: &str,
) -> Result<CoinTransaction> {
    db.atomically(|conn| CoinLedger::new(LedgerStore::new(conn)).credit(profile_id, amount, description))
}

/// Balance check and debit inside one transaction
pub fn debit(
    db: &Database,
    profile_id: Uuid,
    amount: Decimal,
    description: &str,
) -> Result<CoinTransaction> {
    db.atomically(|conn| CoinLedger::new(LedgerStore::new(conn)).debit(profile_id, amount, description))
}

pub fn transactions(db: &Database, profile_id: Uuid) -> Result<Vec<CoinTransaction>> {
    CoinLedger::new(db.ledger()).transactions(profile_id)
}
