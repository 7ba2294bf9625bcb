//! Beer Coin ledger storage

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use super::parse::{parse_datetime, parse_decimal, parse_enum, parse_uuid};
use crate::error::Result;
use crate::models::CoinTransaction;

pub struct LedgerStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<CoinTransaction> {
    Ok(CoinTransaction {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        profile_id: parse_uuid(&row.get::<_, String>(1)?)?,
        amount: parse_decimal(&row.get::<_, String>(2)?)?,
        transaction_type: parse_enum(&row.get::<_, String>(3)?)?,
        description: row.get(4)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> LedgerStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Append an entry
    #[instrument(skip(self, entry), fields(profile_id = %entry.profile_id, amount = %entry.amount))]
    pub fn append(&self, entry: &CoinTransaction) -> Result<()> {
        self.conn.execute(
            "INSERT INTO coin_transactions (id, profile_id, amount, transaction_type, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                entry.id.to_string(),
                entry.profile_id.to_string(),
                entry.amount.to_string(),
                entry.transaction_type.as_str(),
                entry.description,
                entry.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Entries for a profile, newest first
    pub fn list_for_profile(&self, profile_id: Uuid) -> Result<Vec<CoinTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, amount, transaction_type, description, created_at
             FROM coin_transactions WHERE profile_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )?;
        let entries = stmt
            .query_map(params![profile_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Current balance: the exact sum of all entries
    #[instrument(skip(self))]
    pub fn balance(&self, profile_id: Uuid) -> Result<Decimal> {
        let mut stmt = self
            .conn
            .prepare("SELECT amount FROM coin_transactions WHERE profile_id = ?1")?;
        let amounts = stmt
            .query_map(params![profile_id.to_string()], |row| {
                parse_decimal(&row.get::<_, String>(0)?)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(amounts.into_iter().sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Role, TransactionType};
    use crate::storage::Database;
    use rust_decimal_macros::dec;

    #[test]
    fn test_append_and_balance() {
        let db = Database::open_in_memory().unwrap();
        let profile = Profile::new("coins@baas.beer", Role::Investor);
        db.profiles().create(&profile).unwrap();

        db.ledger()
            .append(&CoinTransaction::credit(profile.id, dec!(50), "Welcome bonus"))
            .unwrap();
        db.ledger()
            .append(&CoinTransaction::debit(profile.id, dec!(0.10), "Tip"))
            .unwrap();

        assert_eq!(db.ledger().balance(profile.id).unwrap(), dec!(49.90));

        let entries = db.ledger().list_for_profile(profile.id).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].transaction_type, TransactionType::Debit);
        assert_eq!(entries[0].amount, dec!(-0.10));
    }

    #[test]
    fn test_empty_balance() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.ledger().balance(Uuid::new_v4()).unwrap(), Decimal::ZERO);
    }
}
