//! Share storage operations

use std::collections::BTreeSet;

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::{instrument, warn};
use uuid::Uuid;

use super::parse::{parse_datetime, parse_decimal, parse_decimal_opt, parse_uuid};
use crate::error::{Error, Result};
use crate::models::Share;

pub struct ShareStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Share> {
    Ok(Share {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        share_number: row.get(1)?,
        owner_id: parse_uuid(&row.get::<_, String>(2)?)?,
        purchase_price: parse_decimal(&row.get::<_, String>(3)?)?,
        current_value: parse_decimal(&row.get::<_, String>(4)?)?,
        sale_price: parse_decimal_opt(row.get::<_, Option<String>>(5)?)?,
        is_for_sale: row.get::<_, i32>(6)? != 0,
        purchased_at: parse_datetime(&row.get::<_, String>(7)?)?,
    })
}

impl<'a> ShareStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// All share numbers issued so far
    #[instrument(skip(self))]
    pub fn issued_numbers(&self) -> Result<BTreeSet<u32>> {
        let mut stmt = self
            .conn
            .prepare("SELECT share_number FROM beer_shares ORDER BY share_number")?;
        let numbers = stmt
            .query_map([], |row| row.get::<_, u32>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(numbers)
    }

    /// Insert a batch of shares in one transaction.
    ///
    /// Any already-issued number aborts the whole batch with `ShareConflict`.
    #[instrument(skip(self, shares), fields(count = shares.len()))]
    pub fn insert_batch(&self, shares: &[Share]) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO beer_shares
                 (id, share_number, owner_id, purchase_price, current_value, sale_price, is_for_sale, purchased_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;

            for share in shares {
                let inserted = stmt.execute(params![
                    share.id.to_string(),
                    share.share_number,
                    share.owner_id.to_string(),
                    share.purchase_price.to_string(),
                    share.current_value.to_string(),
                    share.sale_price.map(|d| d.to_string()),
                    share.is_for_sale as i32,
                    share.purchased_at.to_rfc3339(),
                ]);

                if let Err(e) = inserted.map_err(Error::from) {
                    if e.is_unique_violation() {
                        warn!(share_number = share.share_number, "Share number already issued");
                        return Err(Error::ShareConflict);
                    }
                    return Err(e);
                }
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Number of shares issued in total
    pub fn count_issued(&self) -> Result<u32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM beer_shares", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Number of shares held by an owner
    #[instrument(skip(self))]
    pub fn count_by_owner(&self, owner_id: Uuid) -> Result<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM beer_shares WHERE owner_id = ?1",
            params![owner_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Shares held by an owner, by share number
    pub fn list_by_owner(&self, owner_id: Uuid) -> Result<Vec<Share>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, share_number, owner_id, purchase_price, current_value, sale_price, is_for_sale, purchased_at
             FROM beer_shares WHERE owner_id = ?1 ORDER BY share_number",
        )?;
        let shares = stmt
            .query_map(params![owner_id.to_string()], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(shares)
    }

    /// Sum of purchase prices paid by an owner
    pub fn invested_by_owner(&self, owner_id: Uuid) -> Result<Decimal> {
        Ok(self
            .list_by_owner(owner_id)?
            .iter()
            .map(|s| s.purchase_price)
            .sum())
    }
}
