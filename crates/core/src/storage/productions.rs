//! Production and investment storage operations

use rusqlite::{params, Connection, Row};
use rust_decimal::Decimal;
use tracing::instrument;
use uuid::Uuid;

use super::parse::{
    parse_datetime, parse_datetime_opt, parse_decimal, parse_enum, parse_uuid, parse_uuid_opt,
    OptionalExt,
};
use crate::error::{Error, Result};
use crate::models::{Investment, Production, ProductionStatus};

const COLUMNS: &str = "id, name, description, recipe_id, brewer_id, status, price_per_liter, max_liters, liters_committed, funding_deadline, created_at";

pub struct ProductionStore<'a> {
    conn: &'a Connection,
}

fn from_row(row: &Row<'_>) -> rusqlite::Result<Production> {
    Ok(Production {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        description: row.get(2)?,
        recipe_id: parse_uuid_opt(row.get::<_, Option<String>>(3)?)?,
        brewer_id: parse_uuid_opt(row.get::<_, Option<String>>(4)?)?,
        status: parse_enum(&row.get::<_, String>(5)?)?,
        price_per_liter: parse_decimal(&row.get::<_, String>(6)?)?,
        max_liters: row.get(7)?,
        liters_committed: row.get(8)?,
        funding_deadline: parse_datetime_opt(row.get::<_, Option<String>>(9)?)?,
        created_at: parse_datetime(&row.get::<_, String>(10)?)?,
    })
}

fn investment_from_row(row: &Row<'_>) -> rusqlite::Result<Investment> {
    Ok(Investment {
        id: parse_uuid(&row.get::<_, String>(0)?)?,
        investor_id: parse_uuid(&row.get::<_, String>(1)?)?,
        production_id: parse_uuid(&row.get::<_, String>(2)?)?,
        liters: row.get(3)?,
        amount_paid: parse_decimal(&row.get::<_, String>(4)?)?,
        created_at: parse_datetime(&row.get::<_, String>(5)?)?,
    })
}

impl<'a> ProductionStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    #[instrument(skip(self, production), fields(name = %production.name))]
    pub fn create(&self, production: &Production) -> Result<()> {
        self.conn.execute(
            "INSERT INTO productions
             (id, name, description, recipe_id, brewer_id, status, price_per_liter, max_liters, liters_committed, funding_deadline, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                production.id.to_string(),
                production.name,
                production.description,
                production.recipe_id.map(|id| id.to_string()),
                production.brewer_id.map(|id| id.to_string()),
                production.status.as_str(),
                production.price_per_liter.to_string(),
                production.max_liters,
                production.liters_committed,
                production.funding_deadline.map(|t| t.to_rfc3339()),
                production.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Production>> {
        let sql = format!("SELECT {} FROM productions WHERE id = ?1", COLUMNS);
        let production = self
            .conn
            .query_row(&sql, params![id.to_string()], from_row)
            .optional()?;
        Ok(production)
    }

    /// All productions, newest first
    pub fn list(&self) -> Result<Vec<Production>> {
        let sql = format!("SELECT {} FROM productions ORDER BY created_at DESC", COLUMNS);
        let mut stmt = self.conn.prepare(&sql)?;
        let productions = stmt
            .query_map([], from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(productions)
    }

    /// Set the brewer and move the batch to brewing, only if unassigned
    #[instrument(skip(self))]
    pub fn assign_brewer(&self, id: Uuid, brewer_id: Uuid) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE productions SET brewer_id = ?1, status = ?2
             WHERE id = ?3 AND brewer_id IS NULL",
            params![
                brewer_id.to_string(),
                ProductionStatus::Brewing.as_str(),
                id.to_string()
            ],
        )?;
        Ok(changed == 1)
    }

    /// Add committed liters, bounded by the batch capacity
    pub fn commit_liters(&self, id: Uuid, liters: u32) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE productions SET liters_committed = liters_committed + ?1
             WHERE id = ?2 AND liters_committed + ?1 <= max_liters",
            params![liters, id.to_string()],
        )?;
        if changed == 0 {
            return Err(Error::Validation(format!(
                "production {} cannot take {} more liters",
                id, liters
            )));
        }
        Ok(())
    }

    pub fn create_investment(&self, investment: &Investment) -> Result<()> {
        self.conn.execute(
            "INSERT INTO investments (id, investor_id, production_id, liters, amount_paid, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                investment.id.to_string(),
                investment.investor_id.to_string(),
                investment.production_id.to_string(),
                investment.liters,
                investment.amount_paid.to_string(),
                investment.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Investments made by one profile, newest first
    pub fn list_investments_for_investor(&self, investor_id: Uuid) -> Result<Vec<Investment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, investor_id, production_id, liters, amount_paid, created_at
             FROM investments WHERE investor_id = ?1 ORDER BY created_at DESC",
        )?;
        let investments = stmt
            .query_map(params![investor_id.to_string()], investment_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(investments)
    }

    /// Beer Coins a profile has put into batches so far
    pub fn total_invested_by(&self, investor_id: Uuid) -> Result<Decimal> {
        Ok(self
            .list_investments_for_investor(investor_id)?
            .iter()
            .map(|i| i.amount_paid)
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Profile, Role};
    use crate::storage::Database;
    use rust_decimal_macros::dec;

    #[test]
    fn test_create_find_list() {
        let db = Database::open_in_memory().unwrap();
        let mut production = Production::new("Stout", dec!(3.20), 200);
        production.description = Some("Winter batch".into());
        db.productions().create(&production).unwrap();

        let found = db.productions().find_by_id(production.id).unwrap().unwrap();
        assert_eq!(found.price_per_liter, dec!(3.20));
        assert_eq!(found.status, ProductionStatus::Funding);
        assert_eq!(found.description.as_deref(), Some("Winter batch"));
        assert_eq!(db.productions().list().unwrap().len(), 1);
    }

    #[test]
    fn test_commit_liters_bounded() {
        let db = Database::open_in_memory().unwrap();
        let production = Production::new("Stout", dec!(3), 10);
        db.productions().create(&production).unwrap();

        db.productions().commit_liters(production.id, 7).unwrap();
        let err = db.productions().commit_liters(production.id, 4).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        db.productions().commit_liters(production.id, 3).unwrap();

        let found = db.productions().find_by_id(production.id).unwrap().unwrap();
        assert_eq!(found.remaining_liters(), 0);
    }

    #[test]
    fn test_assign_brewer_once() {
        let db = Database::open_in_memory().unwrap();
        let brewer = Profile::new("brewer@baas.beer", Role::Brewer);
        let other = Profile::new("other@baas.beer", Role::Brewer);
        db.profiles().create(&brewer).unwrap();
        db.profiles().create(&other).unwrap();
        let production = Production::new("Stout", dec!(3), 10);
        db.productions().create(&production).unwrap();

        assert!(db.productions().assign_brewer(production.id, brewer.id).unwrap());
        assert!(!db.productions().assign_brewer(production.id, other.id).unwrap());

        let found = db.productions().find_by_id(production.id).unwrap().unwrap();
        assert_eq!(found.brewer_id, Some(brewer.id));
        assert_eq!(found.status, ProductionStatus::Brewing);
    }
}
