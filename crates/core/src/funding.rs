//! Production batches and Beer Coin investments

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::coins::CoinLedger;
use crate::error::{Error, Result};
use crate::models::{Investment, Production, ProductionStatus, Profile};
use crate::permissions::{self, Capability};
use crate::storage::{Database, LedgerStore, ProductionStore, ProfileStore};

/// Open a new batch for funding
#[instrument(skip(db, actor, production), fields(actor_id = %actor.id, name = %production.name))]
pub fn create_production(db: &Database, actor: &Profile, production: &Production) -> Result<()> {
    permissions::require(actor.role, Capability::ManageProductions)?;

    if production.name.trim().is_empty() {
        return Err(Error::Validation("production name cannot be empty".into()));
    }
    if production.price_per_liter <= Decimal::ZERO {
        return Err(Error::Validation("price per liter must be positive".into()));
    }
    if production.max_liters == 0 {
        return Err(Error::Validation("max liters must be positive".into()));
    }
    if production.liters_committed > production.max_liters {
        return Err(Error::Validation("committed liters exceed capacity".into()));
    }

    db.productions().create(production)?;
    info!(max_liters = production.max_liters, "Production created");
    Ok(())
}

/// Take over an unassigned batch as its brewer
#[instrument(skip(db, brewer), fields(brewer_id = %brewer.id))]
pub fn assume_production(db: &Database, brewer: &Profile, production_id: Uuid) -> Result<Production> {
    permissions::require(brewer.role, Capability::AssumeProductions)?;

    db.atomically(|conn| {
        let store = ProductionStore::new(conn);
        let production = store
            .find_by_id(production_id)?
            .ok_or_else(|| Error::NotFound(format!("production {}", production_id)))?;

        if matches!(
            production.status,
            ProductionStatus::Completed | ProductionStatus::Cancelled
        ) {
            return Err(Error::InvalidOperation(format!(
                "production '{}' is {}",
                production.name,
                production.status.as_str()
            )));
        }

        if !store.assign_brewer(production_id, brewer.id)? {
            return Err(Error::InvalidOperation(format!(
                "production '{}' already has a brewer",
                production.name
            )));
        }

        info!("Production assumed");
        store
            .find_by_id(production_id)?
            .ok_or_else(|| Error::NotFound(format!("production {}", production_id)))
    })
}

/// Spend Beer Coins on liters of a batch.
///
/// A profile with an investment limit cannot push its running total of
/// coins invested past that limit. The debit, the investment record and the committed liters are written
/// together or not at all.
#[instrument(skip(db, investor), fields(investor_id = %investor.id))]
pub fn invest_with_coins(
    db: &Database,
    investor: &Profile,
    production_id: Uuid,
    liters: u32,
) -> Result<Investment> {
    permissions::require(investor.role, Capability::Invest)?;

    if liters == 0 {
        return Err(Error::Validation("liters must be at least 1".into()));
    }

    db.atomically(|conn| {
        let productions = ProductionStore::new(conn);
        let production = productions
            .find_by_id(production_id)?
            .ok_or_else(|| Error::NotFound(format!("production {}", production_id)))?;

        if production.status != ProductionStatus::Funding {
            return Err(Error::InvalidOperation(format!(
                "production '{}' is not open for funding",
                production.name
            )));
        }

        let remaining = production.remaining_liters();
        if liters > remaining {
            return Err(Error::Validation(format!(
                "only {} liters of '{}' remain",
                remaining, production.name
            )));
        }

        let cost = production.cost_of(liters);
        let limit = ProfileStore::new(conn)
            .find_by_id(investor.id)?
            .and_then(|p| p.investment_limit);
        if let Some(limit) = limit {
            let invested = productions.total_invested_by(investor.id)?;
            if invested + cost > limit {
                return Err(Error::Validation(format!(
                    "investing {:.2} would exceed the limit of {:.2} ({:.2} already invested)",
                    cost, limit, invested
                )));
            }
        }

        CoinLedger::new(LedgerStore::new(conn)).debit(
            investor.id,
            cost,
            format!("Investment in {} - {}L", production.name, liters),
        )?;

        let investment = Investment::new(investor.id, production_id, liters, cost);
        productions.create_investment(&investment)?;
        productions.commit_liters(production_id, liters)?;

        info!(liters, %cost, "Investment recorded");
        Ok(investment)
    })
}

pub fn list_productions(db: &Database) -> Result<Vec<Production>> {
    db.productions().list()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coins;
    use crate::config::CoinConfig;
    use crate::members;
    use crate::models::Role;
    use rust_decimal_macros::dec;

    fn member(db: &Database, role: Role) -> Profile {
        let founder = Profile::new("founder@baas.beer", Role::Admin);
        let profile = Profile::new(format!("{}@baas.beer", Uuid::new_v4()), role);
        members::register(db, Some(&founder), &profile, &CoinConfig::default()).unwrap();
        profile
    }

    fn funding_batch(db: &Database) -> Production {
        let admin = member(db, Role::Admin);
        let production = Production::new("Pilsen Artesanal", dec!(2.50), 100);
        create_production(db, &admin, &production).unwrap();
        production
    }

    #[test]
    fn test_invest_debits_and_commits() {
        let db = Database::open_in_memory().unwrap();
        let investor = member(&db, Role::Investor);
        let production = funding_batch(&db);

        let investment = invest_with_coins(&db, &investor, production.id, 4).unwrap();
        assert_eq!(investment.amount_paid, dec!(10.00));

        assert_eq!(coins::balance(&db, investor.id).unwrap(), dec!(40));
        let history = coins::transactions(&db, investor.id).unwrap();
        assert_eq!(history[0].description, "Investment in Pilsen Artesanal - 4L");

        let stored = db.productions().find_by_id(production.id).unwrap().unwrap();
        assert_eq!(stored.liters_committed, 4);
        assert_eq!(
            db.productions()
                .list_investments_for_investor(investor.id)
                .unwrap()
                .len(),
            1
        );
    }

    #[test]
    fn test_insufficient_coins_changes_nothing() {
        let db = Database::open_in_memory().unwrap();
        let investor = member(&db, Role::Investor);
        let production = funding_batch(&db);

        // 21 liters at 2.50 costs 52.50, above the 50 coin bonus
        let err = invest_with_coins(&db, &investor, production.id, 21).unwrap_err();
        assert!(matches!(err, Error::InsufficientCoins { .. }));

        assert_eq!(coins::balance(&db, investor.id).unwrap(), dec!(50));
        let stored = db.productions().find_by_id(production.id).unwrap().unwrap();
        assert_eq!(stored.liters_committed, 0);
        assert!(db
            .productions()
            .list_investments_for_investor(investor.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_capacity_and_quantity_limits() {
        let db = Database::open_in_memory().unwrap();
        let investor = member(&db, Role::Investor);
        coins::credit(&db, investor.id, dec!(1000), "top up").unwrap();
        let production = funding_batch(&db);

        assert!(matches!(
            invest_with_coins(&db, &investor, production.id, 0).unwrap_err(),
            Error::Validation(_)
        ));
        invest_with_coins(&db, &investor, production.id, 90).unwrap();
        assert!(matches!(
            invest_with_coins(&db, &investor, production.id, 11).unwrap_err(),
            Error::Validation(_)
        ));
        invest_with_coins(&db, &investor, production.id, 10).unwrap();
    }

    #[test]
    fn test_brewer_cannot_invest() {
        let db = Database::open_in_memory().unwrap();
        let brewer = member(&db, Role::Brewer);
        let production = funding_batch(&db);

        let err = invest_with_coins(&db, &brewer, production.id, 1).unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_investor_cannot_create_production() {
        let db = Database::open_in_memory().unwrap();
        let investor = member(&db, Role::Investor);
        let err = create_production(&db, &investor, &Production::new("IPA", dec!(3), 50))
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied(_)));
    }

    #[test]
    fn test_assume_once() {
        let db = Database::open_in_memory().unwrap();
        let first = member(&db, Role::Brewer);
        let second = member(&db, Role::Brewer);
        let production = funding_batch(&db);

        let assumed = assume_production(&db, &first, production.id).unwrap();
        assert_eq!(assumed.brewer_id, Some(first.id));
        assert_eq!(assumed.status, ProductionStatus::Brewing);

        let err = assume_production(&db, &second, production.id).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));

        // Brewing batches no longer take investments
        let investor = member(&db, Role::Investor);
        let err = invest_with_coins(&db, &investor, production.id, 1).unwrap_err();
        assert!(matches!(err, Error::InvalidOperation(_)));
    }

    #[test]
    fn test_investment_limit_caps_running_total() {
        let db = Database::open_in_memory().unwrap();
        let admin = member(&db, Role::Admin);
        let investor = member(&db, Role::Investor);
        let production = funding_batch(&db);
        members::set_investment_limit(&db, &admin, investor.id, Some(dec!(20))).unwrap();

        // 6L at 2.50 is 15.00, leaving 5.00 under the limit
        invest_with_coins(&db, &investor, production.id, 6).unwrap();
        let err = invest_with_coins(&db, &investor, production.id, 3).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(coins::balance(&db, investor.id).unwrap(), dec!(35));

        invest_with_coins(&db, &investor, production.id, 2).unwrap();
        assert_eq!(
            db.productions().total_invested_by(investor.id).unwrap(),
            dec!(20.00)
        );
    }
}
