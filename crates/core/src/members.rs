//! Member registration and role management

use rust_decimal::Decimal;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::coins::{CoinLedger, WELCOME_BONUS_DESCRIPTION};
use crate::config::CoinConfig;
use crate::error::{Error, Result};
use crate::models::{Profile, Role};
use crate::permissions::{self, Capability};
use crate::storage::{Database, LedgerStore, ProfileStore};

/// Create a profile and credit its welcome bonus together.
///
/// Anyone may join as an investor. Any other role needs an `actor` holding
/// ManageUsers, except for the first profile, which bootstraps the admin.
#[instrument(skip(db, actor, profile, coins), fields(email = %profile.email))]
pub fn register(
    db: &Database,
    actor: Option<&Profile>,
    profile: &Profile,
    coins: &CoinConfig,
) -> Result<()> {
    let email = profile.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation(format!(
            "'{}' is not a valid email address",
            profile.email
        )));
    }

    db.atomically(|conn| {
        let profiles = ProfileStore::new(conn);
        if profile.role != Role::Investor && profiles.count()? > 0 {
            match actor {
                Some(actor) => permissions::require(actor.role, Capability::ManageUsers)?,
                None => {
                    return Err(Error::PermissionDenied(format!(
                        "registering a {} requires a user manager",
                        profile.role
                    )));
                }
            }
        }

        profiles.create(profile)?;
        if coins.welcome_bonus > Decimal::ZERO {
            CoinLedger::new(LedgerStore::new(conn)).credit(
                profile.id,
                coins.welcome_bonus,
                WELCOME_BONUS_DESCRIPTION,
            )?;
        }
        Ok(())
    })?;

    info!(role = profile.role.as_str(), "Profile registered");
    Ok(())
}

/// Look up the profile acting on a request
pub fn find_by_email(db: &Database, email: &str) -> Result<Profile> {
    db.profiles()
        .find_by_email(email.trim())?
        .ok_or_else(|| Error::NotFound(format!("profile '{}'", email)))
}

/// Change another member's role; only user managers may do this
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub fn change_role(db: &Database, actor: &Profile, target_id: Uuid, role: Role) -> Result<()> {
    permissions::require(actor.role, Capability::ManageUsers)?;
    db.profiles().update_role(target_id, role)?;
    info!("Role changed");
    Ok(())
}

/// Stop a member from acting; they keep their shares and coins
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub fn deactivate(db: &Database, actor: &Profile, target_id: Uuid) -> Result<()> {
    set_active(db, actor, target_id, false)
}

#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub fn reactivate(db: &Database, actor: &Profile, target_id: Uuid) -> Result<()> {
    set_active(db, actor, target_id, true)
}

fn set_active(db: &Database, actor: &Profile, target_id: Uuid, active: bool) -> Result<()> {
    permissions::require(actor.role, Capability::ManageUsers)?;
    if !active && actor.id == target_id {
        return Err(Error::InvalidOperation(
            "cannot deactivate your own profile".into(),
        ));
    }
    db.profiles().set_active(target_id, active)?;
    info!(active, "Profile status changed");
    Ok(())
}

/// Cap the total Beer Coins a member may invest; `None` removes the cap
#[instrument(skip(db, actor), fields(actor_id = %actor.id))]
pub fn set_investment_limit(
    db: &Database,
    actor: &Profile,
    target_id: Uuid,
    limit: Option<Decimal>,
) -> Result<()> {
    permissions::require(actor.role, Capability::ManageUsers)?;
    if let Some(limit) = limit {
        if limit < Decimal::ZERO {
            return Err(Error::Validation("investment limit cannot be negative".into()));
        }
    }
    db.profiles().set_investment_limit(target_id, limit)?;
    info!("Investment limit changed");
    Ok(())
}
