//! Holdings summary shown on a member's dashboard

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::config::ShareConfig;
use crate::error::Result;
use crate::models::SharesOverview;
use crate::storage::ShareRepository;
use crate::voting::voting_power_percentage;

pub fn shares_overview<S>(store: &S, profile_id: Uuid, config: &ShareConfig) -> Result<SharesOverview>
where
    S: ShareRepository + ?Sized,
{
    let owned = store.list_shares_by_owner(profile_id)?;
    let total_issued = store.count_issued_shares()?;
    let user_shares = owned.len() as u32;

    Ok(SharesOverview {
        user_shares,
        total_issued,
        available: config.pool_size.saturating_sub(total_issued),
        share_value: config.unit_price,
        invested_value: owned.iter().map(|s| s.purchase_price).sum::<Decimal>(),
        voting_power_pct: voting_power_percentage(user_shares, config.pool_size),
    })
}
