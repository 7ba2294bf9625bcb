//! Share allocation
//!
//! Shares are numbered 1..=pool_size. A purchase claims the lowest unused
//! numbers from a snapshot of issued numbers and writes them as one batch.
//! The store's unique constraint on share numbers is the real guard: if a
//! concurrent buyer claims one of the numbers first, the batch is rolled
//! back and the allocator retries against a fresh snapshot.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::config::ShareConfig;
use crate::error::{Error, Result};
use crate::invariants::{assert_allocation_invariants, assert_share_invariants};
use crate::models::{Share, SharePurchase};
use crate::storage::ShareRepository;

/// Lowest `quantity` numbers in 1..=pool_size missing from `issued`.
///
/// Returns fewer than `quantity` numbers when the pool runs out.
pub fn lowest_available(issued: &BTreeSet<u32>, pool_size: u32, quantity: u32) -> Vec<u32> {
    (1..=pool_size)
        .filter(|n| !issued.contains(n))
        .take(quantity as usize)
        .collect()
}

/// Unused numbers left in the pool
pub fn remaining_in_pool(issued: &BTreeSet<u32>, pool_size: u32) -> u32 {
    let used = issued.range(1..=pool_size).count() as u32;
    pool_size - used
}

/// Assigns share numbers to buyers at a fixed unit price
#[derive(Debug, Clone)]
pub struct ShareAllocator {
    pool_size: u32,
    unit_price: Decimal,
    max_per_purchase: u32,
    attempts: u32,
}

impl ShareAllocator {
    pub fn new(config: &ShareConfig) -> Self {
        Self {
            pool_size: config.pool_size,
            unit_price: config.unit_price,
            max_per_purchase: config.max_per_purchase,
            attempts: config.allocation_attempts.max(1),
        }
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Price of `quantity` shares
    pub fn quote(&self, quantity: u32) -> Decimal {
        self.unit_price * Decimal::from(quantity)
    }

    fn validate_quantity(&self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(Error::Validation("quantity must be at least 1".into()));
        }
        if quantity > self.max_per_purchase {
            return Err(Error::Validation(format!(
                "quantity {} exceeds the per-purchase limit of {}",
                quantity, self.max_per_purchase
            )));
        }
        Ok(())
    }

    /// Allocate and issue `quantity` shares to `owner_id`.
    ///
    /// Either every share is written or none is.
    #[instrument(skip(self, store), fields(owner_id = %owner_id))]
    pub fn purchase<S>(&self, store: &S, owner_id: Uuid, quantity: u32) -> Result<SharePurchase>
    where
        S: ShareRepository + ?Sized,
    {
        self.validate_quantity(quantity)?;

        let mut available = 0;
        for attempt in 1..=self.attempts {
            let issued = store.list_issued_share_numbers()?;
            available = remaining_in_pool(&issued, self.pool_size);

            let numbers = lowest_available(&issued, self.pool_size, quantity);
            if (numbers.len() as u32) < quantity {
                info!(quantity, available, "Not enough unused shares");
                return Err(Error::InsufficientShares {
                    requested: quantity,
                    available,
                });
            }
            assert_allocation_invariants(&numbers, &issued, self.pool_size);

            let shares: Vec<Share> = numbers
                .iter()
                .map(|&n| Share::issue(owner_id, n, self.unit_price))
                .collect();
            for share in &shares {
                assert_share_invariants(share, self.pool_size);
            }

            match store.insert_shares(&shares) {
                Ok(()) => {
                    info!(
                        quantity,
                        first = numbers[0],
                        last = numbers[numbers.len() - 1],
                        "Shares issued"
                    );
                    return Ok(SharePurchase {
                        owner_id,
                        total_price: self.quote(quantity),
                        unit_price: self.unit_price,
                        share_numbers: numbers,
                    });
                }
                Err(Error::ShareConflict) => {
                    warn!(attempt, "Share numbers taken concurrently, retrying with fresh snapshot");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        debug!(attempts = self.attempts, "Allocation attempts exhausted");
        Err(Error::InsufficientShares {
            requested: quantity,
            available,
        })
    }
}
