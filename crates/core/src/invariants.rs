//! Developer guardrails and invariants
//!
//! Debug assertions for detecting impossible states during development.
//! These checks are compiled out in release builds.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use crate::models::{CoinTransaction, ProposalTally, Share, TransactionType};

/// Validate a freshly computed allocation against the snapshot it came from
pub fn assert_allocation_invariants(allocated: &[u32], issued: &BTreeSet<u32>, pool_size: u32) {
    debug_assert!(
        allocated.windows(2).all(|w| w[0] < w[1]),
        "Allocation {:?} is not strictly ascending",
        allocated
    );

    for number in allocated {
        debug_assert!(
            (1..=pool_size).contains(number),
            "Share number {} outside pool 1..={}",
            number,
            pool_size
        );
        debug_assert!(
            !issued.contains(number),
            "Share number {} allocated twice",
            number
        );
    }
}

/// Validate a share record before it is written
pub fn assert_share_invariants(share: &Share, pool_size: u32) {
    debug_assert!(
        share.share_number >= 1 && share.share_number <= pool_size,
        "Share {} has number {} outside pool",
        share.id,
        share.share_number
    );

    debug_assert!(
        share.purchase_price > Decimal::ZERO,
        "Share {} has non-positive purchase price",
        share.id
    );
}

/// Validate that a ledger entry's sign matches its type
pub fn assert_transaction_invariants(entry: &CoinTransaction) {
    match entry.transaction_type {
        TransactionType::Credit => debug_assert!(
            entry.amount > Decimal::ZERO,
            "Credit {} has non-positive amount {}",
            entry.id,
            entry.amount
        ),
        TransactionType::Debit => debug_assert!(
            entry.amount < Decimal::ZERO,
            "Debit {} has non-negative amount {}",
            entry.id,
            entry.amount
        ),
    }
}

/// Validate that a balance never dips below zero
pub fn assert_balance_invariant(balance: Decimal) {
    debug_assert!(balance >= Decimal::ZERO, "Negative Beer Coin balance {}", balance);
}

/// Validate that a tally's per-option sums match its totals
pub fn assert_tally_invariants(tally: &ProposalTally) {
    let weight: u64 = tally.options.iter().map(|o| o.weight).sum();
    let ballots: u32 = tally.options.iter().map(|o| o.ballots).sum();

    debug_assert_eq!(
        weight, tally.total_weight,
        "Tally for {} has option weights summing to {} but total {}",
        tally.proposal_id, weight, tally.total_weight
    );
    debug_assert_eq!(
        ballots, tally.total_ballots,
        "Tally for {} has option ballots summing to {} but total {}",
        tally.proposal_id, ballots, tally.total_ballots
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[test]
    fn test_valid_allocation() {
        let issued: BTreeSet<u32> = [1, 2, 3].into_iter().collect();
        assert_allocation_invariants(&[4, 5], &issued, 10_000);
    }

    #[test]
    #[should_panic(expected = "allocated twice")]
    fn test_reused_number() {
        let issued: BTreeSet<u32> = [1, 2, 3].into_iter().collect();
        assert_allocation_invariants(&[3, 4], &issued, 10_000);
    }

    #[test]
    #[should_panic(expected = "outside pool")]
    fn test_number_beyond_pool() {
        assert_allocation_invariants(&[10_001], &BTreeSet::new(), 10_000);
    }

    #[test]
    fn test_valid_share() {
        let share = Share::issue(Uuid::new_v4(), 1, dec!(100));
        assert_share_invariants(&share, 10_000);
    }

    #[test]
    fn test_valid_entries() {
        let id = Uuid::new_v4();
        assert_transaction_invariants(&CoinTransaction::credit(id, dec!(5), "bonus"));
        assert_transaction_invariants(&CoinTransaction::debit(id, dec!(5), "spend"));
    }

    #[test]
    #[should_panic(expected = "Negative Beer Coin balance")]
    fn test_negative_balance() {
        assert_balance_invariant(dec!(-0.01));
    }
}
