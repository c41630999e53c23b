use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_core::Money;

/// One amount whose occurrence count differs between the two sides.
/// Recomputed fresh whenever either side's active amounts change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub amount: Money,
    pub ledger_count: u32,
    pub bank_count: u32,
}

/// Diff two amount multisets: count occurrences of each distinct amount on
/// each side, and report every amount where the counts disagree. Amounts
/// with equal counts are reconciled and dropped.
///
/// Both inputs should already have exclusion-flagged transactions filtered
/// out; that policy belongs to the caller. Amounts compare by minor-unit
/// value only, so `"$100.00"` and `"€100.00"` land in the same tally.
///
/// The result is ascending by amount; consumers that present filters
/// re-sort at their own boundary anyway.
pub fn find_mismatches(ledger: &[Money], bank: &[Money]) -> Vec<Mismatch> {
    let mut tallies: BTreeMap<i64, Mismatch> = BTreeMap::new();

    for &amount in ledger {
        tallies
            .entry(amount.key())
            .or_insert_with(|| Mismatch {
                amount,
                ledger_count: 0,
                bank_count: 0,
            })
            .ledger_count += 1;
    }
    for &amount in bank {
        tallies
            .entry(amount.key())
            .or_insert_with(|| Mismatch {
                amount,
                ledger_count: 0,
                bank_count: 0,
            })
            .bank_count += 1;
    }

    tallies
        .into_values()
        .filter(|m| m.ledger_count != m.bank_count)
        .collect()
}
