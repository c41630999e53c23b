use std::collections::BTreeMap;

use serde::Serialize;
use tally_core::Money;

use crate::mismatch::Mismatch;

/// A filter is keyed by its amount's minor-unit value.
pub type FilterKey = i64;

/// One togglable entry in the filter list shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Filter {
    pub key: FilterKey,
    pub mismatch: Mismatch,
    pub enabled: bool,
}

/// Sticky filter state over the mismatch engine's output.
///
/// Enabled filters survive recomputation: when the last instance of a
/// mismatch is resolved, its enabled filter sticks around (with counts
/// zeroed) until the user turns it off. This keeps the filter list from
/// changing shape out from under the user just because they fixed an
/// imbalance.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    /// Current mismatches, by key.
    live: BTreeMap<FilterKey, Mismatch>,
    /// Enabled filter keys and the amount each was enabled for. The amount
    /// is redundant with the key, but lets a vanished mismatch be
    /// re-synthesized without decoding the key.
    enabled: BTreeMap<FilterKey, Money>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the live mismatch set after a recompute. Enabled selections
    /// are untouched.
    pub fn update(&mut self, mismatches: Vec<Mismatch>) {
        self.live = mismatches
            .into_iter()
            .map(|m| (m.amount.key(), m))
            .collect();
    }

    pub fn live_mismatches(&self) -> Vec<Mismatch> {
        self.live.values().copied().collect()
    }

    /// The filter list to present, ascending by amount: every live mismatch,
    /// plus a zombie entry (counts 0/0, always enabled) for each enabled key
    /// whose mismatch has been resolved. Keys are unique, so no tie-break is
    /// needed.
    pub fn available_filters(&self) -> Vec<Filter> {
        let mut filters: Vec<Filter> = self
            .live
            .values()
            .map(|m| Filter {
                key: m.amount.key(),
                mismatch: *m,
                enabled: self.enabled.contains_key(&m.amount.key()),
            })
            .collect();

        for (&key, &amount) in &self.enabled {
            if !self.live.contains_key(&key) {
                filters.push(Filter {
                    key,
                    mismatch: Mismatch {
                        amount,
                        ledger_count: 0,
                        bank_count: 0,
                    },
                    enabled: true,
                });
            }
        }

        filters.sort_by_key(|f| f.key);
        filters
    }

    /// Enabling requires a live mismatch for the key — a zombie can only be
    /// turned off, never back on. Disabling a zombie drops it from the next
    /// `available_filters` entirely.
    pub fn set_filter_enabled(&mut self, key: FilterKey, enabled: bool) {
        if enabled {
            if let Some(mismatch) = self.live.get(&key) {
                self.enabled.insert(key, mismatch.amount);
            }
        } else {
            self.enabled.remove(&key);
        }
    }

    pub fn is_enabled(&self, key: FilterKey) -> bool {
        self.enabled.contains_key(&key)
    }

    pub fn any_enabled(&self) -> bool {
        !self.enabled.is_empty()
    }

    /// With nothing enabled every amount passes; otherwise only amounts
    /// whose key is enabled do. Orthogonal to exclusion-from-comparison,
    /// which the caller applies separately.
    pub fn amount_passes_filter(&self, amount: Money) -> bool {
        self.enabled.is_empty() || self.enabled.contains_key(&amount.key())
    }
}
