use serde::{Deserialize, Serialize};
use tally_core::{BankColumnType, BankTransaction, LedgerTransaction, Money};

use crate::filters::{Filter, FilterKey, FilterState};
use crate::mismatch::{find_mismatches, Mismatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Ledger,
    Bank,
}

/// A transaction annotated with its comparison status. Excluded
/// transactions stay visible (unless hidden) but don't feed the mismatch
/// engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Compared<T> {
    pub transaction: T,
    pub excluded: bool,
}

impl<T> Compared<T> {
    pub fn included(transaction: T) -> Self {
        Compared {
            transaction,
            excluded: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerImport {
    pub filename: String,
    /// The ledger export can mix accounts; the user compares one at a time.
    pub account: Option<String>,
    pub transactions: Vec<Compared<LedgerTransaction>>,
}

#[derive(Debug, Clone)]
pub struct BankImport {
    pub filename: String,
    pub column_names: Vec<String>,
    pub column_types: Vec<BankColumnType>,
    pub transactions: Vec<Compared<BankTransaction>>,
}

/// The comparison state: both imports, per-transaction exclusion flags, the
/// show-excluded toggle, and the sticky amount filters.
///
/// Every mutation that changes either side's active amount multiset
/// recomputes the mismatches and pushes them into the filter state, so
/// filter stickiness carries across changes. All derivations are pure reads.
#[derive(Debug, Clone)]
pub struct ReconState {
    ledger: Option<LedgerImport>,
    bank: Option<BankImport>,
    show_excluded: bool,
    filters: FilterState,
}

impl Default for ReconState {
    fn default() -> Self {
        ReconState {
            ledger: None,
            bank: None,
            show_excluded: true,
            filters: FilterState::new(),
        }
    }
}

impl ReconState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> Option<&LedgerImport> {
        self.ledger.as_ref()
    }

    pub fn bank(&self) -> Option<&BankImport> {
        self.bank.as_ref()
    }

    pub fn show_excluded(&self) -> bool {
        self.show_excluded
    }

    pub fn complete_ledger_import(&mut self, import: LedgerImport) {
        self.ledger = Some(import);
        self.recompute();
    }

    pub fn complete_bank_import(&mut self, import: BankImport) {
        self.bank = Some(import);
        self.recompute();
    }

    /// Flip one transaction's excluded-from-comparison flag. Out-of-range
    /// indices and not-yet-imported sides are ignored.
    pub fn toggle_exclusion(&mut self, side: Side, index: usize) {
        let flipped = match side {
            Side::Ledger => self
                .ledger
                .as_mut()
                .and_then(|i| i.transactions.get_mut(index))
                .map(|entry| entry.excluded = !entry.excluded)
                .is_some(),
            Side::Bank => self
                .bank
                .as_mut()
                .and_then(|i| i.transactions.get_mut(index))
                .map(|entry| entry.excluded = !entry.excluded)
                .is_some(),
        };

        if flipped {
            self.recompute();
        }
    }

    pub fn toggle_show_excluded(&mut self) {
        self.show_excluded = !self.show_excluded;
    }

    /// Toggle an amount filter. Enabling only takes effect for a key with a
    /// live mismatch; disabling a zombie removes it permanently.
    pub fn toggle_filter(&mut self, key: FilterKey) {
        let enable = !self.filters.is_enabled(key);
        self.filters.set_filter_enabled(key, enable);
    }

    pub fn mismatches(&self) -> Vec<Mismatch> {
        self.filters.live_mismatches()
    }

    pub fn available_filters(&self) -> Vec<Filter> {
        self.filters.available_filters()
    }

    pub fn amount_passes_filter(&self, amount: Money) -> bool {
        self.filters.amount_passes_filter(amount)
    }

    /// Ledger transactions passing both the amount filter and the
    /// show-excluded policy, in import order.
    pub fn visible_ledger(&self) -> Vec<&Compared<LedgerTransaction>> {
        match &self.ledger {
            Some(import) => self.visible(&import.transactions, |t| t.outflow),
            None => Vec::new(),
        }
    }

    pub fn visible_bank(&self) -> Vec<&Compared<BankTransaction>> {
        match &self.bank {
            Some(import) => self.visible(&import.transactions, |t| t.outflow),
            None => Vec::new(),
        }
    }

    fn visible<'a, T>(
        &self,
        transactions: &'a [Compared<T>],
        outflow: impl Fn(&T) -> Money,
    ) -> Vec<&'a Compared<T>> {
        transactions
            .iter()
            .filter(|entry| {
                let passes_amount = self.filters.amount_passes_filter(outflow(&entry.transaction));
                let passes_exclusion = self.show_excluded || !entry.excluded;
                passes_amount && passes_exclusion
            })
            .collect()
    }

    /// Mismatches only exist once both sides are imported; until then the
    /// live set is empty (and any enabled filters ride along as zombies).
    fn recompute(&mut self) {
        let mismatches = match (&self.ledger, &self.bank) {
            (Some(ledger), Some(bank)) => {
                let ledger_amounts: Vec<Money> = ledger
                    .transactions
                    .iter()
                    .filter(|e| !e.excluded)
                    .map(|e| e.transaction.outflow)
                    .collect();
                let bank_amounts: Vec<Money> = bank
                    .transactions
                    .iter()
                    .filter(|e| !e.excluded)
                    .map(|e| e.transaction.outflow)
                    .collect();
                find_mismatches(&ledger_amounts, &bank_amounts)
            }
            _ => Vec::new(),
        };
        self.filters.update(mismatches);
    }
}

/// Distinct account names in first-appearance order, for the account picker.
pub fn ledger_account_names(transactions: &[LedgerTransaction]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for tx in transactions {
        if !names.iter().any(|n| n == &tx.account) {
            names.push(tx.account.clone());
        }
    }
    names
}

/// Account-picker rules: a single option auto-selects; a selection that
/// vanished from the options clears; otherwise the current choice stands.
pub fn select_account(options: &[String], current: Option<&str>) -> Option<String> {
    if options.len() == 1 {
        return Some(options[0].clone());
    }
    match current {
        Some(selection) if options.iter().any(|o| o == selection) => Some(selection.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tally_core::{BankValue, Cleared};

    fn ledger_tx(account: &str, cents: i64) -> LedgerTransaction {
        LedgerTransaction {
            account: account.to_string(),
            flag: String::new(),
            date: "11/01/2024".to_string(),
            payee: "Payee".to_string(),
            category_group: "Group".to_string(),
            category: "Category".to_string(),
            memo: String::new(),
            outflow: Money::from_cents(cents),
            cleared: Cleared::Cleared,
            subtransactions: Vec::new(),
        }
    }

    fn bank_tx(cents: i64) -> BankTransaction {
        BankTransaction::from_values(vec![BankValue::Outflow {
            raw: format!("{}.{:02}", cents / 100, (cents % 100).abs()),
            amount: Money::from_cents(cents),
        }])
    }

    fn state_with(ledger_cents: &[i64], bank_cents: &[i64]) -> ReconState {
        let mut state = ReconState::new();
        state.complete_ledger_import(LedgerImport {
            filename: "ledger.csv".to_string(),
            account: None,
            transactions: ledger_cents
                .iter()
                .map(|&c| Compared::included(ledger_tx("Checking", c)))
                .collect(),
        });
        state.complete_bank_import(BankImport {
            filename: "bank.csv".to_string(),
            column_names: vec!["Amount".to_string()],
            column_types: vec![BankColumnType::Outflow],
            transactions: bank_cents
                .iter()
                .map(|&c| Compared::included(bank_tx(c)))
                .collect(),
        });
        state
    }

    #[test]
    fn no_mismatches_until_both_sides_imported() {
        let mut state = ReconState::new();
        state.complete_ledger_import(LedgerImport {
            filename: "ledger.csv".to_string(),
            account: None,
            transactions: vec![Compared::included(ledger_tx("Checking", 100))],
        });
        assert!(state.mismatches().is_empty());
        assert!(state.available_filters().is_empty());
    }

    #[test]
    fn mismatches_reflect_both_sides() {
        let state = state_with(&[100, 200], &[100, 300]);
        let mismatches = state.mismatches();
        let keys: Vec<i64> = mismatches.iter().map(|m| m.amount.key()).collect();
        assert_eq!(keys, vec![200, 300]);
    }

    #[test]
    fn excluding_a_transaction_removes_its_amount_from_comparison() {
        let mut state = state_with(&[100, 200], &[100]);
        assert_eq!(state.mismatches().len(), 1);

        // Exclude the unmatched $2.00 ledger row; everything reconciles.
        state.toggle_exclusion(Side::Ledger, 1);
        assert!(state.mismatches().is_empty());

        // And back.
        state.toggle_exclusion(Side::Ledger, 1);
        assert_eq!(state.mismatches().len(), 1);
    }

    #[test]
    fn exclusion_preserves_filter_stickiness() {
        let mut state = state_with(&[100, 200], &[100]);
        state.toggle_filter(200);
        assert!(state.available_filters()[0].enabled);

        // Resolving the mismatch by excluding the row leaves a zombie.
        state.toggle_exclusion(Side::Ledger, 1);
        let filters = state.available_filters();
        assert_eq!(filters.len(), 1);
        assert!(filters[0].enabled);
        assert_eq!(filters[0].mismatch.ledger_count, 0);
        assert_eq!(filters[0].mismatch.bank_count, 0);

        // Toggling the zombie off removes it.
        state.toggle_filter(200);
        assert!(state.available_filters().is_empty());
    }

    #[test]
    fn visible_lists_apply_amount_filter_to_both_sides() {
        let mut state = state_with(&[100, 200], &[100, 300]);
        state.toggle_filter(200);

        let ledger = state.visible_ledger();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].transaction.outflow.key(), 200);

        // The bank side has no $2.00 row, so nothing passes there.
        assert!(state.visible_bank().is_empty());
    }

    #[test]
    fn visible_lists_honor_show_excluded() {
        let mut state = state_with(&[100, 200], &[100]);
        state.toggle_exclusion(Side::Ledger, 1);

        // Excluded rows still show by default.
        assert_eq!(state.visible_ledger().len(), 2);

        state.toggle_show_excluded();
        let visible = state.visible_ledger();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].transaction.outflow.key(), 100);
    }

    #[test]
    fn toggle_filter_only_enables_live_mismatches() {
        let mut state = state_with(&[100], &[100]);
        state.toggle_filter(100);
        assert!(state.available_filters().is_empty());
        assert!(state.amount_passes_filter(Money::from_cents(999)));
    }

    #[test]
    fn account_names_are_distinct_in_first_appearance_order() {
        let transactions = vec![
            ledger_tx("Checking", 1),
            ledger_tx("Savings", 2),
            ledger_tx("Checking", 3),
        ];
        assert_eq!(ledger_account_names(&transactions), vec!["Checking", "Savings"]);
    }

    #[test]
    fn single_account_option_auto_selects() {
        let options = vec!["Checking".to_string()];
        assert_eq!(select_account(&options, None), Some("Checking".to_string()));
        assert_eq!(
            select_account(&options, Some("Savings")),
            Some("Checking".to_string())
        );
    }

    #[test]
    fn vanished_selection_clears() {
        let options = vec!["Checking".to_string(), "Savings".to_string()];
        assert_eq!(select_account(&options, Some("Old Account")), None);
        assert_eq!(select_account(&[], Some("Checking")), None);
    }

    #[test]
    fn valid_selection_stands() {
        let options = vec!["Checking".to_string(), "Savings".to_string()];
        assert_eq!(
            select_account(&options, Some("Savings")),
            Some("Savings".to_string())
        );
        assert_eq!(select_account(&options, None), None);
    }
}
