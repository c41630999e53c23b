pub mod filters;
pub mod mismatch;
pub mod state;

pub use filters::{Filter, FilterKey, FilterState};
pub use mismatch::{find_mismatches, Mismatch};
pub use state::{
    ledger_account_names, select_account, BankImport, Compared, LedgerImport, ReconState, Side,
};
