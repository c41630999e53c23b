pub mod money;
pub mod transaction;

pub use money::{Money, MoneyParseError};
pub use transaction::{
    BankColumnType, BankTransaction, BankValue, Cleared, LedgerSubtransaction, LedgerTransaction,
};
