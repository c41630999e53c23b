pub mod bank;
pub mod ledger;
pub mod profile;

use thiserror::Error;

pub use bank::{compute_outflow, parse_bank_csv, RawBankCsv};
pub use ledger::parse_ledger_csv;
pub use profile::ColumnProfile;

/// Everything that can go wrong while importing a CSV export.
///
/// Each variant is distinguishable so a caller can tell "this is a
/// recognizable import problem" (show the message, let the user re-export)
/// apart from an unexpected bug.
#[derive(Error, Debug)]
pub enum ImportError {
    /// Structurally malformed CSV: broken quoting, inconsistent record
    /// lengths on the ledger side, unreadable input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A bank data row with fewer fields than the header declares. Rows
    /// with extra trailing fields are tolerated; short rows are not.
    #[error("Row {row} has {got} fields but the header has {want}")]
    RaggedRow { row: usize, got: usize, want: usize },

    #[error(
        "The \"{0}\" column is missing. Make sure this CSV file was exported \
         from your budgeting ledger and try again."
    )]
    MissingColumn(&'static str),

    #[error(
        "Unrecognized value in \"Cleared\" column: \"{0}\". Make sure this \
         CSV file was exported from your budgeting ledger and try again."
    )]
    InvalidCleared(String),

    #[error("Cannot parse \"{value}\" as an amount in the \"{column}\" column (row {row})")]
    InvalidAmount {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Invalid column profile: {0}")]
    InvalidProfile(String),
}
