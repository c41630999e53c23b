use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::money::Money;

/// Cleared status of a ledger transaction, as exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cleared {
    Cleared,
    Uncleared,
    Reconciled,
}

impl FromStr for Cleared {
    type Err = String;

    /// The export writes exactly one of three literals, case-sensitive.
    /// Anything else means the file is not a ledger export (or a future
    /// format change) and the offending value is handed back to the caller.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cleared" => Ok(Cleared::Cleared),
            "Uncleared" => Ok(Cleared::Uncleared),
            "Reconciled" => Ok(Cleared::Reconciled),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for Cleared {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cleared::Cleared => write!(f, "Cleared"),
            Cleared::Uncleared => write!(f, "Uncleared"),
            Cleared::Reconciled => write!(f, "Reconciled"),
        }
    }
}

/// One category-tagged part of a split transaction. Account, date and
/// cleared status live on the parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerSubtransaction {
    pub payee: String,
    pub category_group: String,
    pub category: String,
    pub memo: String,
    pub outflow: Money,
}

/// A normalized transaction from the budgeting-ledger export.
///
/// A non-split transaction has an empty `subtransactions` list. For a split
/// parent, `outflow` is the sum of the parts and the per-category fields
/// (`payee`, `category_group`, `category`, `memo`) are empty — the flattened
/// export only carries them on the parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerTransaction {
    pub account: String,
    pub flag: String,
    /// Kept verbatim from the export; the date format is locale-dependent
    /// and the comparison never does date arithmetic.
    pub date: String,
    pub payee: String,
    pub category_group: String,
    pub category: String,
    pub memo: String,
    pub outflow: Money,
    pub cleared: Cleared,
    pub subtransactions: Vec<LedgerSubtransaction>,
}

impl LedgerTransaction {
    pub fn is_split(&self) -> bool {
        !self.subtransactions.is_empty()
    }

    pub fn subtransaction_total(&self) -> Money {
        self.subtransactions
            .iter()
            .map(|s| s.outflow)
            .fold(Money::zero(), |a, b| a + b)
    }
}

/// User-assigned meaning of one bank CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BankColumnType {
    Inflow,
    Outflow,
    #[default]
    Other,
}

impl fmt::Display for BankColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BankColumnType::Inflow => write!(f, "inflow"),
            BankColumnType::Outflow => write!(f, "outflow"),
            BankColumnType::Other => write!(f, "other"),
        }
    }
}

/// One parsed bank CSV cell. A monetary amount exists exactly when the
/// column is tagged inflow or outflow; untagged columns keep raw text only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BankValue {
    Inflow { raw: String, amount: Money },
    Outflow { raw: String, amount: Money },
    Other { raw: String },
}

impl BankValue {
    pub fn raw(&self) -> &str {
        match self {
            BankValue::Inflow { raw, .. }
            | BankValue::Outflow { raw, .. }
            | BankValue::Other { raw } => raw,
        }
    }

    pub fn column_type(&self) -> BankColumnType {
        match self {
            BankValue::Inflow { .. } => BankColumnType::Inflow,
            BankValue::Outflow { .. } => BankColumnType::Outflow,
            BankValue::Other { .. } => BankColumnType::Other,
        }
    }
}

/// A normalized bank transaction: the row's cells plus its net outflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub values: Vec<BankValue>,
    pub outflow: Money,
}

impl BankTransaction {
    /// Net outflow is outflow-column amounts minus inflow-column amounts,
    /// so an inflow recorded on its own line nets out against the charges.
    pub fn from_values(values: Vec<BankValue>) -> Self {
        let outflow = values.iter().fold(Money::zero(), |acc, v| match v {
            BankValue::Outflow { amount, .. } => acc + *amount,
            BankValue::Inflow { amount, .. } => acc - *amount,
            BankValue::Other { .. } => acc,
        });
        BankTransaction { values, outflow }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleared_from_str_recognizes_export_literals() {
        assert_eq!(Cleared::from_str("Cleared").unwrap(), Cleared::Cleared);
        assert_eq!(Cleared::from_str("Uncleared").unwrap(), Cleared::Uncleared);
        assert_eq!(Cleared::from_str("Reconciled").unwrap(), Cleared::Reconciled);
    }

    #[test]
    fn cleared_from_str_is_case_sensitive() {
        assert_eq!(Cleared::from_str("cleared"), Err("cleared".to_string()));
        assert_eq!(Cleared::from_str("CLEARED"), Err("CLEARED".to_string()));
        assert_eq!(Cleared::from_str(""), Err(String::new()));
    }

    #[test]
    fn subtransaction_total_sums_parts() {
        let tx = LedgerTransaction {
            account: "Checking".to_string(),
            flag: String::new(),
            date: "11/02/2024".to_string(),
            payee: String::new(),
            category_group: String::new(),
            category: String::new(),
            memo: String::new(),
            outflow: Money::from_cents(5555),
            cleared: Cleared::Cleared,
            subtransactions: vec![
                LedgerSubtransaction {
                    payee: "A".to_string(),
                    category_group: "G1".to_string(),
                    category: "C1".to_string(),
                    memo: "first".to_string(),
                    outflow: Money::from_cents(2222),
                },
                LedgerSubtransaction {
                    payee: "B".to_string(),
                    category_group: "G2".to_string(),
                    category: "C2".to_string(),
                    memo: "second".to_string(),
                    outflow: Money::from_cents(3333),
                },
            ],
        };
        assert!(tx.is_split());
        assert_eq!(tx.subtransaction_total(), tx.outflow);
    }

    #[test]
    fn bank_transaction_nets_inflows_against_outflows() {
        let tx = BankTransaction::from_values(vec![
            BankValue::Inflow {
                raw: "$100".to_string(),
                amount: Money::from_cents(10000),
            },
            BankValue::Outflow {
                raw: "$100".to_string(),
                amount: Money::from_cents(10000),
            },
            BankValue::Other {
                raw: "$100".to_string(),
            },
        ]);
        assert!(tx.outflow.is_zero());
    }

    #[test]
    fn bank_transaction_handles_negative_amounts() {
        let tx = BankTransaction::from_values(vec![
            BankValue::Inflow {
                raw: "-$50.50".to_string(),
                amount: Money::from_cents(-5050),
            },
            BankValue::Outflow {
                raw: "-$75.50".to_string(),
                amount: Money::from_cents(-7550),
            },
            BankValue::Other {
                raw: "blah".to_string(),
            },
        ]);
        assert_eq!(tx.outflow.to_cents(), -2500);
    }

    #[test]
    fn bank_value_accessors() {
        let v = BankValue::Outflow {
            raw: "12.00".to_string(),
            amount: Money::from_cents(1200),
        };
        assert_eq!(v.raw(), "12.00");
        assert_eq!(v.column_type(), BankColumnType::Outflow);

        let o = BankValue::Other {
            raw: "memo text".to_string(),
        };
        assert_eq!(o.column_type(), BankColumnType::Other);
    }
}
