use tally_core::{BankColumnType, BankTransaction, BankValue, Money};

use crate::ImportError;

/// A bank CSV split into its header and raw data rows. Column semantics are
/// not known at this stage; the user assigns them afterwards and
/// [`compute_outflow`] applies the assignment per row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBankCsv {
    pub column_names: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Parse a bank export into header + rows.
///
/// The first record is the header and fixes the column count. Data rows with
/// extra trailing fields are truncated to the header width — at least one
/// large bank's export ends every data row with a spare comma — while rows
/// that come up short are rejected as malformed. `limit` bounds the number
/// of data rows read, for bounded previews.
pub fn parse_bank_csv(input: &str, limit: Option<usize>) -> Result<RawBankCsv, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input.as_bytes());
    let mut records = reader.records();

    let column_names: Vec<String> = match records.next() {
        Some(first) => first?.iter().map(|s| s.to_string()).collect(),
        None => {
            return Ok(RawBankCsv {
                column_names: Vec::new(),
                rows: Vec::new(),
            })
        }
    };

    let mut rows: Vec<Vec<String>> = Vec::new();
    while limit.map_or(true, |n| rows.len() < n) {
        let Some(result) = records.next() else { break };
        let record = result?;
        let mut fields: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if fields.len() < column_names.len() {
            // Header row is row 1.
            return Err(ImportError::RaggedRow {
                row: rows.len() + 2,
                got: fields.len(),
                want: column_names.len(),
            });
        }
        fields.truncate(column_names.len());
        rows.push(fields);
    }

    Ok(RawBankCsv { column_names, rows })
}

/// Apply a per-column type assignment to one raw row and compute its net
/// outflow: outflow-tagged amounts minus inflow-tagged amounts.
///
/// Cells in tagged columns are parsed with [`Money::parse`]; a blank cell
/// counts as zero (debit/credit exports leave the unused column empty).
/// Columns beyond the assignment keep raw text only. `row_number` is used
/// for error context.
pub fn compute_outflow(
    column_types: &[BankColumnType],
    row: &[String],
    row_number: usize,
) -> Result<BankTransaction, ImportError> {
    let mut values = Vec::with_capacity(row.len());
    for (index, raw) in row.iter().enumerate() {
        let column_type = column_types.get(index).copied().unwrap_or_default();
        let value = match column_type {
            BankColumnType::Other => BankValue::Other { raw: raw.clone() },
            BankColumnType::Inflow | BankColumnType::Outflow => {
                let amount = parse_cell(raw).map_err(|_| ImportError::InvalidAmount {
                    row: row_number,
                    column: format!("column {}", index + 1),
                    value: raw.clone(),
                })?;
                match column_type {
                    BankColumnType::Inflow => BankValue::Inflow {
                        raw: raw.clone(),
                        amount,
                    },
                    _ => BankValue::Outflow {
                        raw: raw.clone(),
                        amount,
                    },
                }
            }
        };
        values.push(value);
    }
    Ok(BankTransaction::from_values(values))
}

fn parse_cell(raw: &str) -> Result<Money, tally_core::MoneyParseError> {
    if raw.trim().is_empty() {
        Ok(Money::zero())
    } else {
        Money::parse(raw)
    }
}
