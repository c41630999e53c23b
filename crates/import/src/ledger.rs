use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use tally_core::{Cleared, LedgerSubtransaction, LedgerTransaction, Money};

use crate::ImportError;

/// Column names a ledger export must carry. Order in the file is irrelevant;
/// columns are matched by header name and extras are ignored.
const REQUIRED_COLUMNS: [&str; 10] = [
    "Account",
    "Flag",
    "Date",
    "Payee",
    "Category Group",
    "Category",
    "Memo",
    "Outflow",
    "Inflow",
    "Cleared",
];

/// Parse a budgeting-ledger CSV export into normalized transactions,
/// recombining split transactions from their flattened rows.
///
/// The export writes a split transaction as consecutive rows whose memos
/// look like `Split (1/2) lunch`, `Split (2/2) parking`. Those rows fold
/// back into one parent whose outflow is the sum of the parts — the figure
/// the bank statement will actually show.
///
/// `limit` bounds the raw data records consumed (a bounded preview). Every
/// transaction consumes at least one record, so the result is a prefix of
/// the unlimited parse; a split straddling the boundary is emitted with the
/// parts seen so far.
pub fn parse_ledger_csv(
    input: &str,
    limit: Option<usize>,
) -> Result<Vec<LedgerTransaction>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(input.as_bytes());
    let columns = ColumnIndexes::resolve(reader.headers()?)?;

    let mut transactions: Vec<LedgerTransaction> = Vec::new();
    let mut split: Option<SplitContext> = None;
    let mut records = reader.records();
    let mut consumed = 0usize;

    while limit.map_or(true, |n| consumed < n) {
        let Some(result) = records.next() else { break };
        let record = result?;
        consumed += 1;
        // Header row is row 1.
        let row = columns.extract(&record, consumed + 1)?;

        match parse_split_memo(&row.memo) {
            Some(info) => {
                let complete = {
                    let context = split.get_or_insert_with(|| SplitContext {
                        expected: info.total,
                        account: row.account.clone(),
                        flag: row.flag.clone(),
                        date: row.date.clone(),
                        cleared: row.cleared,
                        parts: Vec::new(),
                    });
                    context.parts.push((
                        info.index,
                        LedgerSubtransaction {
                            payee: row.payee,
                            category_group: row.category_group,
                            category: row.category,
                            memo: info.memo,
                            outflow: row.outflow,
                        },
                    ));
                    context.parts.len() == context.expected
                };
                if complete {
                    if let Some(context) = split.take() {
                        transactions.push(context.finalize());
                    }
                }
            }
            None => {
                // A plain row while a split is still open: the file is
                // missing rows (truncated preview, clipped export). Emit the
                // parts we have rather than dropping them.
                if let Some(context) = split.take() {
                    transactions.push(context.finalize());
                }
                transactions.push(row.into_standalone());
            }
        }
    }

    // Input ended mid-split; flush what we have.
    if let Some(context) = split.take() {
        transactions.push(context.finalize());
    }

    Ok(transactions)
}

/// Positions of the required columns within this file's header.
struct ColumnIndexes {
    account: usize,
    flag: usize,
    date: usize,
    payee: usize,
    category_group: usize,
    category: usize,
    memo: usize,
    outflow: usize,
    inflow: usize,
    cleared: usize,
}

impl ColumnIndexes {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, ImportError> {
        let find = |name: &'static str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or(ImportError::MissingColumn(name))
        };
        Ok(ColumnIndexes {
            account: find("Account")?,
            flag: find("Flag")?,
            date: find("Date")?,
            payee: find("Payee")?,
            category_group: find("Category Group")?,
            category: find("Category")?,
            memo: find("Memo")?,
            outflow: find("Outflow")?,
            inflow: find("Inflow")?,
            cleared: find("Cleared")?,
        })
    }

    fn extract(&self, record: &csv::StringRecord, row_number: usize) -> Result<Row, ImportError> {
        let field = |index: usize| record.get(index).unwrap_or("").to_string();

        let parse_amount = |index: usize, column: &str| {
            let text = field(index);
            Money::parse(&text).map_err(|_| ImportError::InvalidAmount {
                row: row_number,
                column: column.to_string(),
                value: text,
            })
        };
        let outflow = parse_amount(self.outflow, "Outflow")?;
        let inflow = parse_amount(self.inflow, "Inflow")?;

        let cleared_text = field(self.cleared);
        let cleared = Cleared::from_str(&cleared_text).map_err(ImportError::InvalidCleared)?;

        Ok(Row {
            account: field(self.account),
            flag: field(self.flag),
            date: field(self.date),
            payee: field(self.payee),
            category_group: field(self.category_group),
            category: field(self.category),
            memo: field(self.memo),
            outflow: outflow - inflow,
            cleared,
        })
    }
}

/// One data record with its fields normalized: `outflow` is already
/// Outflow − Inflow, `cleared` is validated.
struct Row {
    account: String,
    flag: String,
    date: String,
    payee: String,
    category_group: String,
    category: String,
    memo: String,
    outflow: Money,
    cleared: Cleared,
}

impl Row {
    fn into_standalone(self) -> LedgerTransaction {
        LedgerTransaction {
            account: self.account,
            flag: self.flag,
            date: self.date,
            payee: self.payee,
            category_group: self.category_group,
            category: self.category,
            memo: self.memo,
            outflow: self.outflow,
            cleared: self.cleared,
            subtransactions: Vec::new(),
        }
    }
}

/// An open split transaction being accumulated across consecutive rows.
/// The scalar fields come from the first-arrived part; the export repeats
/// them on every part.
struct SplitContext {
    expected: usize,
    account: String,
    flag: String,
    date: String,
    cleared: Cleared,
    /// `(part index, part)` in arrival order. Arrival order is not
    /// guaranteed to be index order.
    parts: Vec<(usize, LedgerSubtransaction)>,
}

impl SplitContext {
    fn finalize(self) -> LedgerTransaction {
        let outflow = self
            .parts
            .iter()
            .map(|(_, part)| part.outflow)
            .fold(Money::zero(), |a, b| a + b);

        let mut parts = self.parts;
        parts.sort_by_key(|(index, _)| *index);
        let subtransactions = parts.into_iter().map(|(_, part)| part).collect();

        LedgerTransaction {
            account: self.account,
            flag: self.flag,
            date: self.date,
            cleared: self.cleared,
            outflow,
            subtransactions,
            // The flattened export has no row for the parent itself, so
            // these are unknowable. Category fields don't apply to a parent
            // at all.
            payee: String::new(),
            memo: String::new(),
            category: String::new(),
            category_group: String::new(),
        }
    }
}

struct SplitMemo {
    /// 1-based part number within the split.
    index: usize,
    total: usize,
    memo: String,
}

/// `"Split (1/2) groceries"` → part 1 of 2, memo `"groceries"`. The memo
/// tail may span multiple lines.
fn parse_split_memo(memo: &str) -> Option<SplitMemo> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^Split \(([0-9]+)/([0-9]+)\) ?(.*)$").expect("split memo pattern compiles")
    });

    let captures = pattern.captures(memo)?;
    Some(SplitMemo {
        index: captures[1].parse().ok()?,
        total: captures[2].parse().ok()?,
        memo: captures[3].to_string(),
    })
}
