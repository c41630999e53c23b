use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;

use tally_core::{BankColumnType, Cleared};
use tally_import::{compute_outflow, parse_bank_csv, parse_ledger_csv, ColumnProfile, ImportError};
use tally_recon::{
    ledger_account_names, select_account, BankImport, Compared, LedgerImport, Mismatch, ReconState,
};

/// Reconcile a budgeting-ledger CSV export against a bank CSV export.
#[derive(Parser)]
#[command(name = "tally", version)]
struct Cli {
    /// Ledger CSV export
    ledger: PathBuf,

    /// Bank or credit-card CSV export
    bank: PathBuf,

    /// TOML profile assigning inflow/outflow meaning to bank columns
    #[arg(long)]
    profile: PathBuf,

    /// Only read the first N data rows of each file
    #[arg(long)]
    limit: Option<usize>,

    /// Leave reconciled ledger transactions out of the comparison
    #[arg(long)]
    exclude_reconciled: bool,

    /// Emit the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Report {
    ledger_transactions: usize,
    bank_transactions: usize,
    mismatches: Vec<Mismatch>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // A recognizable import problem gets its plain message; anything
            // else is unexpected and keeps the full error chain.
            match err.downcast_ref::<ImportError>() {
                Some(import_err) => eprintln!("import failed: {import_err}"),
                None => eprintln!("error: {err:?}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ledger_text = fs::read_to_string(&cli.ledger)
        .with_context(|| format!("reading {}", cli.ledger.display()))?;
    let bank_text =
        fs::read_to_string(&cli.bank).with_context(|| format!("reading {}", cli.bank.display()))?;
    let profile_text = fs::read_to_string(&cli.profile)
        .with_context(|| format!("reading {}", cli.profile.display()))?;
    let profile = ColumnProfile::from_toml(&profile_text)?;

    let ledger_transactions = parse_ledger_csv(&ledger_text, cli.limit)?;
    tracing::info!(
        "Imported {} ledger transactions from {}",
        ledger_transactions.len(),
        cli.ledger.display()
    );

    let accounts = ledger_account_names(&ledger_transactions);
    if accounts.len() > 1 {
        tracing::warn!(
            "Ledger export spans {} accounts; comparing all of them",
            accounts.len()
        );
    }
    let account = select_account(&accounts, None);

    let raw = parse_bank_csv(&bank_text, cli.limit)?;
    let column_types = profile.resolve(&raw.column_names);
    if !column_types.iter().any(|t| *t != BankColumnType::Other) {
        tracing::warn!("No bank column is tagged inflow or outflow; every bank outflow will be $0.00");
    }

    let mut bank_transactions = Vec::with_capacity(raw.rows.len());
    for (index, row) in raw.rows.iter().enumerate() {
        // Header row is row 1.
        bank_transactions.push(compute_outflow(&column_types, row, index + 2)?);
    }
    tracing::info!(
        "Imported {} bank transactions from {}",
        bank_transactions.len(),
        cli.bank.display()
    );

    let mut state = ReconState::new();
    state.complete_ledger_import(LedgerImport {
        filename: cli.ledger.display().to_string(),
        account,
        transactions: ledger_transactions
            .into_iter()
            .map(|tx| Compared {
                excluded: cli.exclude_reconciled && tx.cleared == Cleared::Reconciled,
                transaction: tx,
            })
            .collect(),
    });
    state.complete_bank_import(BankImport {
        filename: cli.bank.display().to_string(),
        column_names: raw.column_names,
        column_types,
        transactions: bank_transactions
            .into_iter()
            .map(Compared::included)
            .collect(),
    });

    if cli.exclude_reconciled {
        let excluded = state
            .ledger()
            .map(|i| i.transactions.iter().filter(|e| e.excluded).count())
            .unwrap_or(0);
        tracing::info!("Excluded {excluded} reconciled ledger transactions from comparison");
    }

    report(&state, cli.json)
}

fn report(state: &ReconState, json: bool) -> anyhow::Result<()> {
    let mismatches = state.mismatches();

    if json {
        let report = Report {
            ledger_transactions: state.ledger().map(|i| i.transactions.len()).unwrap_or(0),
            bank_transactions: state.bank().map(|i| i.transactions.len()).unwrap_or(0),
            mismatches,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if mismatches.is_empty() {
        println!("All amounts reconcile.");
        return Ok(());
    }

    println!("{} mismatched amount(s):", mismatches.len());
    for m in &mismatches {
        println!(
            "  {:>12}  ledger ×{}  bank ×{}",
            m.amount.to_string(),
            m.ledger_count,
            m.bank_count
        );
    }
    Ok(())
}
