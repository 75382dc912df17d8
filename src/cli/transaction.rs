//! Transaction CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::transaction::format_transaction_register;
use crate::error::{TallyError, TallyResult};
use crate::models::TransactionKind;
use crate::services::{AccountService, CreateTransactionInput, TransactionFilter, TransactionService};
use crate::storage::Storage;

use super::{parse_date_or_today, parse_money};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Record a transaction
    Add {
        /// Account name or ID
        account: String,
        /// Amount (e.g., "-50.00" for outflow, "100.00" for inflow)
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Payee name
        #[arg(short, long)]
        payee: Option<String>,
        /// Transaction date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
        /// Memo
        #[arg(short, long)]
        memo: Option<String>,
        /// Kind (income, expense, transfer); inferred from the sign if omitted
        #[arg(short, long)]
        kind: Option<String>,
    },
    /// List transactions, newest first
    List {
        /// Filter by account name or ID
        #[arg(short, long)]
        account: Option<String>,
        /// Only transactions not yet reconciled
        #[arg(short, long)]
        unreconciled: bool,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

/// Handle a transaction command
pub fn handle_transaction_command(
    storage: &Storage,
    settings: &Settings,
    cmd: TransactionCommands,
) -> TallyResult<()> {
    let service = TransactionService::new(storage);
    let account_service = AccountService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        TransactionCommands::Add {
            account,
            amount,
            payee,
            date,
            memo,
            kind,
        } => {
            let account = account_service.require(&account)?;
            let kind = kind
                .map(|k| {
                    TransactionKind::parse(&k).ok_or_else(|| {
                        TallyError::Validation(format!(
                            "Invalid kind '{}'. Valid kinds: income, expense, transfer",
                            k
                        ))
                    })
                })
                .transpose()?;

            let txn = service.create(CreateTransactionInput {
                account_id: account.id,
                date: parse_date_or_today(date.as_deref(), &settings.date_format)?,
                amount: parse_money(&amount)?,
                kind,
                payee_name: payee,
                memo,
            })?;

            println!(
                "Recorded {} {} on {} in {}",
                txn.kind,
                txn.amount.format_with_symbol(symbol),
                txn.date.format(&settings.date_format),
                account.name
            );
            println!("  ID: {}", txn.id);
        }

        TransactionCommands::List {
            account,
            unreconciled,
            limit,
        } => {
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(account) = account {
                filter = filter.account(account_service.require(&account)?.id);
            }
            if unreconciled {
                filter = filter.unreconciled();
            }

            let transactions = service.list(filter)?;
            print!("{}", format_transaction_register(&transactions, symbol));
        }
    }

    Ok(())
}
