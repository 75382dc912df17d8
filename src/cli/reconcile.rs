//! Reconciliation CLI commands
//!
//! Every subcommand names the account; the session it acts on is the one
//! currently open for that account.

use clap::Subcommand;

use crate::config::Settings;
use crate::display::reconcile::format_session_status;
use crate::error::{TallyError, TallyResult};
use crate::models::{Account, Money, ReconciliationSession};
use crate::services::{
    AccountService, ReconcileEvent, ReconciliationService, StatementService, TransactionService,
};
use crate::storage::Storage;

use super::{parse_date_or_today, parse_money};

/// Reconciliation subcommands
#[derive(Subcommand)]
pub enum ReconcileCommands {
    /// Start reconciling an account against a statement
    Start {
        /// Account name or ID
        account: String,
        /// Statement ID, defaults to the account's latest statement
        #[arg(short, long)]
        statement: Option<String>,
    },
    /// Show the open session and the transactions it can clear
    Status {
        /// Account name or ID
        account: String,
    },
    /// Mark or unmark transactions as cleared
    Toggle {
        /// Account name or ID
        account: String,
        /// Transaction IDs
        #[arg(required = true)]
        transactions: Vec<String>,
    },
    /// Enter the ending balance shown on the statement
    SetBalance {
        /// Account name or ID
        account: String,
        /// Ending balance
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Finish the open session
    Complete {
        /// Account name or ID
        account: String,
    },
    /// Post an adjustment for the remaining difference and finish
    Adjust {
        /// Account name or ID
        account: String,
        /// Adjustment date, defaults to today
        #[arg(short, long)]
        date: Option<String>,
    },
    /// Discard the open session
    Abandon {
        /// Account name or ID
        account: String,
    },
}

/// Handle a reconcile command
pub fn handle_reconcile_command(
    storage: &Storage,
    settings: &Settings,
    cmd: ReconcileCommands,
) -> TallyResult<()> {
    let service = ReconciliationService::new(storage);
    let account_service = AccountService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        ReconcileCommands::Start { account, statement } => {
            let account = account_service.require(&account)?;
            let statements = StatementService::new(storage);
            let statement = match statement {
                Some(reference) => statements.find(&reference)?,
                None => statements.latest(account.id)?.ok_or_else(|| {
                    TallyError::statement_not_found(format!("any for account '{}'", account.name))
                })?,
            };

            let session = service.start_session(account.id, statement.id)?;
            println!("Started reconciliation of {} against {}", account.name, statement);
            print_status(&service, &session, symbol)?;
        }

        ReconcileCommands::Status { account } => {
            let account = account_service.require(&account)?;
            let session = open_session(&service, &account)?;
            print_status(&service, &session, symbol)?;
        }

        ReconcileCommands::Toggle {
            account,
            transactions,
        } => {
            let account = account_service.require(&account)?;
            let mut session = open_session(&service, &account)?;
            let txn_service = TransactionService::new(storage);

            for reference in &transactions {
                let txn = txn_service
                    .find(reference)?
                    .ok_or_else(|| TallyError::transaction_not_found(reference.as_str()))?;
                session = service.toggle_cleared(session.id, txn.id)?;
                let state = if session.is_cleared(txn.id) {
                    "Cleared"
                } else {
                    "Uncleared"
                };
                println!("{} {} ({})", state, txn.id, txn.amount.format_with_symbol(symbol));
            }

            let resolution = session.live_resolution();
            println!(
                "Difference: {}",
                resolution.difference.format_with_symbol(symbol)
            );
        }

        ReconcileCommands::SetBalance { account, amount } => {
            let account = account_service.require(&account)?;
            let session = open_session(&service, &account)?;
            let session = service.set_actual_ending_balance(session.id, parse_money(&amount)?)?;

            let resolution = session.live_resolution();
            println!(
                "Actual ending balance set. Difference: {}",
                resolution.difference.format_with_symbol(symbol)
            );
        }

        ReconcileCommands::Complete { account } => {
            let account = account_service.require(&account)?;
            let session = open_session(&service, &account)?;
            let session = service.complete(session.id)?;
            print_completion(&account, &session, session.cleared.len(), symbol);
        }

        ReconcileCommands::Adjust { account, date } => {
            let account = account_service.require(&account)?;
            let session = open_session(&service, &account)?;
            let date = parse_date_or_today(date.as_deref(), &settings.date_format)?;

            if let ReconcileEvent::Completed {
                session,
                reconciled,
                adjustment,
                ..
            } = service.complete_with_adjustment(session.id, date)?
            {
                if let Some(adj) = adjustment {
                    println!(
                        "Posted adjustment {} ({})",
                        adj.id,
                        adj.amount.format_with_symbol(symbol)
                    );
                }
                print_completion(&account, &session, reconciled.len(), symbol);
            }
        }

        ReconcileCommands::Abandon { account } => {
            let account = account_service.require(&account)?;
            let session = open_session(&service, &account)?;
            let session = service.abandon(session.id)?;
            println!("Abandoned reconciliation {} of {}", session.id, account.name);
        }
    }

    Ok(())
}

fn open_session(
    service: &ReconciliationService<'_>,
    account: &Account,
) -> TallyResult<ReconciliationSession> {
    service.current_session(account.id)?.ok_or_else(|| {
        TallyError::session_not_found(format!("in progress for '{}'", account.name))
    })
}

fn print_status(
    service: &ReconciliationService<'_>,
    session: &ReconciliationSession,
    symbol: &str,
) -> TallyResult<()> {
    let candidates = service.candidates(session)?;
    print!("{}", format_session_status(session, &candidates, symbol));
    Ok(())
}

fn print_completion(
    account: &Account,
    session: &ReconciliationSession,
    reconciled: usize,
    symbol: &str,
) {
    let difference = session.difference.unwrap_or(Money::zero());
    println!("Completed reconciliation of {}", account.name);
    println!("  Transactions reconciled: {}", reconciled);
    if difference.is_zero() {
        println!("  Balanced");
    } else {
        println!(
            "  Difference: {} (not balanced)",
            difference.format_with_symbol(symbol)
        );
    }
}
