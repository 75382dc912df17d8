//! Account CLI commands

use chrono::Utc;
use clap::Subcommand;

use crate::config::Settings;
use crate::display::account::{format_account_details, format_account_list};
use crate::error::TallyResult;
use crate::services::{AccountService, ReconciliationService};
use crate::storage::Storage;

use super::parse_money;

/// Account subcommands
#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Account name
        name: String,
        /// Opening balance (e.g., "1000.00" or "1000")
        #[arg(short, long, default_value = "0", allow_hyphen_values = true)]
        balance: String,
        /// ISO currency code, defaults to the configured currency
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// List accounts with balances
    List {
        /// Include archived accounts
        #[arg(short, long)]
        all: bool,
    },
    /// Show account details and reconciliation status
    Show {
        /// Account name or ID
        account: String,
    },
    /// Archive an account
    Archive {
        /// Account name or ID
        account: String,
    },
}

/// Handle an account command
pub fn handle_account_command(
    storage: &Storage,
    settings: &Settings,
    cmd: AccountCommands,
) -> TallyResult<()> {
    let service = AccountService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        AccountCommands::Create {
            name,
            balance,
            currency,
        } => {
            let opening_balance = parse_money(&balance)?;
            let currency = currency.unwrap_or_else(|| settings.default_currency.clone());
            let account = service.create(&name, &currency, opening_balance)?;

            println!("Created account: {}", account.name);
            println!("  Currency: {}", account.currency);
            println!(
                "  Opening Balance: {}",
                account.opening_balance.format_with_symbol(symbol)
            );
            println!("  ID: {}", account.id);
        }

        AccountCommands::List { all } => {
            let summaries = service.list_with_balances(all)?;
            print!("{}", format_account_list(&summaries, symbol));
        }

        AccountCommands::Show { account } => {
            let found = service.require(&account)?;
            let summary = service.get_summary(&found)?;
            let reconciliation = ReconciliationService::new(storage).summary(&found, Utc::now())?;
            print!(
                "{}",
                format_account_details(&summary, &reconciliation, symbol)
            );
        }

        AccountCommands::Archive { account } => {
            let found = service.require(&account)?;
            let archived = service.archive(found.id)?;
            println!("Archived account: {}", archived.name);
        }
    }

    Ok(())
}
