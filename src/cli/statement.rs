//! Statement CLI commands

use std::fs::File;
use std::path::PathBuf;

use clap::Subcommand;

use crate::config::Settings;
use crate::display::reconcile::{format_statement_details, format_statement_list};
use crate::error::{TallyError, TallyResult};
use crate::services::{AccountService, StatementService};
use crate::storage::Storage;

use super::{parse_date, parse_money};

/// Statement subcommands
#[derive(Subcommand)]
pub enum StatementCommands {
    /// Enter a bank statement by hand
    Add {
        /// Account name or ID
        account: String,
        /// First day of the statement period
        #[arg(long)]
        start: String,
        /// Last day of the statement period
        #[arg(long)]
        end: String,
        /// Balance at the start of the period
        #[arg(long, allow_hyphen_values = true)]
        opening: String,
        /// Balance at the end of the period
        #[arg(long, allow_hyphen_values = true)]
        closing: String,
    },
    /// Import statements from a CSV file
    ///
    /// Header: period_start,period_end,starting_balance,ending_balance
    Import {
        /// Account name or ID
        account: String,
        /// Path to the CSV file
        file: PathBuf,
    },
    /// List an account's statements
    List {
        /// Account name or ID
        account: String,
    },
    /// Show one statement
    Show {
        /// Statement ID
        id: String,
    },
}

/// Handle a statement command
pub fn handle_statement_command(
    storage: &Storage,
    settings: &Settings,
    cmd: StatementCommands,
) -> TallyResult<()> {
    let service = StatementService::new(storage);
    let account_service = AccountService::new(storage);
    let symbol = settings.currency_symbol.as_str();

    match cmd {
        StatementCommands::Add {
            account,
            start,
            end,
            opening,
            closing,
        } => {
            let account = account_service.require(&account)?;
            let statement = service.create_statement(
                account.id,
                parse_date(&start, &settings.date_format)?,
                parse_date(&end, &settings.date_format)?,
                parse_money(&opening)?,
                parse_money(&closing)?,
            )?;

            println!("Added statement for {}: {}", account.name, statement);
            println!("  ID: {}", statement.id);
        }

        StatementCommands::Import { account, file } => {
            let account = account_service.require(&account)?;
            let reader = File::open(&file).map_err(|e| {
                TallyError::Io(format!("Failed to open {}: {}", file.display(), e))
            })?;

            let imported = service.import_csv(account.id, reader)?;
            println!(
                "Imported {} statement(s) for {}",
                imported.len(),
                account.name
            );
            print!("{}", format_statement_list(&imported, symbol));
        }

        StatementCommands::List { account } => {
            let account = account_service.require(&account)?;
            let statements = service.list_statements(account.id)?;
            print!("{}", format_statement_list(&statements, symbol));
        }

        StatementCommands::Show { id } => {
            let statement = service.find(&id)?;
            print!("{}", format_statement_details(&statement, symbol));
        }
    }

    Ok(())
}
