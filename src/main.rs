use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use tally::cli::{
    handle_account_command, handle_history_command, handle_reconcile_command,
    handle_statement_command, handle_summary_command, handle_transaction_command,
    AccountCommands, ReconcileCommands, StatementCommands, TransactionCommands,
};
use tally::config::{Settings, TallyPaths};
use tally::storage::Storage;

#[derive(Parser)]
#[command(
    name = "tally",
    version,
    about = "Terminal ledger with bank-statement reconciliation",
    long_about = "Tally keeps a ledger of accounts and transactions and reconciles \
                  them against bank statements: mark what cleared, compare with \
                  the statement balance, and lock the result into history."
)]
struct Cli {
    /// Logging verbosity. Overridden by RUST_LOG when it is set.
    #[arg(long, global = true, default_value_t = LevelFilter::WARN)]
    log_level: LevelFilter,

    /// Directory holding settings and data
    #[arg(long, global = true, env = "TALLY_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Bank statement commands
    #[command(subcommand)]
    Statement(StatementCommands),

    /// Reconcile an account against a statement
    #[command(subcommand, alias = "rec")]
    Reconcile(ReconcileCommands),

    /// Show finished reconciliations, most recent first
    History {
        /// Only this account (name or ID)
        #[arg(short, long)]
        account: Option<String>,
    },

    /// Show how recently each account was reconciled
    Summary,

    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logger(cli.log_level);
    debug!("Log level set to {}", cli.log_level.to_string().to_lowercase());

    match main_inner(cli) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn main_inner(cli: Cli) -> Result<()> {
    let paths = match cli.data_dir {
        Some(dir) => TallyPaths::with_base_dir(dir),
        None => TallyPaths::new()?,
    };
    trace!("Using base directory {}", paths.base_dir().display());

    let settings = Settings::load_or_create(&paths)?;
    let storage = Storage::new(paths.clone())?;
    storage.load_all()?;

    match cli.command {
        Some(Commands::Account(cmd)) => handle_account_command(&storage, &settings, cmd)?,
        Some(Commands::Transaction(cmd)) => {
            handle_transaction_command(&storage, &settings, cmd)?
        }
        Some(Commands::Statement(cmd)) => handle_statement_command(&storage, &settings, cmd)?,
        Some(Commands::Reconcile(cmd)) => handle_reconcile_command(&storage, &settings, cmd)?,
        Some(Commands::History { account }) => {
            handle_history_command(&storage, &settings, account)?
        }
        Some(Commands::Summary) => handle_summary_command(&storage)?,
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Initialized Tally at: {}", paths.base_dir().display());
            println!();
            println!("Next steps:");
            println!("  tally account create \"Checking\" --balance 500.00");
            println!("  tally statement add Checking --start 2025-01-01 --end 2025-01-31 \\");
            println!("      --opening 500.00 --closing 465.00");
            println!("  tally reconcile start Checking");
        }
        Some(Commands::Config) => {
            println!("Tally Configuration");
            println!("===================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Initialized:    {}", if paths.is_initialized() { "yes" } else { "no" });
            println!("Data directory: {}", paths.data_dir().display());
            println!("Audit log:      {}", storage.audit().path().display());
            println!("Audit entries:  {}", storage.audit().entry_count()?);
            println!();
            println!("Settings:");
            println!("  Currency symbol:  {}", settings.currency_symbol);
            println!("  Default currency: {}", settings.default_currency);
            println!("  Date format:      {}", settings.date_format);
        }
        None => {
            println!("Tally - account reconciliation from the terminal");
            println!();
            println!("Run 'tally --help' for usage information.");
        }
    }

    Ok(())
}

/// Install the stderr subscriber; RUST_LOG wins over `--log-level`
fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => EnvFilter::from_default_env(),
        None => EnvFilter::new(format!(
            "{}={},{}={}",
            env!("CARGO_CRATE_NAME"),
            level,
            env!("CARGO_BIN_NAME"),
            level
        )),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
