//! CLI command handlers
//!
//! Bridges clap argument parsing with the service layer. Handlers print
//! plain text to stdout and return errors to `main`.

pub mod account;
pub mod history;
pub mod reconcile;
pub mod statement;
pub mod transaction;

pub use account::{handle_account_command, AccountCommands};
pub use history::{handle_history_command, handle_summary_command};
pub use reconcile::{handle_reconcile_command, ReconcileCommands};
pub use statement::{handle_statement_command, StatementCommands};
pub use transaction::{handle_transaction_command, TransactionCommands};

use chrono::NaiveDate;

use crate::error::{TallyError, TallyResult};
use crate::models::Money;

/// Parse a user-typed amount such as `-20.00` or `$465`
pub(crate) fn parse_money(raw: &str) -> TallyResult<Money> {
    Money::parse(raw).map_err(|e| {
        TallyError::Validation(format!(
            "Invalid amount '{}'. Use a format like '1234.56'. Error: {}",
            raw, e
        ))
    })
}

/// Parse a date in the configured format
pub(crate) fn parse_date(raw: &str, format: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).map_err(|_| {
        TallyError::Validation(format!(
            "Invalid date '{}'. Expected format {}",
            raw, format
        ))
    })
}

/// Parse a date, defaulting to today
pub(crate) fn parse_date_or_today(raw: Option<&str>, format: &str) -> TallyResult<NaiveDate> {
    match raw {
        Some(raw) => parse_date(raw, format),
        None => Ok(chrono::Local::now().date_naive()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("-20.00").unwrap().cents(), -2000);
        assert!(parse_money("twenty").unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2025-01-31", "%Y-%m-%d").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());
        assert_eq!(
            parse_date("31/01/2025", "%d/%m/%Y").unwrap(),
            date
        );
        assert!(parse_date("2025-02-30", "%Y-%m-%d").is_err());
        assert!(parse_date_or_today(None, "%Y-%m-%d").is_ok());
    }
}
