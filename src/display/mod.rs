//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for accounts, transactions,
//! statements and reconciliation sessions.

pub mod account;
pub mod reconcile;
pub mod transaction;

pub use account::{format_account_details, format_account_list};
pub use reconcile::{
    format_history, format_session_status, format_statement_details, format_statement_list,
    format_summary_table,
};
pub use transaction::{format_transaction_register, format_transaction_row};
