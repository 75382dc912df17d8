//! Service layer for Tally
//!
//! Business logic on top of the storage layer: validation, derived
//! balances, auditing and the reconciliation workflow.

pub mod account;
pub mod reconciliation;
pub mod statement;
pub mod transaction;

pub use account::{AccountService, AccountSummary};
pub use reconciliation::{ReconcileCommand, ReconcileEvent, ReconciliationService};
pub use statement::StatementService;
pub use transaction::{CreateTransactionInput, TransactionFilter, TransactionService};
