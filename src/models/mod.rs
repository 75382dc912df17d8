//! Core data models for Tally
//!
//! This module contains the data structures of the reconciliation domain:
//! accounts, transactions, bank statements and reconciliation sessions.

pub mod account;
pub mod ids;
pub mod money;
pub mod session;
pub mod statement;
pub mod transaction;

pub use account::Account;
pub use ids::{AccountId, SessionId, StatementId, TransactionId};
pub use money::Money;
pub use session::{ReconciliationSession, SessionStateError, SessionStatus};
pub use statement::Statement;
pub use transaction::{Transaction, TransactionKind};
