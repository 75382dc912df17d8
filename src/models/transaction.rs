//! Transaction model
//!
//! Represents a posted transaction. Two flags track reconciliation: `cleared`
//! is toggled by the user while a session is open, `reconciled` is set only
//! when a session completes and is then owned by that session.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, SessionId, TransactionId};
use super::money::Money;

/// Kind of transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming in
    Income,
    /// Money going out
    #[default]
    Expense,
    /// Movement between accounts, either sign
    Transfer,
}

impl TransactionKind {
    /// Infer the kind from the sign of a non-transfer amount
    pub fn from_amount(amount: Money) -> Self {
        if amount.is_negative() {
            Self::Expense
        } else {
            Self::Income
        }
    }

    /// Parse transaction kind from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            "transfer" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// A financial transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier
    pub id: TransactionId,

    /// The account this transaction belongs to
    pub account_id: AccountId,

    /// Transaction date
    pub date: NaiveDate,

    /// Amount (positive for inflow, negative for outflow)
    pub amount: Money,

    #[serde(default)]
    pub kind: TransactionKind,

    /// Payee name for display
    #[serde(default)]
    pub payee_name: String,

    /// Memo/notes
    #[serde(default)]
    pub memo: String,

    /// Marked as matching a statement line
    #[serde(default)]
    pub cleared: bool,

    /// Permanently confirmed by a completed reconciliation
    #[serde(default)]
    pub reconciled: bool,

    /// The completed session that reconciled this transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciled_by: Option<SessionId>,

    /// When the transaction was created
    pub created_at: DateTime<Utc>,

    /// When the transaction was last modified
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new transaction, inferring income/expense from the sign
    pub fn new(account_id: AccountId, date: NaiveDate, amount: Money) -> Self {
        let now = Utc::now();
        Self {
            id: TransactionId::new(),
            account_id,
            date,
            amount,
            kind: TransactionKind::from_amount(amount),
            payee_name: String::new(),
            memo: String::new(),
            cleared: false,
            reconciled: false,
            reconciled_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a transaction with all common fields
    pub fn with_details(
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        kind: TransactionKind,
        payee_name: impl Into<String>,
        memo: impl Into<String>,
    ) -> Self {
        let mut txn = Self::new(account_id, date, amount);
        txn.kind = kind;
        txn.payee_name = payee_name.into();
        txn.memo = memo.into();
        txn
    }

    /// Set or unset the cleared flag
    pub fn set_cleared(&mut self, cleared: bool) {
        self.cleared = cleared;
        self.updated_at = Utc::now();
    }

    /// Mark as reconciled by the given completed session
    pub fn reconcile(&mut self, session_id: SessionId) {
        self.cleared = true;
        self.reconciled = true;
        self.reconciled_by = Some(session_id);
        self.updated_at = Utc::now();
    }

    /// Undo `reconcile` for a session that never finished
    ///
    /// The transaction stays cleared.
    pub fn release(&mut self) {
        self.reconciled = false;
        self.reconciled_by = None;
        self.updated_at = Utc::now();
    }

    /// Validate the transaction
    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        match self.kind {
            TransactionKind::Income if self.amount.is_negative() => {
                return Err(TransactionValidationError::SignMismatch {
                    kind: self.kind,
                    amount: self.amount,
                });
            }
            TransactionKind::Expense if self.amount.is_positive() => {
                return Err(TransactionValidationError::SignMismatch {
                    kind: self.kind,
                    amount: self.amount,
                });
            }
            _ => {}
        }

        if self.reconciled != self.reconciled_by.is_some() {
            return Err(TransactionValidationError::OrphanedReconciliation);
        }

        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.date, self.payee_name, self.amount)
    }
}

/// Validation errors for transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    SignMismatch { kind: TransactionKind, amount: Money },
    OrphanedReconciliation,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignMismatch { kind, amount } => {
                write!(f, "{} transaction cannot have amount {}", kind, amount)
            }
            Self::OrphanedReconciliation => {
                write!(f, "Reconciled flag does not match its owning session")
            }
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_new_transaction() {
        let account_id = AccountId::new();
        let txn = Transaction::new(account_id, test_date(), Money::from_cents(-2000));

        assert_eq!(txn.account_id, account_id);
        assert_eq!(txn.kind, TransactionKind::Expense);
        assert!(!txn.cleared);
        assert!(!txn.reconciled);
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_kind_inferred_from_sign() {
        let txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(1500));
        assert_eq!(txn.kind, TransactionKind::Income);
    }

    #[test]
    fn test_reconcile_sets_owner() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-2000));
        let session_id = SessionId::new();

        txn.reconcile(session_id);

        assert!(txn.cleared);
        assert!(txn.reconciled);
        assert_eq!(txn.reconciled_by, Some(session_id));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_release_keeps_cleared() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-2000));
        txn.reconcile(SessionId::new());

        txn.release();

        assert!(txn.cleared);
        assert!(!txn.reconciled);
        assert_eq!(txn.reconciled_by, None);
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_sign_mismatch() {
        let txn = Transaction::with_details(
            AccountId::new(),
            test_date(),
            Money::from_cents(-100),
            TransactionKind::Income,
            "Employer",
            "",
        );
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::SignMismatch { .. })
        ));

        let transfer = Transaction::with_details(
            AccountId::new(),
            test_date(),
            Money::from_cents(-100),
            TransactionKind::Transfer,
            "Savings",
            "",
        );
        assert!(transfer.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_orphaned_reconciliation() {
        let mut txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-100));
        txn.reconciled = true;
        assert_eq!(
            txn.validate(),
            Err(TransactionValidationError::OrphanedReconciliation)
        );
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(TransactionKind::parse("INCOME"), Some(TransactionKind::Income));
        assert_eq!(TransactionKind::parse("transfer"), Some(TransactionKind::Transfer));
        assert_eq!(TransactionKind::parse("refund"), None);
    }

    #[test]
    fn test_serialization() {
        let txn = Transaction::new(AccountId::new(), test_date(), Money::from_cents(-2000));
        let json = serde_json::to_string(&txn).unwrap();
        assert!(json.contains("\"kind\":\"expense\""));
        assert!(!json.contains("reconciled_by"));

        let deserialized: Transaction = serde_json::from_str(&json).unwrap();
        assert_eq!(txn.id, deserialized.id);
        assert_eq!(deserialized.amount.cents(), -2000);
    }
}
