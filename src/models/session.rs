//! Reconciliation session model
//!
//! One attempt to reconcile an account against a statement. The session owns
//! the pure state machine: which transactions are cleared, the running
//! computed balance, and the forward-only status transitions. Storage side
//! effects (flagging transactions, history) live in the reconciliation
//! service.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{AccountId, SessionId, StatementId, TransactionId};
use super::money::Money;
use super::statement::Statement;
use crate::reconcile::resolver::{resolve, Resolution};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl SessionStatus {
    /// Completed and abandoned sessions never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "In Progress"),
            Self::Completed => write!(f, "Completed"),
            Self::Abandoned => write!(f, "Abandoned"),
        }
    }
}

/// A reconciliation session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReconciliationSession {
    pub id: SessionId,

    pub account_id: AccountId,

    pub statement_id: StatementId,

    pub status: SessionStatus,

    /// Account balance snapshot taken when the session started
    pub starting_balance: Money,

    /// Target balance copied from the statement
    pub ending_balance: Money,

    /// Balance the user confirmed from the statement, if entered yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_ending_balance: Option<Money>,

    /// Transactions marked as cleared in this session
    #[serde(default)]
    pub cleared: BTreeSet<TransactionId>,

    /// Starting balance plus every cleared amount
    pub computed_balance: Money,

    /// Actual minus computed, set on completion only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difference: Option<Money>,

    pub started_at: DateTime<Utc>,

    /// When the session was completed or abandoned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl ReconciliationSession {
    /// Open a new session against a statement
    pub fn start(statement: &Statement, starting_balance: Money, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::new(),
            account_id: statement.account_id,
            statement_id: statement.id,
            status: SessionStatus::InProgress,
            starting_balance,
            ending_balance: statement.ending_balance,
            actual_ending_balance: None,
            cleared: BTreeSet::new(),
            computed_balance: starting_balance,
            difference: None,
            started_at: now,
            completed_at: None,
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    pub fn is_cleared(&self, transaction_id: TransactionId) -> bool {
        self.cleared.contains(&transaction_id)
    }

    /// Timestamp the history orders by
    pub fn sort_key(&self) -> DateTime<Utc> {
        self.completed_at.unwrap_or(self.started_at)
    }

    /// Live comparison of the running balance against the statement target
    ///
    /// Uses the confirmed actual balance when present, otherwise the
    /// statement's ending balance.
    pub fn live_resolution(&self) -> Resolution {
        let actual = self.actual_ending_balance.unwrap_or(self.ending_balance);
        resolve(self.computed_balance, actual)
    }

    /// Add or remove a transaction from the cleared set
    ///
    /// Returns whether the transaction is cleared after the toggle.
    pub fn toggle(
        &mut self,
        transaction_id: TransactionId,
        amount: Money,
    ) -> Result<bool, SessionStateError> {
        self.ensure_in_progress()?;

        if self.cleared.remove(&transaction_id) {
            self.computed_balance -= amount;
            Ok(false)
        } else {
            self.cleared.insert(transaction_id);
            self.computed_balance += amount;
            Ok(true)
        }
    }

    pub fn set_actual_ending_balance(&mut self, amount: Money) -> Result<(), SessionStateError> {
        self.ensure_in_progress()?;
        self.actual_ending_balance = Some(amount);
        Ok(())
    }

    /// Finalize as completed
    ///
    /// Leaves the session untouched on error.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<Resolution, SessionStateError> {
        self.ensure_in_progress()?;
        let actual = self
            .actual_ending_balance
            .ok_or(SessionStateError::ActualBalanceUnset)?;

        let resolution = resolve(self.computed_balance, actual);
        self.difference = Some(resolution.difference);
        self.status = SessionStatus::Completed;
        self.completed_at = Some(now);
        Ok(resolution)
    }

    /// Finalize as abandoned
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        self.ensure_in_progress()?;
        self.status = SessionStatus::Abandoned;
        self.completed_at = Some(now);
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<(), SessionStateError> {
        if self.is_in_progress() {
            Ok(())
        } else {
            Err(SessionStateError::NotInProgress {
                session_id: self.id,
                status: self.status,
            })
        }
    }
}

/// Errors from the session state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStateError {
    NotInProgress {
        session_id: SessionId,
        status: SessionStatus,
    },
    ActualBalanceUnset,
}

impl fmt::Display for SessionStateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInProgress { session_id, status } => {
                write!(f, "Session {} is {}, not in progress", session_id, status)
            }
            Self::ActualBalanceUnset => {
                write!(f, "Actual ending balance must be set before completing")
            }
        }
    }
}

impl std::error::Error for SessionStateError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn statement(ending: i64) -> Statement {
        Statement::new(
            AccountId::new(),
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            Money::from_cents(50000),
            Money::from_cents(ending),
        )
    }

    fn session() -> ReconciliationSession {
        ReconciliationSession::start(&statement(46500), Money::from_cents(50000), Utc::now())
    }

    #[test]
    fn test_start_snapshots_balances() {
        let s = session();
        assert!(s.is_in_progress());
        assert_eq!(s.starting_balance.cents(), 50000);
        assert_eq!(s.computed_balance.cents(), 50000);
        assert_eq!(s.ending_balance.cents(), 46500);
        assert!(s.difference.is_none());
        assert!(s.completed_at.is_none());
    }

    #[test]
    fn test_toggle_adds_and_removes() {
        let mut s = session();
        let txn = TransactionId::new();

        assert!(s.toggle(txn, Money::from_cents(-2000)).unwrap());
        assert!(s.is_cleared(txn));
        assert_eq!(s.computed_balance.cents(), 48000);

        assert!(!s.toggle(txn, Money::from_cents(-2000)).unwrap());
        assert!(!s.is_cleared(txn));
        assert_eq!(s.computed_balance.cents(), 50000);
    }

    #[test]
    fn test_running_balance_matches_full_recompute() {
        let mut s = session();
        let txns: Vec<(TransactionId, Money)> = [-2000, -1500, 12000, -333, 1]
            .iter()
            .map(|&c| (TransactionId::new(), Money::from_cents(c)))
            .collect();

        // Toggle pattern touches every transaction, some several times
        let pattern = [0, 1, 2, 1, 3, 4, 0, 2, 2, 1, 4];
        for &i in &pattern {
            let (id, amount) = txns[i];
            s.toggle(id, amount).unwrap();

            let expected: Money = s.starting_balance
                + txns
                    .iter()
                    .filter(|(id, _)| s.is_cleared(*id))
                    .map(|(_, amount)| *amount)
                    .sum::<Money>();
            assert_eq!(s.computed_balance, expected);
        }
    }

    #[test]
    fn test_live_resolution_prefers_actual_balance() {
        let mut s = session();
        s.toggle(TransactionId::new(), Money::from_cents(-3500)).unwrap();
        assert!(s.live_resolution().is_balanced);

        s.set_actual_ending_balance(Money::from_cents(47000)).unwrap();
        assert_eq!(s.live_resolution().difference.cents(), 500);
    }

    #[test]
    fn test_complete_requires_actual_balance() {
        let mut s = session();
        assert_eq!(
            s.complete(Utc::now()),
            Err(SessionStateError::ActualBalanceUnset)
        );
        assert!(s.is_in_progress());
        assert!(s.difference.is_none());
    }

    #[test]
    fn test_complete_records_difference() {
        let mut s = session();
        s.toggle(TransactionId::new(), Money::from_cents(-2000)).unwrap();
        s.toggle(TransactionId::new(), Money::from_cents(-1500)).unwrap();
        s.set_actual_ending_balance(Money::from_cents(47000)).unwrap();

        let resolution = s.complete(Utc::now()).unwrap();

        assert_eq!(resolution.difference.cents(), 500);
        assert!(!resolution.is_balanced);
        assert_eq!(s.status, SessionStatus::Completed);
        assert_eq!(s.difference, Some(Money::from_cents(500)));
        assert!(s.completed_at.is_some());
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut s = session();
        s.abandon(Utc::now()).unwrap();
        assert_eq!(s.status, SessionStatus::Abandoned);
        assert!(s.difference.is_none());

        let before = s.clone();
        assert!(matches!(
            s.toggle(TransactionId::new(), Money::from_cents(100)),
            Err(SessionStateError::NotInProgress { .. })
        ));
        assert!(s.set_actual_ending_balance(Money::zero()).is_err());
        assert!(s.complete(Utc::now()).is_err());
        assert!(s.abandon(Utc::now()).is_err());
        assert_eq!(s, before);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&SessionStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
        assert!(SessionStatus::Completed.is_terminal());
        assert!(!SessionStatus::InProgress.is_terminal());
    }
}
