//! Summary aggregator
//!
//! Derives how recently an account was reconciled and how much is still
//! unreconciled. Summaries are recomputed on every call and never stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{Account, AccountId, ReconciliationSession, SessionId, SessionStatus, Transaction};

/// Days since the last reconciliation still considered current
pub const GOOD_MAX_DAYS: i64 = 30;

/// Days since the last reconciliation before an account becomes critical
pub const WARNING_MAX_DAYS: i64 = 60;

/// How overdue an account is for reconciliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Staleness {
    Good,
    Warning,
    Critical,
}

impl Staleness {
    /// Classify by whole days since the last completed session
    ///
    /// `None` means the account was never reconciled.
    pub fn from_days(days: Option<i64>) -> Self {
        match days {
            Some(d) if d <= GOOD_MAX_DAYS => Self::Good,
            Some(d) if d <= WARNING_MAX_DAYS => Self::Warning,
            _ => Self::Critical,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Good => "good",
            Self::Warning => "warning",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Staleness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reconciliation freshness for one account
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconciliationSummary {
    pub account_id: AccountId,
    /// Latest completion time among the account's completed sessions
    pub last_reconciled: Option<DateTime<Utc>>,
    pub days_since_last_reconciliation: Option<i64>,
    pub unreconciled_transaction_count: usize,
    pub staleness: Staleness,
    /// The session currently in progress for this account, if any
    pub open_session: Option<SessionId>,
}

/// Summarize reconciliation state for one account
///
/// `transactions` and `sessions` may contain other accounts' records; they
/// are filtered here.
pub fn summarize(
    account: &Account,
    transactions: &[Transaction],
    sessions: &[ReconciliationSession],
    now: DateTime<Utc>,
) -> ReconciliationSummary {
    let own_sessions = sessions.iter().filter(|s| s.account_id == account.id);

    let mut last_reconciled: Option<DateTime<Utc>> = None;
    let mut open_session = None;
    for session in own_sessions {
        match session.status {
            SessionStatus::Completed => {
                if let Some(done) = session.completed_at {
                    last_reconciled = Some(last_reconciled.map_or(done, |l| l.max(done)));
                }
            }
            SessionStatus::InProgress => open_session = Some(session.id),
            SessionStatus::Abandoned => {}
        }
    }

    // A completion stamped slightly in the future (clock skew) counts as today
    let days_since_last_reconciliation =
        last_reconciled.map(|last| (now - last).num_days().max(0));

    let unreconciled_transaction_count = transactions
        .iter()
        .filter(|t| t.account_id == account.id && !t.reconciled)
        .count();

    ReconciliationSummary {
        account_id: account.id,
        last_reconciled,
        days_since_last_reconciliation,
        unreconciled_transaction_count,
        staleness: Staleness::from_days(days_since_last_reconciliation),
        open_session,
    }
}
