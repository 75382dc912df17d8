//! Statement model
//!
//! An external bank statement: the ground truth a reconciliation session is
//! checked against. Statements are immutable once stored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, StatementId};
use super::money::Money;

/// A bank statement for one account and period
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    pub id: StatementId,

    pub account_id: AccountId,

    /// First day covered by the statement
    pub period_start: NaiveDate,

    /// Last day covered by the statement
    pub period_end: NaiveDate,

    /// Balance printed at the start of the period
    pub starting_balance: Money,

    /// Balance printed at the end of the period
    pub ending_balance: Money,

    /// When the statement entered Tally
    pub imported_at: DateTime<Utc>,
}

impl Statement {
    pub fn new(
        account_id: AccountId,
        period_start: NaiveDate,
        period_end: NaiveDate,
        starting_balance: Money,
        ending_balance: Money,
    ) -> Self {
        Self {
            id: StatementId::new(),
            account_id,
            period_start,
            period_end,
            starting_balance,
            ending_balance,
            imported_at: Utc::now(),
        }
    }

    /// Net movement the statement reports over its period
    pub fn net_change(&self) -> Money {
        self.ending_balance - self.starting_balance
    }

    /// Validate the statement
    pub fn validate(&self) -> Result<(), StatementValidationError> {
        if self.period_start > self.period_end {
            return Err(StatementValidationError::InvertedPeriod {
                start: self.period_start,
                end: self.period_end,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {} ({} -> {})",
            self.period_start, self.period_end, self.starting_balance, self.ending_balance
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementValidationError {
    InvertedPeriod { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for StatementValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvertedPeriod { start, end } => {
                write!(f, "Statement period starts ({}) after it ends ({})", start, end)
            }
        }
    }
}

impl std::error::Error for StatementValidationError {}
