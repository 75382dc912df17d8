//! Account model
//!
//! Represents a financial account that statements are reconciled against.
//! The current balance is never stored; it is derived from the opening
//! balance and the account's transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::Money;

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Chase Checking")
    pub name: String,

    /// ISO currency code (e.g., "USD")
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Balance when the account was opened in Tally
    pub opening_balance: Money,

    /// Whether this account is archived (soft-deleted)
    #[serde(default)]
    pub archived: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last modified
    pub updated_at: DateTime<Utc>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl Account {
    /// Create a new account with a zero opening balance
    pub fn new(name: impl Into<String>, currency: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            currency: currency.into(),
            opening_balance: Money::zero(),
            archived: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a new account with an opening balance
    pub fn with_opening_balance(
        name: impl Into<String>,
        currency: impl Into<String>,
        opening_balance: Money,
    ) -> Self {
        let mut account = Self::new(name, currency);
        account.opening_balance = opening_balance;
        account
    }

    /// Mark this account as archived
    pub fn archive(&mut self) {
        self.archived = true;
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        let code = self.currency.as_str();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(AccountValidationError::InvalidCurrency(self.currency.clone()));
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.currency)
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    InvalidCurrency(String),
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::InvalidCurrency(code) => {
                write!(f, "Invalid currency code '{}' (expected e.g. USD)", code)
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("Checking", "USD");
        assert_eq!(account.name, "Checking");
        assert_eq!(account.currency, "USD");
        assert!(!account.archived);
        assert_eq!(account.opening_balance, Money::zero());
    }

    #[test]
    fn test_archive() {
        let mut account = Account::new("Test", "USD");
        account.archive();
        assert!(account.archived);
    }

    #[test]
    fn test_validation() {
        let mut account = Account::new("Valid Name", "USD");
        assert!(account.validate().is_ok());

        account.name = String::new();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "a".repeat(101);
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::NameTooLong(_))
        ));

        account.name = "Savings".into();
        account.currency = "usd".into();
        assert!(matches!(
            account.validate(),
            Err(AccountValidationError::InvalidCurrency(_))
        ));
    }

    #[test]
    fn test_currency_defaults_when_missing() {
        let account = Account::with_opening_balance("Test", "EUR", Money::from_cents(500));
        let mut json = serde_json::to_value(&account).unwrap();
        json.as_object_mut().unwrap().remove("currency");

        let loaded: Account = serde_json::from_value(json).unwrap();
        assert_eq!(loaded.currency, "USD");
        assert_eq!(loaded.opening_balance.cents(), 500);
    }

    #[test]
    fn test_display() {
        let account = Account::new("My Checking", "USD");
        assert_eq!(format!("{}", account), "My Checking (USD)");
    }
}
