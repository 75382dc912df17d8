//! Account service
//!
//! Account creation, lookup, archiving and derived balances.

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{Account, AccountId, Money};
use crate::storage::Storage;

/// Service for account management
pub struct AccountService<'a> {
    storage: &'a Storage,
}

/// An account with its derived balances
#[derive(Debug, Clone)]
pub struct AccountSummary {
    pub account: Account,
    /// Opening balance plus every transaction
    pub balance: Money,
    /// Opening balance plus cleared or reconciled transactions
    pub cleared_balance: Money,
    /// Opening balance plus reconciled transactions only
    pub reconciled_balance: Money,
    /// Transactions not yet cleared
    pub uncleared_count: usize,
}

impl<'a> AccountService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Create a new account
    pub fn create(
        &self,
        name: &str,
        currency: &str,
        opening_balance: Money,
    ) -> TallyResult<Account> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TallyError::Validation("Account name cannot be empty".into()));
        }

        if self.storage.accounts.name_exists(name, None)? {
            return Err(TallyError::Duplicate {
                entity_type: "Account",
                identifier: name.to_string(),
            });
        }

        let account =
            Account::with_opening_balance(name, currency.trim().to_uppercase(), opening_balance);
        account
            .validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_create(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &account,
        )?;

        tracing::info!(account = %account.id, name = %account.name, "created account");
        Ok(account)
    }

    pub fn get(&self, id: AccountId) -> TallyResult<Option<Account>> {
        self.storage.accounts.get(id)
    }

    /// Find an account by name or ID
    ///
    /// Names match case-insensitively; IDs may be given in full or as a
    /// short prefix such as `acc-1a2b3c4d`.
    pub fn find(&self, identifier: &str) -> TallyResult<Option<Account>> {
        if let Some(account) = self.storage.accounts.get_by_name(identifier)? {
            return Ok(Some(account));
        }

        if let Ok(id) = identifier.parse::<AccountId>() {
            return self.storage.accounts.get(id);
        }

        self.storage.accounts.find_by_short_id(identifier)
    }

    /// Like `find`, but a missing account is an error
    pub fn require(&self, identifier: &str) -> TallyResult<Account> {
        self.find(identifier)?
            .ok_or_else(|| TallyError::account_not_found(identifier))
    }

    pub fn list(&self, include_archived: bool) -> TallyResult<Vec<Account>> {
        if include_archived {
            self.storage.accounts.get_all()
        } else {
            self.storage.accounts.get_active()
        }
    }

    pub fn list_with_balances(&self, include_archived: bool) -> TallyResult<Vec<AccountSummary>> {
        self.list(include_archived)?
            .iter()
            .map(|account| self.get_summary(account))
            .collect()
    }

    /// Derived balances for one account
    pub fn get_summary(&self, account: &Account) -> TallyResult<AccountSummary> {
        let transactions = self.storage.transactions.get_by_account(account.id)?;

        let mut summary = AccountSummary {
            account: account.clone(),
            balance: account.opening_balance,
            cleared_balance: account.opening_balance,
            reconciled_balance: account.opening_balance,
            uncleared_count: 0,
        };

        for txn in &transactions {
            summary.balance += txn.amount;
            if txn.reconciled {
                summary.reconciled_balance += txn.amount;
            }
            if txn.cleared || txn.reconciled {
                summary.cleared_balance += txn.amount;
            } else {
                summary.uncleared_count += 1;
            }
        }

        Ok(summary)
    }

    /// Balance as of the last completed reconciliation
    ///
    /// Opening balance plus every reconciled transaction. This is the
    /// snapshot a new reconciliation session starts from.
    pub fn calculate_reconciled_balance(&self, account: &Account) -> TallyResult<Money> {
        Ok(self.get_summary(account)?.reconciled_balance)
    }

    /// Archive an account
    ///
    /// An account with a reconciliation in progress must finish or abandon
    /// it first.
    pub fn archive(&self, id: AccountId) -> TallyResult<Account> {
        let mut account = self
            .storage
            .accounts
            .get(id)?
            .ok_or_else(|| TallyError::account_not_found(id.to_string()))?;

        if account.archived {
            return Err(TallyError::Validation("Account is already archived".into()));
        }

        if let Some(open) = self.storage.sessions.find_in_progress(id)? {
            return Err(TallyError::Conflict(format!(
                "Account '{}' has reconciliation {} in progress",
                account.name, open.id
            )));
        }

        let before = account.clone();
        account.archive();

        self.storage.accounts.upsert(account.clone())?;
        self.storage.accounts.save()?;

        self.storage.log_update(
            EntityType::Account,
            account.id.to_string(),
            Some(account.name.clone()),
            &before,
            &account,
        )?;

        tracing::info!(account = %account.id, "archived account");
        Ok(account)
    }
}
