//! Transaction service
//!
//! Recording and listing transactions. Cleared and reconciled flags are not
//! set here; they change only through a reconciliation session.

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{TallyError, TallyResult};
use crate::models::{AccountId, Money, Transaction, TransactionId, TransactionKind};
use crate::storage::Storage;

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

/// Options for filtering transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub account_id: Option<AccountId>,
    /// Only transactions no completed session has reconciled
    pub unreconciled_only: bool,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn account(mut self, account_id: AccountId) -> Self {
        self.account_id = Some(account_id);
        self
    }

    pub fn unreconciled(mut self) -> Self {
        self.unreconciled_only = true;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Input for creating a new transaction
#[derive(Debug, Clone)]
pub struct CreateTransactionInput {
    pub account_id: AccountId,
    pub date: NaiveDate,
    pub amount: Money,
    /// Inferred from the sign of the amount when absent
    pub kind: Option<TransactionKind>,
    pub payee_name: Option<String>,
    pub memo: Option<String>,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Record a new transaction
    pub fn create(&self, input: CreateTransactionInput) -> TallyResult<Transaction> {
        let account = self
            .storage
            .accounts
            .get(input.account_id)?
            .ok_or_else(|| TallyError::account_not_found(input.account_id.to_string()))?;

        if account.archived {
            return Err(TallyError::Validation(
                "Cannot add transactions to an archived account".into(),
            ));
        }

        let kind = input
            .kind
            .unwrap_or_else(|| TransactionKind::from_amount(input.amount));
        let txn = Transaction::with_details(
            input.account_id,
            input.date,
            input.amount,
            kind,
            input.payee_name.unwrap_or_default().trim(),
            input.memo.unwrap_or_default(),
        );

        txn.validate()
            .map_err(|e| TallyError::Validation(e.to_string()))?;

        self.storage.transactions.upsert(txn.clone())?;
        self.storage.transactions.save()?;

        self.storage.log_create(
            EntityType::Transaction,
            txn.id.to_string(),
            Some(format!("{} {}", txn.date, txn.payee_name)),
            &txn,
        )?;

        tracing::debug!(transaction = %txn.id, account = %account.id, amount = %txn.amount, "recorded transaction");
        Ok(txn)
    }

    pub fn get(&self, id: TransactionId) -> TallyResult<Option<Transaction>> {
        self.storage.transactions.get(id)
    }

    /// Find a transaction by full or short ID
    pub fn find(&self, reference: &str) -> TallyResult<Option<Transaction>> {
        if let Ok(id) = reference.parse::<TransactionId>() {
            return self.storage.transactions.get(id);
        }
        self.storage.transactions.find_by_short_id(reference)
    }

    /// List transactions matching a filter, newest first
    pub fn list(&self, filter: TransactionFilter) -> TallyResult<Vec<Transaction>> {
        let transactions = match filter.account_id {
            Some(account_id) => self.storage.transactions.get_by_account(account_id)?,
            None => self.storage.transactions.get_all()?,
        };

        let iter = transactions
            .into_iter()
            .filter(|t| !filter.unreconciled_only || !t.reconciled);

        Ok(match filter.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        })
    }
}
