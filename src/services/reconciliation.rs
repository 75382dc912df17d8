//! Reconciliation service
//!
//! Drives the session state machine against storage. Every mutation goes
//! through [`ReconciliationService::execute`], which holds the storage write
//! gate for the whole command, so an account can never gain a second open
//! session and completion flags its transactions as one step.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::audit::{AuditEntry, EntityType};
use crate::error::{TallyError, TallyResult};
use crate::models::{
    Account, AccountId, Money, ReconciliationSession, SessionId, StatementId, Transaction,
    TransactionId, TransactionKind,
};
use crate::reconcile::{resolve, summarize, ReconciliationSummary, Resolution};
use crate::storage::Storage;

use super::account::AccountService;

/// Payee used for transactions posted to force a balance match
pub const ADJUSTMENT_PAYEE: &str = "Reconciliation Adjustment";

/// A mutating reconciliation command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileCommand {
    Start {
        account_id: AccountId,
        statement_id: StatementId,
    },
    Toggle {
        session_id: SessionId,
        transaction_id: TransactionId,
    },
    SetActualBalance {
        session_id: SessionId,
        amount: Money,
    },
    Complete {
        session_id: SessionId,
    },
    /// Post an adjustment for any remaining difference, then complete
    CompleteWithAdjustment {
        session_id: SessionId,
        date: NaiveDate,
    },
    Abandon {
        session_id: SessionId,
    },
}

/// Outcome of a successful command
#[derive(Debug, Clone)]
pub enum ReconcileEvent {
    Started(ReconciliationSession),
    Toggled {
        session: ReconciliationSession,
        transaction: Transaction,
        cleared: bool,
    },
    ActualBalanceSet(ReconciliationSession),
    Completed {
        session: ReconciliationSession,
        resolution: Resolution,
        reconciled: Vec<Transaction>,
        adjustment: Option<Transaction>,
    },
    Abandoned(ReconciliationSession),
}

impl ReconcileEvent {
    /// The session as it stands after the command
    pub fn session(&self) -> &ReconciliationSession {
        match self {
            Self::Started(session)
            | Self::ActualBalanceSet(session)
            | Self::Abandoned(session)
            | Self::Toggled { session, .. }
            | Self::Completed { session, .. } => session,
        }
    }

    pub fn into_session(self) -> ReconciliationSession {
        match self {
            Self::Started(session)
            | Self::ActualBalanceSet(session)
            | Self::Abandoned(session)
            | Self::Toggled { session, .. }
            | Self::Completed { session, .. } => session,
        }
    }
}

/// Service for reconciliation sessions
pub struct ReconciliationService<'a> {
    storage: &'a Storage,
}

impl<'a> ReconciliationService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Run one mutating command under the storage write gate
    pub fn execute(&self, command: ReconcileCommand) -> TallyResult<ReconcileEvent> {
        let _gate = self.storage.lock_writes()?;
        let now = Utc::now();

        let result = match command {
            ReconcileCommand::Start {
                account_id,
                statement_id,
            } => self.start_locked(account_id, statement_id, now),
            ReconcileCommand::Toggle {
                session_id,
                transaction_id,
            } => self.toggle_locked(session_id, transaction_id),
            ReconcileCommand::SetActualBalance { session_id, amount } => {
                self.set_actual_locked(session_id, amount)
            }
            ReconcileCommand::Complete { session_id } => self
                .load_for_completion(session_id)
                .and_then(|session| self.complete_locked(session, None, now)),
            ReconcileCommand::CompleteWithAdjustment { session_id, date } => {
                self.complete_with_adjustment_locked(session_id, date, now)
            }
            ReconcileCommand::Abandon { session_id } => self.abandon_locked(session_id, now),
        };

        if let Err(e) = &result {
            tracing::warn!(error = %e, "reconciliation command rejected");
        }
        result
    }

    /// Open a session for an account against one of its statements
    pub fn start_session(
        &self,
        account_id: AccountId,
        statement_id: StatementId,
    ) -> TallyResult<ReconciliationSession> {
        self.execute(ReconcileCommand::Start {
            account_id,
            statement_id,
        })
        .map(ReconcileEvent::into_session)
    }

    /// Flip a transaction in or out of the session's cleared set
    pub fn toggle_cleared(
        &self,
        session_id: SessionId,
        transaction_id: TransactionId,
    ) -> TallyResult<ReconciliationSession> {
        self.execute(ReconcileCommand::Toggle {
            session_id,
            transaction_id,
        })
        .map(ReconcileEvent::into_session)
    }

    pub fn set_actual_ending_balance(
        &self,
        session_id: SessionId,
        amount: Money,
    ) -> TallyResult<ReconciliationSession> {
        self.execute(ReconcileCommand::SetActualBalance { session_id, amount })
            .map(ReconcileEvent::into_session)
    }

    pub fn complete(&self, session_id: SessionId) -> TallyResult<ReconciliationSession> {
        self.execute(ReconcileCommand::Complete { session_id })
            .map(ReconcileEvent::into_session)
    }

    /// Complete, first posting an adjustment dated `date` if unbalanced
    pub fn complete_with_adjustment(
        &self,
        session_id: SessionId,
        date: NaiveDate,
    ) -> TallyResult<ReconcileEvent> {
        self.execute(ReconcileCommand::CompleteWithAdjustment { session_id, date })
    }

    pub fn abandon(&self, session_id: SessionId) -> TallyResult<ReconciliationSession> {
        self.execute(ReconcileCommand::Abandon { session_id })
            .map(ReconcileEvent::into_session)
    }

    pub fn get_session(&self, session_id: SessionId) -> TallyResult<ReconciliationSession> {
        self.load_session(session_id)
    }

    /// The session currently open for an account, if any
    pub fn current_session(
        &self,
        account_id: AccountId,
    ) -> TallyResult<Option<ReconciliationSession>> {
        self.storage.sessions.find_in_progress(account_id)
    }

    /// Transactions a session can still clear, oldest first
    pub fn candidates(&self, session: &ReconciliationSession) -> TallyResult<Vec<Transaction>> {
        let mut transactions: Vec<Transaction> = self
            .storage
            .transactions
            .get_by_account(session.account_id)?
            .into_iter()
            .filter(|t| !t.reconciled)
            .collect();
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then(a.created_at.cmp(&b.created_at)));
        Ok(transactions)
    }

    /// Finalized sessions for an account, most recent first
    pub fn history(&self, account_id: AccountId) -> TallyResult<Vec<ReconciliationSession>> {
        self.storage.history.query(account_id)
    }

    /// Finalized sessions for every account, most recent first
    pub fn history_all(&self) -> TallyResult<Vec<ReconciliationSession>> {
        self.storage.history.all()
    }

    /// Reconciliation status of one account as of `now`
    pub fn summary(&self, account: &Account, now: DateTime<Utc>) -> TallyResult<ReconciliationSummary> {
        let transactions = self.storage.transactions.get_by_account(account.id)?;
        let mut sessions = self.storage.history.query(account.id)?;
        if let Some(open) = self.storage.sessions.find_in_progress(account.id)? {
            sessions.push(open);
        }
        Ok(summarize(account, &transactions, &sessions, now))
    }

    /// Reconciliation status of every active account as of `now`
    pub fn summaries(
        &self,
        now: DateTime<Utc>,
    ) -> TallyResult<Vec<(Account, ReconciliationSummary)>> {
        self.storage
            .accounts
            .get_active()?
            .into_iter()
            .map(|account| {
                let summary = self.summary(&account, now)?;
                Ok((account, summary))
            })
            .collect()
    }

    fn load_session(&self, session_id: SessionId) -> TallyResult<ReconciliationSession> {
        self.storage
            .sessions
            .get(session_id)?
            .ok_or_else(|| TallyError::session_not_found(session_id.to_string()))
    }

    fn start_locked(
        &self,
        account_id: AccountId,
        statement_id: StatementId,
        now: DateTime<Utc>,
    ) -> TallyResult<ReconcileEvent> {
        let account = self
            .storage
            .accounts
            .get(account_id)?
            .ok_or_else(|| TallyError::account_not_found(account_id.to_string()))?;

        let statement = self
            .storage
            .statements
            .get(statement_id)?
            .filter(|s| s.account_id == account_id)
            .ok_or_else(|| TallyError::statement_not_found(statement_id.to_string()))?;

        if account.archived {
            return Err(TallyError::InvalidState(format!(
                "Account '{}' is archived",
                account.name
            )));
        }

        if let Some(open) = self.storage.sessions.find_in_progress(account_id)? {
            return Err(TallyError::Conflict(format!(
                "Account '{}' already has reconciliation {} in progress",
                account.name, open.id
            )));
        }

        let starting_balance =
            AccountService::new(self.storage).calculate_reconciled_balance(&account)?;
        let session = ReconciliationSession::start(&statement, starting_balance, now);

        self.storage.sessions.upsert(session.clone())?;
        self.storage.sessions.save()?;
        self.storage.log_create(
            EntityType::Session,
            session.id.to_string(),
            Some(account.name.clone()),
            &session,
        )?;

        tracing::info!(
            session = %session.id,
            account = %account.id,
            statement = %statement.id,
            starting_balance = %session.starting_balance,
            "started reconciliation"
        );
        Ok(ReconcileEvent::Started(session))
    }

    fn toggle_locked(
        &self,
        session_id: SessionId,
        transaction_id: TransactionId,
    ) -> TallyResult<ReconcileEvent> {
        let mut session = self.load_session(session_id)?;
        if !session.is_in_progress() {
            return Err(TallyError::InvalidState(format!(
                "Session {} is {}",
                session.id, session.status
            )));
        }

        // Another account's transaction, or one locked by an earlier
        // completed session, is not visible to this session.
        let before_txn = self
            .storage
            .transactions
            .get(transaction_id)?
            .filter(|t| t.account_id == session.account_id && !t.reconciled)
            .ok_or_else(|| TallyError::transaction_not_found(transaction_id.to_string()))?;

        let before_session = session.clone();
        let cleared = session.toggle(before_txn.id, before_txn.amount)?;
        let transaction = self.storage.transactions.set_cleared(before_txn.id, cleared)?;

        self.storage.sessions.upsert(session.clone())?;
        self.storage.transactions.save()?;
        self.storage.sessions.save()?;

        self.storage.log_update(
            EntityType::Transaction,
            transaction.id.to_string(),
            Some(format!("{} {}", transaction.date, transaction.payee_name)),
            &before_txn,
            &transaction,
        )?;
        self.storage.log_update(
            EntityType::Session,
            session.id.to_string(),
            None,
            &before_session,
            &session,
        )?;

        tracing::debug!(
            session = %session.id,
            transaction = %transaction.id,
            cleared,
            computed_balance = %session.computed_balance,
            "toggled transaction"
        );
        Ok(ReconcileEvent::Toggled {
            session,
            transaction,
            cleared,
        })
    }

    fn set_actual_locked(&self, session_id: SessionId, amount: Money) -> TallyResult<ReconcileEvent> {
        let mut session = self.load_session(session_id)?;
        let before = session.clone();
        session.set_actual_ending_balance(amount)?;

        self.storage.sessions.upsert(session.clone())?;
        self.storage.sessions.save()?;
        self.storage.log_update(
            EntityType::Session,
            session.id.to_string(),
            None,
            &before,
            &session,
        )?;

        tracing::debug!(session = %session.id, actual = %amount, "set actual ending balance");
        Ok(ReconcileEvent::ActualBalanceSet(session))
    }

    fn complete_with_adjustment_locked(
        &self,
        session_id: SessionId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> TallyResult<ReconcileEvent> {
        let mut session = self.load_for_completion(session_id)?;
        if !session.is_in_progress() {
            return Err(TallyError::InvalidState(format!(
                "Session {} is {}",
                session.id, session.status
            )));
        }
        let actual = session.actual_ending_balance.ok_or_else(|| {
            TallyError::Precondition("Actual ending balance must be set before completing".into())
        })?;

        let adjustment = match resolve(session.computed_balance, actual).adjustment() {
            None => None,
            Some(amount) => {
                let txn = build_adjustment(&session, date, amount)?;
                session.toggle(txn.id, txn.amount)?;
                Some(txn)
            }
        };

        self.complete_locked(session, adjustment, now)
    }

    /// Load a session about to be completed
    ///
    /// A transaction already reconciled by this session but missing from
    /// its cleared set was written by a completion that stopped before the
    /// session was saved. It is cleared again so the retry balances.
    fn load_for_completion(&self, session_id: SessionId) -> TallyResult<ReconciliationSession> {
        let mut session = self.load_session(session_id)?;
        if !session.is_in_progress() {
            return Ok(session);
        }

        let orphans: Vec<Transaction> = self
            .storage
            .transactions
            .get_by_account(session.account_id)?
            .into_iter()
            .filter(|t| t.reconciled_by == Some(session.id) && !session.is_cleared(t.id))
            .collect();
        for txn in orphans {
            tracing::warn!(session = %session.id, transaction = %txn.id, "recovering transaction from interrupted completion");
            session.toggle(txn.id, txn.amount)?;
        }
        Ok(session)
    }

    /// Finalize a session as completed
    ///
    /// Writes go in a fixed order: transactions (the adjustment, if any,
    /// and every cleared one), then the session, then its history record,
    /// then one audit batch. Until the transactions are saved a failure is
    /// undone in memory and the session stays in progress. Past that point
    /// a failure leaves transactions owned by a session that is still open;
    /// completing it again or abandoning it both succeed, and a missing
    /// history record is restored on the next load.
    fn complete_locked(
        &self,
        mut session: ReconciliationSession,
        adjustment: Option<Transaction>,
        now: DateTime<Utc>,
    ) -> TallyResult<ReconcileEvent> {
        let before_session = self.storage.sessions.get(session.id)?;
        let resolution = session.complete(now)?;

        let ids: Vec<TransactionId> = session.cleared.iter().copied().collect();
        let before_txns = ids
            .iter()
            .filter_map(|id| self.storage.transactions.get(*id).transpose())
            .map(|txn| txn.map(|t| (t.id, t)))
            .collect::<TallyResult<HashMap<TransactionId, Transaction>>>()?;

        if let Some(txn) = &adjustment {
            self.storage.transactions.upsert(txn.clone())?;
        }
        let reconciled = match self.storage.transactions.mark_reconciled(&ids, session.id) {
            Ok(reconciled) => reconciled,
            Err(e) => {
                self.rollback(&before_txns, adjustment.as_ref())?;
                return Err(e);
            }
        };
        if let Err(e) = self.storage.transactions.save() {
            self.rollback(&before_txns, adjustment.as_ref())?;
            return Err(e);
        }

        self.storage.sessions.upsert(session.clone())?;
        self.storage.sessions.save()?;
        self.storage.history.record(&session)?;

        let mut entries = Vec::with_capacity(reconciled.len() + 1);
        for after in &reconciled {
            let name = Some(format!("{} {}", after.date, after.payee_name));
            match before_txns.get(&after.id) {
                Some(before) => entries.push(AuditEntry::update(
                    EntityType::Transaction,
                    after.id.to_string(),
                    name,
                    before,
                    after,
                )),
                None => entries.push(AuditEntry::create(
                    EntityType::Transaction,
                    after.id.to_string(),
                    Some(ADJUSTMENT_PAYEE.to_string()),
                    after,
                )),
            }
        }
        if let Some(before) = &before_session {
            entries.push(AuditEntry::update(
                EntityType::Session,
                session.id.to_string(),
                None,
                before,
                &session,
            ));
        }
        self.storage.audit().log_batch(&entries)?;

        if let Some(txn) = &adjustment {
            tracing::info!(session = %session.id, amount = %txn.amount, "posted reconciliation adjustment");
        }
        tracing::info!(
            session = %session.id,
            account = %session.account_id,
            reconciled = reconciled.len(),
            difference = %resolution.difference,
            balanced = resolution.is_balanced,
            "completed reconciliation"
        );

        let adjustment = adjustment.and_then(|txn| reconciled.iter().find(|t| t.id == txn.id).cloned());
        Ok(ReconcileEvent::Completed {
            session,
            resolution,
            reconciled,
            adjustment,
        })
    }

    /// Put transactions back the way they were before a failed completion
    fn rollback(
        &self,
        before_txns: &HashMap<TransactionId, Transaction>,
        adjustment: Option<&Transaction>,
    ) -> TallyResult<()> {
        for txn in before_txns.values() {
            self.storage.transactions.upsert(txn.clone())?;
        }
        if let Some(txn) = adjustment {
            self.storage.transactions.remove(txn.id)?;
        }
        Ok(())
    }

    /// Finalize a session as abandoned
    ///
    /// Transactions an interrupted completion left owned by this session
    /// are released first. They stay cleared.
    fn abandon_locked(&self, session_id: SessionId, now: DateTime<Utc>) -> TallyResult<ReconcileEvent> {
        let mut session = self.load_session(session_id)?;
        let before = session.clone();
        session.abandon(now)?;

        let before_txns: Vec<Transaction> = self
            .storage
            .transactions
            .get_by_account(session.account_id)?
            .into_iter()
            .filter(|t| t.reconciled_by == Some(session.id))
            .collect();
        let released = self.storage.transactions.release(session.id)?;
        if !released.is_empty() {
            tracing::warn!(session = %session.id, count = released.len(), "released transactions from interrupted completion");
            self.storage.transactions.save()?;
        }

        self.storage.sessions.upsert(session.clone())?;
        self.storage.sessions.save()?;
        self.storage.history.record(&session)?;

        let mut entries: Vec<AuditEntry> = before_txns
            .iter()
            .filter_map(|before| {
                let after = released.iter().find(|t| t.id == before.id)?;
                Some(AuditEntry::update(
                    EntityType::Transaction,
                    after.id.to_string(),
                    Some(format!("{} {}", after.date, after.payee_name)),
                    before,
                    after,
                ))
            })
            .collect();
        entries.push(AuditEntry::update(
            EntityType::Session,
            session.id.to_string(),
            None,
            &before,
            &session,
        ));
        self.storage.audit().log_batch(&entries)?;

        tracing::info!(
            session = %session.id,
            account = %session.account_id,
            cleared = session.cleared.len(),
            "abandoned reconciliation"
        );
        Ok(ReconcileEvent::Abandoned(session))
    }
}

/// A cleared transaction that closes the gap to the statement
///
/// Nothing is stored here; completion writes it with the rest.
fn build_adjustment(
    session: &ReconciliationSession,
    date: NaiveDate,
    amount: Money,
) -> TallyResult<Transaction> {
    let mut txn = Transaction::with_details(
        session.account_id,
        date,
        amount,
        TransactionKind::from_amount(amount),
        ADJUSTMENT_PAYEE,
        format!("Posted by reconciliation {} to match statement balance", session.id),
    );
    txn.set_cleared(true);
    txn.validate()
        .map_err(|e| TallyError::Validation(e.to_string()))?;
    Ok(txn)
}
