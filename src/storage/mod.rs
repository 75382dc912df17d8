//! Storage layer for Tally
//!
//! JSON file storage with atomic writes, an append-only history of finalized
//! reconciliation sessions, and the audit log.

pub mod accounts;
pub mod file_io;
pub mod history;
pub mod sessions;
pub mod statements;
pub mod transactions;

pub use accounts::AccountRepository;
pub use history::HistoryIndex;
pub use sessions::SessionRepository;
pub use statements::StatementRepository;
pub use transactions::TransactionRepository;

use std::sync::{Mutex, MutexGuard};

use serde::Serialize;

use crate::audit::{AuditEntry, AuditLogger, EntityType};
use crate::config::paths::TallyPaths;
use crate::error::TallyError;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    pub accounts: AccountRepository,
    pub transactions: TransactionRepository,
    pub statements: StatementRepository,
    pub sessions: SessionRepository,
    pub history: HistoryIndex,
    audit: AuditLogger,
    /// Serializes every mutating reconciliation command
    write_gate: Mutex<()>,
}

impl Storage {
    /// Create a new Storage instance
    pub fn new(paths: TallyPaths) -> Result<Self, TallyError> {
        paths.ensure_directories()?;

        Ok(Self {
            accounts: AccountRepository::new(paths.accounts_file()),
            transactions: TransactionRepository::new(paths.transactions_file()),
            statements: StatementRepository::new(paths.statements_file()),
            sessions: SessionRepository::new(paths.sessions_file()),
            history: HistoryIndex::new(paths.history_file()),
            audit: AuditLogger::new(paths.audit_log()),
            write_gate: Mutex::new(()),
        })
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk
    ///
    /// A finalized session missing from the history index (the process
    /// stopped between saving the session and appending its record) is
    /// recorded here.
    pub fn load_all(&self) -> Result<(), TallyError> {
        self.accounts.load()?;
        self.transactions.load()?;
        self.statements.load()?;
        self.sessions.load()?;
        self.history.load()?;

        for session in self.sessions.get_all()? {
            if session.status.is_terminal() && !self.history.contains(session.id)? {
                tracing::warn!(session = %session.id, "restoring missing history record");
                self.history.record(&session)?;
            }
        }
        Ok(())
    }

    /// Take the single-writer gate
    pub fn lock_writes(&self) -> Result<MutexGuard<'_, ()>, TallyError> {
        self.write_gate
            .lock()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write gate: {}", e)))
    }

    /// Audit a newly created entity
    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), TallyError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    /// Audit a change to an existing entity
    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Result<(), TallyError> {
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
        ))
    }
}
