//! Reconciliation history index
//!
//! An append-only record of finalized sessions kept in history.jsonl. Each
//! line is one completed or abandoned session, written once and never
//! rewritten. Queries are served from an in-memory copy loaded at startup.

use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{AccountId, ReconciliationSession, SessionId};

use super::file_io::{append_json_line, read_json_lines};

/// Append-only index of finalized reconciliation sessions
pub struct HistoryIndex {
    path: PathBuf,
    entries: RwLock<Vec<ReconciliationSession>>,
}

impl HistoryIndex {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Load every recorded session from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let loaded: Vec<ReconciliationSession> = read_json_lines(&self.path)?;

        let mut entries = self
            .entries
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        *entries = loaded;
        tracing::debug!(count = entries.len(), "loaded reconciliation history");
        Ok(())
    }

    /// Record a finalized session
    ///
    /// Fails with `InvalidState` for a session still in progress and with
    /// `Conflict` if the session was already recorded.
    pub fn record(&self, session: &ReconciliationSession) -> Result<(), TallyError> {
        if !session.status.is_terminal() {
            return Err(TallyError::InvalidState(format!(
                "Session {} is still in progress and cannot be recorded",
                session.id
            )));
        }

        let mut entries = self
            .entries
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if entries.iter().any(|s| s.id == session.id) {
            return Err(TallyError::Conflict(format!(
                "Session {} is already recorded in history",
                session.id
            )));
        }

        append_json_line(&self.path, session)?;
        entries.push(session.clone());
        Ok(())
    }

    /// Finalized sessions for one account, most recent first
    pub fn query(&self, account_id: AccountId) -> Result<Vec<ReconciliationSession>, TallyError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut sessions: Vec<_> = entries
            .iter()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        Ok(sessions)
    }

    /// Every finalized session, most recent first
    pub fn all(&self) -> Result<Vec<ReconciliationSession>, TallyError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut sessions = entries.clone();
        sessions.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
        Ok(sessions)
    }

    /// Whether a session has been recorded
    pub fn contains(&self, id: SessionId) -> Result<bool, TallyError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entries.iter().any(|s| s.id == id))
    }

    pub fn count(&self) -> Result<usize, TallyError> {
        let entries = self
            .entries
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(entries.len())
    }
}
