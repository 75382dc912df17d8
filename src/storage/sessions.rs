//! Session repository for JSON storage
//!
//! Holds every reconciliation session, open or finalized, in sessions.json.
//! The repository refuses writes that would break the session invariants:
//! a finalized session is never rewritten, and an account never has two
//! sessions in progress.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{AccountId, ReconciliationSession, SessionId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct SessionData {
    sessions: Vec<ReconciliationSession>,
}

/// Repository for reconciliation sessions
pub struct SessionRepository {
    path: PathBuf,
    data: RwLock<HashMap<SessionId, ReconciliationSession>>,
}

impl SessionRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: SessionData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for session in file_data.sessions {
            data.insert(session.id, session);
        }

        tracing::debug!(count = data.len(), "loaded sessions");
        Ok(())
    }

    pub fn save(&self) -> Result<(), TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut sessions: Vec<_> = data.values().cloned().collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));

        write_json_atomic(&self.path, &SessionData { sessions })
    }

    pub fn get(&self, id: SessionId) -> Result<Option<ReconciliationSession>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    pub fn get_all(&self) -> Result<Vec<ReconciliationSession>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut sessions: Vec<_> = data.values().cloned().collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(sessions)
    }

    pub fn find_by_short_id(
        &self,
        reference: &str,
    ) -> Result<Option<ReconciliationSession>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().find(|s| s.id.matches_short(reference)).cloned())
    }

    /// The session currently in progress for an account, if any
    pub fn find_in_progress(
        &self,
        account_id: AccountId,
    ) -> Result<Option<ReconciliationSession>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data
            .values()
            .find(|s| s.account_id == account_id && s.is_in_progress())
            .cloned())
    }

    /// Insert or update a session
    pub fn upsert(&self, session: ReconciliationSession) -> Result<(), TallyError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(existing) = data.get(&session.id) {
            if existing.status.is_terminal() {
                return Err(TallyError::InvalidState(format!(
                    "Session {} is {} and cannot be modified",
                    existing.id, existing.status
                )));
            }
        }

        if session.is_in_progress() {
            let other_open = data
                .values()
                .find(|s| s.id != session.id && s.account_id == session.account_id && s.is_in_progress());
            if let Some(other) = other_open {
                return Err(TallyError::Conflict(format!(
                    "Account {} already has session {} in progress",
                    session.account_id, other.id
                )));
            }
        }

        data.insert(session.id, session);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Money, Statement};
    use chrono::{NaiveDate, Utc};
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, SessionRepository) {
        let temp_dir = TempDir::new().unwrap();
        let repo = SessionRepository::new(temp_dir.path().join("sessions.json"));
        (temp_dir, repo)
    }

    fn open_session(account_id: AccountId) -> ReconciliationSession {
        let statement = Statement::new(
            account_id,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            Money::zero(),
            Money::from_cents(100),
        );
        ReconciliationSession::start(&statement, Money::zero(), Utc::now())
    }

    #[test]
    fn test_second_open_session_conflicts() {
        let (_temp_dir, repo) = create_test_repo();
        let account = AccountId::new();
        let first = open_session(account);
        repo.upsert(first.clone()).unwrap();

        let err = repo.upsert(open_session(account)).unwrap_err();
        assert!(err.is_conflict());

        // Other accounts are unaffected
        repo.upsert(open_session(AccountId::new())).unwrap();
        assert_eq!(repo.find_in_progress(account).unwrap(), Some(first));
    }

    #[test]
    fn test_terminal_session_is_immutable() {
        let (_temp_dir, repo) = create_test_repo();
        let mut session = open_session(AccountId::new());
        session.abandon(Utc::now()).unwrap();
        repo.upsert(session.clone()).unwrap();

        let mut rewritten = session.clone();
        rewritten.status = crate::models::SessionStatus::InProgress;
        assert!(repo.upsert(rewritten).unwrap_err().is_invalid_state());
        assert_eq!(repo.get(session.id).unwrap(), Some(session));
    }

    #[test]
    fn test_abandoned_frees_account() {
        let (_temp_dir, repo) = create_test_repo();
        let account = AccountId::new();
        let mut first = open_session(account);
        repo.upsert(first.clone()).unwrap();

        first.abandon(Utc::now()).unwrap();
        repo.upsert(first).unwrap();

        assert!(repo.find_in_progress(account).unwrap().is_none());
        repo.upsert(open_session(account)).unwrap();
    }

    #[test]
    fn test_save_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let session = open_session(AccountId::new());
        let short = session.id.to_string();
        repo.upsert(session.clone()).unwrap();
        repo.save().unwrap();

        let repo2 = SessionRepository::new(temp_dir.path().join("sessions.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.find_by_short_id(&short).unwrap(), Some(session));
    }
}
