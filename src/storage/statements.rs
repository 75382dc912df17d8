//! Statement repository for JSON storage
//!
//! Statements are append-only: there is an insert but no update or delete.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::TallyError;
use crate::models::{AccountId, Statement, StatementId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct StatementData {
    statements: Vec<Statement>,
}

/// Repository for bank statements
pub struct StatementRepository {
    path: PathBuf,
    data: RwLock<HashMap<StatementId, Statement>>,
}

impl StatementRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load statements from disk
    pub fn load(&self) -> Result<(), TallyError> {
        let file_data: StatementData = read_json(&self.path)?;

        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        data.clear();
        for statement in file_data.statements {
            data.insert(statement.id, statement);
        }

        tracing::debug!(count = data.len(), "loaded statements");
        Ok(())
    }

    /// Save statements to disk
    pub fn save(&self) -> Result<(), TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut statements: Vec<_> = data.values().cloned().collect();
        statements.sort_by(|a, b| {
            a.period_start
                .cmp(&b.period_start)
                .then(a.imported_at.cmp(&b.imported_at))
        });

        write_json_atomic(&self.path, &StatementData { statements })
    }

    pub fn get(&self, id: StatementId) -> Result<Option<Statement>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.get(&id).cloned())
    }

    /// Statements for an account, ordered by period start
    pub fn get_by_account(&self, account_id: AccountId) -> Result<Vec<Statement>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        let mut statements: Vec<_> = data
            .values()
            .filter(|s| s.account_id == account_id)
            .cloned()
            .collect();
        statements.sort_by(|a, b| {
            a.period_start
                .cmp(&b.period_start)
                .then(a.imported_at.cmp(&b.imported_at))
        });
        Ok(statements)
    }

    pub fn find_by_short_id(&self, reference: &str) -> Result<Option<Statement>, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.values().find(|s| s.id.matches_short(reference)).cloned())
    }

    /// Store new statements
    ///
    /// Rejects the whole batch if any id is already present.
    pub fn insert_all(&self, statements: Vec<Statement>) -> Result<(), TallyError> {
        let mut data = self
            .data
            .write()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire write lock: {}", e)))?;

        if let Some(existing) = statements.iter().find(|s| data.contains_key(&s.id)) {
            return Err(TallyError::Duplicate {
                entity_type: "Statement",
                identifier: existing.id.to_string(),
            });
        }

        for statement in statements {
            data.insert(statement.id, statement);
        }
        Ok(())
    }

    pub fn insert(&self, statement: Statement) -> Result<(), TallyError> {
        self.insert_all(vec![statement])
    }

    pub fn count(&self) -> Result<usize, TallyError> {
        let data = self
            .data
            .read()
            .map_err(|e| TallyError::Storage(format!("Failed to acquire read lock: {}", e)))?;

        Ok(data.len())
    }
}
