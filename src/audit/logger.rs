//! Append-only audit log writer

use std::path::{Path, PathBuf};

use crate::error::TallyResult;
use crate::storage::file_io::{append_json_line, read_json_lines};

use super::entry::AuditEntry;

/// Writes audit entries to a JSON-lines file, one entry per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    /// Append one entry and flush it
    pub fn log(&self, entry: &AuditEntry) -> TallyResult<()> {
        append_json_line(&self.log_path, entry)
    }

    /// Append several entries, in order
    pub fn log_batch(&self, entries: &[AuditEntry]) -> TallyResult<()> {
        for entry in entries {
            self.log(entry)?;
        }
        Ok(())
    }

    /// Every entry, oldest first
    pub fn read_all(&self) -> TallyResult<Vec<AuditEntry>> {
        read_json_lines(&self.log_path)
    }

    pub fn entry_count(&self) -> TallyResult<usize> {
        Ok(self.read_all()?.len())
    }

    pub fn path(&self) -> &Path {
        &self.log_path
    }
}
