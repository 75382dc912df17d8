//! Audit logging
//!
//! Every create and update on accounts, transactions, statements and
//! sessions is appended to `audit.log` as one JSON line with the before and
//! after states and a short field diff. The log is never rewritten.

mod diff;
mod entry;
mod logger;

pub use diff::generate_diff;
pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
