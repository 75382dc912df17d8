//! Pure reconciliation logic
//!
//! Nothing in this module touches storage. The resolver compares balances,
//! the summary aggregator classifies how overdue an account is. Both are
//! called by `services::reconciliation` and are safe to call repeatedly.

pub mod resolver;
pub mod summary;

pub use resolver::{resolve, Resolution};
pub use summary::{summarize, ReconciliationSummary, Staleness};
